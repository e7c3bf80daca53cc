use std::net::SocketAddr;

use once_cell::sync::Lazy;
use tracing_subscriber::EnvFilter;

use design_hub_api::config::AppConfig;
use design_hub_api::handlers::health::START_TIME;
use design_hub_api::{database, routes, state::AppState};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Fails closed: no signing secret or database URL, no server.
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("Starting Design Hub API in {:?} mode", config.environment);

    Lazy::force(&START_TIME);

    let pool = match database::connect(&config.database).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
        tracing::error!("Migration failed: {}", e);
        std::process::exit(1);
    }

    let app = routes::app(AppState::new(pool, config));

    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(8080);
    let bind_addr = format!("0.0.0.0:{}", port);

    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", bind_addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("Design Hub API listening on http://{}", bind_addr);

    // The rate limiter keys on peer address, so serve with connect info.
    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
