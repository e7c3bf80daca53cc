use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use once_cell::sync::Lazy;
use serde_json::json;
use std::time::Instant;

use crate::state::AppState;

/// Process start marker; forced in main so uptime covers the whole run.
pub static START_TIME: Lazy<Instant> = Lazy::new(Instant::now);

/// GET /health - liveness plus a database round trip.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let uptime_seconds = START_TIME.elapsed().as_secs();

    match crate::database::health_check(&state.pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "timestamp": now,
                "uptime_seconds": uptime_seconds,
                "database": "connected"
            })),
        ),
        Err(e) => {
            tracing::error!("Database health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "timestamp": now,
                    "uptime_seconds": uptime_seconds,
                    "database": "disconnected"
                })),
            )
        }
    }
}

/// GET / - service banner.
pub async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "name": "Design Hub API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/health (public)",
            "auth": "/api/auth/* (register, login, logout, refresh, verify, password reset)",
            "users": "/api/users/* (protected; admin subset)",
            "designs": "/api/designs, /api/tags, /api/blocks, /api/media, /api/comments"
        }
    }))
}
