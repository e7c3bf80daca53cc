use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::{PasswordService, TokenService};
use crate::config::AppConfig;

/// Shared per-process state, cloned into every handler and gate.
///
/// Configuration is injected here once at startup; gates read it through the
/// state instead of ambient globals so each can be tested with a fake config.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub tokens: TokenService,
    pub passwords: PasswordService,
}

impl AppState {
    pub fn new(pool: PgPool, config: AppConfig) -> Self {
        let tokens = TokenService::new(
            &config.security.jwt_secret,
            config.security.jwt_expiry_hours,
        );
        let passwords = PasswordService::new(config.security.bcrypt_cost);

        Self {
            pool,
            config: Arc::new(config),
            tokens,
            passwords,
        }
    }
}
