use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Errors raised while loading configuration at startup.
///
/// Configuration loading fails closed: a missing or empty signing secret
/// refuses to start the process rather than issuing unverifiable tokens.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_rate_limiting: bool,
    /// Login and password endpoints: attempts allowed per window.
    pub auth_rate_limit: u32,
    pub auth_rate_window_secs: u64,
    /// Account registration: accounts allowed per window.
    pub register_rate_limit: u32,
    pub register_rate_window_secs: u64,
    /// General API traffic per client address.
    pub api_rate_limit: u32,
    pub api_rate_window_secs: u64,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// JWT signing secret. Required, never defaulted.
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    /// bcrypt work factor for newly stored digests. Verification reads the
    /// cost out of each digest, so raising this never invalidates old hashes.
    pub bcrypt_cost: u32,
    /// Administrator email allow-list. Comma-separated in ADMIN_EMAILS,
    /// trimmed, compared case-sensitively. Empty means no admin exists.
    pub admin_emails: Vec<String>,
}

impl SecurityConfig {
    /// Exact-match membership test against the admin allow-list.
    pub fn is_admin(&self, email: &str) -> bool {
        self.admin_emails.iter().any(|a| a == email)
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        let jwt_secret = env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let mut config = match environment {
            Environment::Production => Self::production(jwt_secret, database_url),
            Environment::Staging => Self::staging(jwt_secret, database_url),
            Environment::Development => Self::development(jwt_secret, database_url),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse(&v, "DATABASE_MAX_CONNECTIONS")?;
        }
        if let Ok(v) = env::var("API_ENABLE_RATE_LIMITING") {
            self.api.enable_rate_limiting = parse(&v, "API_ENABLE_RATE_LIMITING")?;
        }
        if let Ok(v) = env::var("CORS_ORIGINS") {
            self.api.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("JWT_EXPIRES_IN_HOURS") {
            self.security.jwt_expiry_hours = parse(&v, "JWT_EXPIRES_IN_HOURS")?;
        }
        if let Ok(v) = env::var("BCRYPT_COST") {
            self.security.bcrypt_cost = parse(&v, "BCRYPT_COST")?;
        }
        if let Ok(v) = env::var("ADMIN_EMAILS") {
            self.security.admin_emails = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        Ok(())
    }

    fn development(jwt_secret: String, database_url: String) -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: database_url,
                max_connections: 10,
                connect_timeout_secs: 5,
                idle_timeout_secs: 30,
            },
            api: ApiConfig {
                enable_rate_limiting: false,
                auth_rate_limit: 5,
                auth_rate_window_secs: 15 * 60,
                register_rate_limit: 3,
                register_rate_window_secs: 60 * 60,
                api_rate_limit: 100,
                api_rate_window_secs: 15 * 60,
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
            },
            security: SecurityConfig {
                jwt_secret,
                jwt_expiry_hours: 24,
                bcrypt_cost: 12,
                admin_emails: Vec::new(),
            },
        }
    }

    fn staging(jwt_secret: String, database_url: String) -> Self {
        let mut config = Self::development(jwt_secret, database_url);
        config.environment = Environment::Staging;
        config.database.max_connections = 20;
        config.api.enable_rate_limiting = true;
        config.api.max_request_size_bytes = 5 * 1024 * 1024;
        config
    }

    fn production(jwt_secret: String, database_url: String) -> Self {
        let mut config = Self::development(jwt_secret, database_url);
        config.environment = Environment::Production;
        config.database.max_connections = 20;
        config.database.connect_timeout_secs = 2;
        config.api.enable_rate_limiting = true;
        config.api.enable_request_logging = false;
        config.api.max_request_size_bytes = 2 * 1024 * 1024;
        config.api.cors_origins = Vec::new();
        config
    }

    /// True when internal error detail may be disclosed in responses.
    pub fn debug_errors(&self) -> bool {
        self.environment == Environment::Development
    }
}

fn parse<T: std::str::FromStr>(value: &str, key: &'static str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        AppConfig::development(
            "test-secret".to_string(),
            "postgres://localhost/design_hub_test".to_string(),
        )
    }

    #[test]
    fn development_defaults() {
        let config = test_config();
        assert!(!config.api.enable_rate_limiting);
        assert_eq!(config.security.jwt_expiry_hours, 24);
        assert_eq!(config.security.bcrypt_cost, 12);
        assert!(config.security.admin_emails.is_empty());
    }

    #[test]
    fn production_enables_rate_limiting() {
        let config = AppConfig::production("s".into(), "postgres://x/y".into());
        assert!(config.api.enable_rate_limiting);
        assert!(!config.debug_errors());
    }

    #[test]
    fn empty_allow_list_means_no_admin() {
        let config = test_config();
        assert!(!config.security.is_admin("anyone@example.com"));
    }

    #[test]
    fn admin_match_is_case_sensitive() {
        let mut config = test_config();
        config.security.admin_emails = vec!["admin@example.com".to_string()];
        assert!(config.security.is_admin("admin@example.com"));
        assert!(!config.security.is_admin("Admin@example.com"));
    }
}
