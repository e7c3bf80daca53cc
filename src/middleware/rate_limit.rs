use std::sync::Arc;

use axum::response::IntoResponse;
use axum::Router;
use tower_governor::{governor::GovernorConfigBuilder, GovernorError, GovernorLayer};

use crate::error::ApiError;
use crate::state::AppState;

/// Throttle messages per route class, matching the windows configured in
/// `ApiConfig`.
pub const AUTH_LIMIT_MESSAGE: &str =
    "Too many authentication attempts! Please try again in 15 minutes!";
pub const REGISTER_LIMIT_MESSAGE: &str =
    "Too many accounts created! Please try again in an hour!";
pub const API_LIMIT_MESSAGE: &str = "Too many requests! Please try again in 15 minutes!";

/// Wrap a route group with a token-bucket limiter keyed by peer address.
///
/// `burst` requests are allowed per `window_secs`; the bucket refills evenly
/// across the window. The limiter is an off-the-shelf component; this module
/// only wires its configuration and error shape.
pub fn limit_routes(
    router: Router<AppState>,
    burst: u32,
    window_secs: u64,
    message: &'static str,
) -> Router<AppState> {
    let replenish_millis = (window_secs * 1000 / burst.max(1) as u64).max(1);

    let config = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(replenish_millis)
            .burst_size(burst)
            .error_handler(move |err| match err {
                GovernorError::TooManyRequests { .. } => {
                    tracing::warn!("RATE LIMIT: client exceeded {} requests per {}s", burst, window_secs);
                    ApiError::too_many_requests(message).into_response()
                }
                GovernorError::UnableToExtractKey => {
                    ApiError::internal("Rate limiter could not identify the client!").into_response()
                }
                GovernorError::Other { .. } => {
                    ApiError::internal("Rate limiter failure!").into_response()
                }
            })
            .finish()
            // Static, positive parameters; a failure here is a programming
            // error caught at startup, not a request-time condition.
            .expect("invalid rate limiter configuration"),
    );

    router.layer(GovernorLayer { config })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_window_allows_five_per_fifteen_minutes() {
        // 15 min window, 5 attempts: one token every 180 seconds.
        let replenish = 15 * 60 * 1000 / 5;
        assert_eq!(replenish, 180_000);
    }

    #[test]
    fn limiter_config_builds_for_every_route_class() {
        for (burst, window) in [(5u32, 900u64), (3, 3600), (100, 900)] {
            let replenish_millis = (window * 1000 / burst as u64).max(1);
            let config = GovernorConfigBuilder::default()
                .per_millisecond(replenish_millis)
                .burst_size(burst)
                .finish();
            assert!(config.is_some());
        }
    }
}
