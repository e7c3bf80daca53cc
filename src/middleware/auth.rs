use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;

use crate::auth::{Claims, Role, TokenError};
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated identity attached to the request context by `require_auth`.
/// Built entirely from verified token claims; no database round-trip.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            username: claims.username,
            email: claims.email,
            role: claims.role,
        }
    }
}

/// Token authentication middleware.
///
/// State machine: no token -> 401; token present -> verify -> valid (attach
/// identity, continue) | expired (401 TOKEN_EXPIRED) | invalid (401
/// INVALID_TOKEN) | not yet valid (401 TOKEN_NOT_ACTIVE). Anything else is a
/// server-side verification problem and maps to 500 AUTH_ERROR.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let addr = peer_addr(&request);
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let token = match extract_bearer(request.headers()) {
        Some(token) => token,
        None => {
            tracing::warn!("AUTH FAILED: {} - no token for {} {}", fmt_addr(addr), method, path);
            return Err(ApiError::unauthorized(
                "Access denied! No authentication token provided!",
            ));
        }
    };

    match state.tokens.verify_access(&token) {
        Ok(claims) => {
            let user = CurrentUser::from(claims);
            tracing::info!(
                "AUTH SUCCESS: User {} ({}) accessed {} {}",
                user.username,
                user.id,
                method,
                path
            );
            request.extensions_mut().insert(user);
            Ok(next.run(request).await)
        }
        Err(err) => {
            tracing::warn!("AUTH FAILED: {} - {} for {} {}", fmt_addr(addr), err, method, path);
            Err(token_error_response(err))
        }
    }
}

/// Non-blocking variant: attempts verification and continues either way.
/// Used by endpoints with optional personalization; downstream code checks
/// for the presence of `CurrentUser` in extensions.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let addr = peer_addr(&request);
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    if let Some(token) = extract_bearer(request.headers()) {
        match state.tokens.verify_access(&token) {
            Ok(claims) => {
                let user = CurrentUser::from(claims);
                tracing::info!(
                    "AUTH SUCCESS: User {} ({}) accessed {} {}",
                    user.username,
                    user.id,
                    method,
                    path
                );
                request.extensions_mut().insert(user);
            }
            Err(err) => {
                tracing::warn!(
                    "AUTH FAILED: {} - {} for {} {} (continuing unauthenticated)",
                    fmt_addr(addr),
                    err,
                    method,
                    path
                );
            }
        }
    }
    next.run(request).await
}

fn token_error_response(err: TokenError) -> ApiError {
    match err {
        TokenError::Expired => {
            ApiError::unauthorized_with_code("Token expired! Please login again!", "TOKEN_EXPIRED")
        }
        TokenError::Invalid | TokenError::WrongType => {
            ApiError::unauthorized_with_code("Invalid token! Please login again!", "INVALID_TOKEN")
        }
        TokenError::NotYetValid => {
            ApiError::unauthorized_with_code("Token not active yet!", "TOKEN_NOT_ACTIVE")
        }
        TokenError::Verification(detail) => {
            tracing::error!("Token verification failure: {}", detail);
            ApiError::internal_with_code("Authentication Failed!", "AUTH_ERROR")
        }
    }
}

/// Extract the token from `Authorization: Bearer <token>`. A missing header
/// and a malformed prefix are treated identically as "no token".
fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("authorization")?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

fn peer_addr(request: &Request) -> Option<SocketAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0)
}

fn fmt_addr(addr: Option<SocketAddr>) -> String {
    addr.map(|a| a.to_string()).unwrap_or_else(|| "unknown".to_string())
}
