use axum::{extract::State, response::IntoResponse, Extension, Json};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;
use crate::validation::validate_payload;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(
        length(max = 100, message = "Email must not exceed 100 characters!"),
        email(message = "Please provide a valid email address!")
    )]
    pub email: String,

    #[validate(length(min = 1, max = 128, message = "password is required!"))]
    pub password: String,
}

/// POST /api/auth/login - Authenticate and receive a bearer token.
///
/// A missing account and a wrong password produce the identical 401 body,
/// preventing account enumeration.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload)?;

    let user: Option<User> = sqlx::query_as(
        "SELECT id, username, email, password_hash, role, created_at, updated_at \
         FROM users WHERE email = $1",
    )
    .bind(&payload.email)
    .fetch_optional(&state.pool)
    .await?;

    let user = match user {
        Some(user) => user,
        None => {
            tracing::warn!("LOGIN FAILED: No user found with email {}", payload.email);
            return Err(invalid_credentials());
        }
    };

    let valid = state
        .passwords
        .verify(&payload.password, &user.password_hash)
        .await?;

    if !valid {
        tracing::warn!(
            "LOGIN FAILED: Invalid password for user {} ({})",
            user.username,
            user.id
        );
        return Err(invalid_credentials());
    }

    let token = state
        .tokens
        .issue_access(user.id, &user.username, &user.email, user.role())
        .map_err(|e| {
            tracing::error!("Token issue failed at login: {}", e);
            ApiError::internal("Login failed!")
        })?;

    tracing::info!("LOGIN SUCCESS: User {} ({}) logged in", user.username, user.id);

    Ok(Json(json!({
        "message": "Login successfully!",
        "user": user.to_public(),
        "token": token
    })))
}

/// The one 401 both failed-login branches share. An unknown email and a wrong
/// password must be indistinguishable to the caller.
fn invalid_credentials() -> ApiError {
    ApiError::unauthorized("Invalid email or password!")
}

/// POST /api/auth/logout - Client-side logout.
///
/// Tokens are stateless with no revocation list, so the server only records
/// the event; runs behind the non-blocking auth variant so an expired token
/// still logs out cleanly.
pub async fn logout(user: Option<Extension<CurrentUser>>) -> Json<serde_json::Value> {
    if let Some(Extension(user)) = user {
        tracing::info!("LOGOUT SUCCESS: User {} ({}) logged out", user.username, user.id);
    }

    Json(json!({ "message": "Logout successfully!" }))
}

/// POST /api/auth/refresh - Exchange a valid token for a fresh one.
pub async fn refresh(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let token = state
        .tokens
        .issue_access(user.id, &user.username, &user.email, user.role)
        .map_err(|e| {
            tracing::error!("Token issue failed at refresh: {}", e);
            ApiError::internal("Token refresh failed!")
        })?;

    tracing::info!(
        "TOKEN REFRESH SUCCESS: User {} ({}) refreshed token",
        user.username,
        user.id
    );

    Ok(Json(json!({
        "message": "Token refreshed successfully!",
        "user": {
            "id": user.id,
            "username": user.username,
            "email": user.email,
            "role": user.role
        },
        "token": token
    })))
}

/// GET /api/auth/verify - Report the identity behind the presented token.
pub async fn verify(Extension(user): Extension<CurrentUser>) -> Json<serde_json::Value> {
    Json(json!({
        "message": "Token is valid!",
        "user": {
            "id": user.id,
            "username": user.username,
            "email": user.email,
            "role": user.role
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn failed_login_never_discloses_which_credential_was_wrong() {
        let err = invalid_credentials();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let body = err.to_json();
        assert_eq!(body["error"], "Invalid email or password!");
        assert!(body.get("code").is_none());
        assert!(body.get("details").is_none());
    }
}
