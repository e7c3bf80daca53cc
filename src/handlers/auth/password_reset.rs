use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::validate_payload;

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Please provide a valid email address!"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, max = 500, message = "token must be 1-500 characters long!"))]
    pub token: String,

    #[validate(
        length(min = 8, max = 128, message = "newPassword must be 8-128 characters long!"),
        custom(
            function = "crate::validation::password_strength",
            message = "newPassword must contain lowercase, uppercase, number, and special character(@$!%*?&)!"
        )
    )]
    pub new_password: String,
}

/// POST /api/auth/forgot-password - Request a password reset.
///
/// Always returns the same 200 body whether or not the account exists, so the
/// endpoint cannot be used for email enumeration. Email delivery is out of
/// scope; the issued reset token is only logged for operators.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload)?;

    let user: Option<(i64, String, String, String)> = sqlx::query_as(
        "SELECT id, username, email, role FROM users WHERE email = $1",
    )
    .bind(&payload.email)
    .fetch_optional(&state.pool)
    .await?;

    match user {
        Some((id, username, email, role)) => {
            let role = crate::auth::Role::parse(&role).unwrap_or(crate::auth::Role::Viewer);
            match state.tokens.issue_reset(id, &username, &email, role) {
                Ok(token) => {
                    tracing::info!("PASSWORD RESET REQUESTED: User {} ({})", username, id);
                    tracing::debug!("Password reset token for user {}: {}", id, token);
                }
                Err(e) => {
                    // Still answer 200; the caller learns nothing either way.
                    tracing::error!("Failed to issue reset token for user {}: {}", id, e);
                }
            }
        }
        None => {
            tracing::warn!("PASSWORD RESET REQUESTED: No user found with email {}", payload.email);
        }
    }

    Ok(Json(json!({
        "message": "If an account with this email exists, a password reset link has been sent!"
    })))
}

/// POST /api/auth/reset-password - Complete a password reset.
///
/// Any token problem (expired, malformed, wrong type, wrong signature)
/// collapses into the same 400; an access token is rejected here exactly like
/// a forged one.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload)?;

    let claims = state.tokens.verify_reset(&payload.token).map_err(|e| {
        tracing::warn!("PASSWORD RESET FAILED: Invalid token ({})", e);
        ApiError::bad_request("Invalid or expired reset token!")
    })?;

    // The token is only honored while the account it names still exists
    // under the same email.
    let user: Option<(i64, String)> =
        sqlx::query_as("SELECT id, username FROM users WHERE id = $1 AND email = $2")
            .bind(claims.sub)
            .bind(&claims.email)
            .fetch_optional(&state.pool)
            .await?;

    let (user_id, username) = user.ok_or_else(|| {
        tracing::warn!("PASSWORD RESET FAILED: User not found for token");
        ApiError::bad_request("Invalid reset token!")
    })?;

    let password_hash = state.passwords.hash(&payload.new_password).await?;

    sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
        .bind(&password_hash)
        .bind(user_id)
        .execute(&state.pool)
        .await?;

    tracing::info!("PASSWORD RESET SUCCESS: User {} ({}) reset password", username, user_id);

    Ok(Json(json!({
        "message": "Password reset successfully! You can now login with your new password!"
    })))
}
