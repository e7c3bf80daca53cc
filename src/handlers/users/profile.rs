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
pub struct UpdateProfileRequest {
    #[validate(
        length(min = 3, max = 50, message = "Username must be 3-50 characters long!"),
        custom(
            function = "crate::validation::username_chars",
            message = "Username can only contain letters, numbers, underscores, and hyphens!"
        )
    )]
    pub username: Option<String>,

    #[validate(
        length(max = 100, message = "email must be at most 100 characters long!"),
        email(message = "Please provide a valid email address!")
    )]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, max = 128, message = "currentPassword is required!"))]
    pub current_password: String,

    #[validate(
        length(min = 8, max = 128, message = "newPassword must be 8-128 characters long!"),
        custom(
            function = "crate::validation::password_strength",
            message = "newPassword must contain lowercase, uppercase, number, and special character(@$!%*?&)!"
        )
    )]
    pub new_password: String,
}

/// GET /api/users/profile - Current user's own record.
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(current.id)
        .fetch_optional(&state.pool)
        .await?;

    let user = user.ok_or_else(|| ApiError::not_found("User not found!"))?;
    Ok(Json(json!({ "user": user.to_public() })))
}

/// PUT /api/users/profile - Update username and/or email.
///
/// Uniqueness conflicts are checked up front so the caller gets a precise 409
/// instead of a constraint-violation 500.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload)?;

    if let Some(username) = &payload.username {
        let taken: Option<i64> =
            sqlx::query_scalar("SELECT id FROM users WHERE username = $1 AND id <> $2")
                .bind(username)
                .bind(current.id)
                .fetch_optional(&state.pool)
                .await?;
        if taken.is_some() {
            return Err(ApiError::conflict("Username already taken!"));
        }
    }

    if let Some(email) = &payload.email {
        let taken: Option<i64> =
            sqlx::query_scalar("SELECT id FROM users WHERE email = $1 AND id <> $2")
                .bind(email)
                .bind(current.id)
                .fetch_optional(&state.pool)
                .await?;
        if taken.is_some() {
            return Err(ApiError::conflict("Email already taken!"));
        }
    }

    // Fixed statements per field combination keep the bind list static.
    let updated: Option<User> = match (&payload.username, &payload.email) {
        (Some(username), Some(email)) => {
            sqlx::query_as(
                "UPDATE users SET username = $1, email = $2, updated_at = NOW()
                 WHERE id = $3 RETURNING *",
            )
            .bind(username)
            .bind(email)
            .bind(current.id)
            .fetch_optional(&state.pool)
            .await
            .map_err(taken_conflict)?
        }
        (Some(username), None) => {
            sqlx::query_as(
                "UPDATE users SET username = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
            )
            .bind(username)
            .bind(current.id)
            .fetch_optional(&state.pool)
            .await
            .map_err(taken_conflict)?
        }
        (None, Some(email)) => {
            sqlx::query_as(
                "UPDATE users SET email = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
            )
            .bind(email)
            .bind(current.id)
            .fetch_optional(&state.pool)
            .await
            .map_err(taken_conflict)?
        }
        (None, None) => {
            return Err(ApiError::bad_request("No valid fields to update!"));
        }
    };

    let user = updated.ok_or_else(|| ApiError::not_found("User not found!"))?;
    tracing::info!("PROFILE UPDATED: User {} ({})", user.username, user.id);

    Ok(Json(json!({
        "message": "Profile updated successfully!",
        "user": user.to_public(),
    })))
}

/// A concurrent writer can claim a username or email between the pre-check
/// and the UPDATE; the constraint name picks the 409 message.
fn taken_conflict(err: sqlx::Error) -> ApiError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ApiError::conflict(taken_message(db.constraint().unwrap_or_default()))
        }
        _ => err.into(),
    }
}

fn taken_message(constraint: &str) -> &'static str {
    if constraint.contains("username") {
        "Username already taken!"
    } else {
        "Email already taken!"
    }
}

/// PUT /api/users/change-password - Re-authenticate and rotate the password.
pub async fn change_password(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload)?;

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(current.id)
        .fetch_optional(&state.pool)
        .await?;
    let user = user.ok_or_else(|| ApiError::not_found("User not found!"))?;

    let current_ok = state
        .passwords
        .verify(&payload.current_password, &user.password_hash)
        .await?;
    if !current_ok {
        tracing::warn!(
            "PASSWORD CHANGE FAILED: User {} ({}) gave wrong current password",
            user.username,
            user.id
        );
        return Err(ApiError::unauthorized("Current password is incorrect!"));
    }

    let same = state
        .passwords
        .verify(&payload.new_password, &user.password_hash)
        .await?;
    if same {
        return Err(ApiError::bad_request(
            "New password must be different from current password!",
        ));
    }

    let password_hash = state.passwords.hash(&payload.new_password).await?;
    sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
        .bind(&password_hash)
        .bind(user.id)
        .execute(&state.pool)
        .await?;

    tracing::info!("PASSWORD CHANGED: User {} ({})", user.username, user.id);
    Ok(Json(json!({ "message": "Password changed successfully!" })))
}

/// DELETE /api/users/account - Delete the caller's account.
///
/// Owned content goes with it via ON DELETE CASCADE.
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(current.id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("User not found!"));
    }

    tracing::info!("ACCOUNT DELETED: User {} ({})", current.username, current.id);
    Ok(Json(json!({ "message": "Account deleted successfully!" })))
}
