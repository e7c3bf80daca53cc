use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::database::models::User;
use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::validate_payload;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        length(min = 3, max = 50, message = "Username must be 3-50 characters long!"),
        custom(
            function = "crate::validation::username_chars",
            message = "Username can only contain letters, numbers, underscore, and hyphen!"
        )
    )]
    pub username: String,

    #[validate(
        length(max = 100, message = "Email must not exceed 100 characters!"),
        email(message = "Please provide a valid email address!")
    )]
    pub email: String,

    #[validate(
        length(min = 8, max = 128, message = "password must be 8-128 characters long!"),
        custom(
            function = "crate::validation::password_strength",
            message = "password must contain lowercase, uppercase, number, and special character(@$!%*?&)!"
        )
    )]
    pub password: String,

    #[validate(custom(
        function = "crate::validation::known_role",
        message = "role must be one of: designer, viewer!"
    ))]
    pub role: String,
}

/// POST /api/auth/register - Create an account and receive a bearer token.
///
/// 409 when the email or username is already taken; 201 with a token whose
/// subject matches the created row otherwise.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload)?;

    let existing: Option<i64> =
        sqlx::query_scalar("SELECT id FROM users WHERE email = $1 OR username = $2")
            .bind(&payload.email)
            .bind(&payload.username)
            .fetch_optional(&state.pool)
            .await?;

    if existing.is_some() {
        return Err(ApiError::conflict(
            "User already existing with this email or username!",
        ));
    }

    let password_hash = state.passwords.hash(&payload.password).await?;

    let user: User = sqlx::query_as(
        "INSERT INTO users (username, email, password_hash, role) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, username, email, password_hash, role, created_at, updated_at",
    )
    .bind(&payload.username)
    .bind(&payload.email)
    .bind(&password_hash)
    .bind(&payload.role)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| {
        ApiError::conflict_on_unique(e, "User already existing with this email or username!")
    })?;

    let token = state
        .tokens
        .issue_access(user.id, &user.username, &user.email, user.role())
        .map_err(|e| {
            tracing::error!("Token issue failed after registration: {}", e);
            ApiError::internal("Registration failed!")
        })?;

    tracing::info!(
        "REGISTRATION SUCCESS: User {} ({}) registered with role {}",
        user.username,
        user.id,
        user.role
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully!",
            "user": user.to_public(),
            "token": token
        })),
    ))
}
