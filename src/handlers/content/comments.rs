use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::error::ApiError;
use crate::middleware::{CurrentUser, OwnedResource};
use crate::state::AppState;
use crate::validation::validate_payload;

use super::designs::parse_id;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 2000, message = "commentText must be 1-2000 characters long!"))]
    pub comment_text: String,

    #[validate(range(min = 1, message = "designBlockId must be a positive integer!"))]
    pub design_block_id: Option<i64>,

    #[validate(range(min = 1, message = "parentCommentId must be a positive integer!"))]
    pub parent_comment_id: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1, max = 2000, message = "commentText must be 1-2000 characters long!"))]
    pub comment_text: String,
}

/// POST /api/designs/:id/comments - Any authenticated role may comment; the
/// target design just has to exist.
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let design_id = parse_id(&id)?;
    validate_payload(&payload)?;

    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM designs WHERE id = $1")
        .bind(design_id)
        .fetch_optional(&state.pool)
        .await?;
    if exists.is_none() {
        return Err(ApiError::not_found("Design not found!"));
    }

    if let Some(parent_id) = payload.parent_comment_id {
        let parent: Option<i64> =
            sqlx::query_scalar("SELECT id FROM comments WHERE id = $1 AND design_id = $2")
                .bind(parent_id)
                .bind(design_id)
                .fetch_optional(&state.pool)
                .await?;
        if parent.is_none() {
            return Err(ApiError::not_found("Parent comment not found!"));
        }
    }

    let comment: serde_json::Value = sqlx::query_scalar(
        "INSERT INTO comments (user_id, design_id, design_block_id, parent_comment_id, comment_text)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING to_jsonb(comments)",
    )
    .bind(current.id)
    .bind(design_id)
    .bind(payload.design_block_id)
    .bind(payload.parent_comment_id)
    .bind(&payload.comment_text)
    .fetch_one(&state.pool)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Comment created successfully!", "comment": comment })),
    ))
}

/// PUT /api/comments/:id - Authors edit their own comments only.
pub async fn update_comment(
    State(state): State<AppState>,
    Extension(owned): Extension<OwnedResource>,
    Json(payload): Json<UpdateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload)?;

    let comment: Option<serde_json::Value> = sqlx::query_scalar(
        "UPDATE comments SET comment_text = $1, updated_at = NOW()
         WHERE id = $2
         RETURNING to_jsonb(comments)",
    )
    .bind(&payload.comment_text)
    .bind(owned.id)
    .fetch_optional(&state.pool)
    .await?;
    let comment = super::updated_or_gone(comment, "Comment")?;

    Ok(Json(json!({ "message": "Comment updated successfully!", "comment": comment })))
}

/// DELETE /api/comments/:id - Authors delete their own comments only.
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(owned): Extension<OwnedResource>,
) -> Result<impl IntoResponse, ApiError> {
    sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(owned.id)
        .execute(&state.pool)
        .await?;

    Ok(Json(json!({ "message": "Comment deleted successfully!" })))
}
