use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::error::ApiError;
use crate::middleware::OwnedResource;
use crate::state::AppState;
use crate::validation::validate_payload;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlockRequest {
    #[validate(length(min = 1, max = 50, message = "blockType must be 1-50 characters long!"))]
    pub block_type: String,

    #[validate(length(max = 200, message = "title must be at most 200 characters long!"))]
    pub title: Option<String>,

    #[validate(length(max = 10000, message = "content must be at most 10000 characters long!"))]
    pub content: Option<String>,

    #[validate(range(min = 0, message = "displayOrder must be non-negative!"))]
    pub display_order: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBlockRequest {
    #[validate(length(min = 1, max = 50, message = "blockType must be 1-50 characters long!"))]
    pub block_type: Option<String>,

    #[validate(length(max = 200, message = "title must be at most 200 characters long!"))]
    pub title: Option<String>,

    #[validate(length(max = 10000, message = "content must be at most 10000 characters long!"))]
    pub content: Option<String>,

    #[validate(range(min = 0, message = "displayOrder must be non-negative!"))]
    pub display_order: Option<i32>,
}

/// POST /api/designs/:id/blocks - Add a content block to an owned design.
pub async fn create_block(
    State(state): State<AppState>,
    Extension(owned): Extension<OwnedResource>,
    Json(payload): Json<CreateBlockRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload)?;

    let block: serde_json::Value = sqlx::query_scalar(
        "INSERT INTO design_blocks (design_id, block_type, title, content, display_order)
         VALUES ($1, $2, $3, $4, COALESCE($5, 0))
         RETURNING to_jsonb(design_blocks)",
    )
    .bind(owned.id)
    .bind(&payload.block_type)
    .bind(&payload.title)
    .bind(&payload.content)
    .bind(payload.display_order)
    .fetch_one(&state.pool)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Block created successfully!", "block": block })),
    ))
}

/// PUT /api/blocks/:id - Ownership-gated (through the parent design).
pub async fn update_block(
    State(state): State<AppState>,
    Extension(owned): Extension<OwnedResource>,
    Json(payload): Json<UpdateBlockRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload)?;

    let block: Option<serde_json::Value> = sqlx::query_scalar(
        "UPDATE design_blocks SET
             block_type = COALESCE($1, block_type),
             title = COALESCE($2, title),
             content = COALESCE($3, content),
             display_order = COALESCE($4, display_order),
             updated_at = NOW()
         WHERE id = $5
         RETURNING to_jsonb(design_blocks)",
    )
    .bind(&payload.block_type)
    .bind(&payload.title)
    .bind(&payload.content)
    .bind(payload.display_order)
    .bind(owned.id)
    .fetch_optional(&state.pool)
    .await?;
    let block = super::updated_or_gone(block, "Design block")?;

    Ok(Json(json!({ "message": "Block updated successfully!", "block": block })))
}

/// DELETE /api/blocks/:id - Ownership-gated; attached block media cascade.
pub async fn delete_block(
    State(state): State<AppState>,
    Extension(owned): Extension<OwnedResource>,
) -> Result<impl IntoResponse, ApiError> {
    sqlx::query("DELETE FROM design_blocks WHERE id = $1")
        .bind(owned.id)
        .execute(&state.pool)
        .await?;

    Ok(Json(json!({ "message": "Block deleted successfully!" })))
}
