use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::error::ApiError;
use crate::middleware::{CurrentUser, OwnedResource};
use crate::state::AppState;
use crate::validation::validate_payload;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMediaRequest {
    #[validate(custom(
        function = "crate::validation::known_media_type",
        message = "mediaType must be one of design_image, video, icon, backstage_photo, map_dot!"
    ))]
    pub media_type: String,

    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters long!"))]
    pub title: String,

    #[validate(length(max = 2000, message = "description must be at most 2000 characters long!"))]
    pub description: Option<String>,

    #[validate(length(min = 1, max = 500, message = "url must be 1-500 characters long!"))]
    pub url: String,

    #[validate(range(min = 0, message = "duration must be non-negative!"))]
    pub duration: Option<i32>,

    #[validate(length(max = 500, message = "thumbnailUrl must be at most 500 characters long!"))]
    pub thumbnail_url: Option<String>,

    /// Opaque structured location payload; stored as-is.
    pub location: Option<serde_json::Value>,

    #[validate(range(min = 1900, max = 2100, message = "classYear must be a valid year!"))]
    pub class_year: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMediaRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters long!"))]
    pub title: Option<String>,

    #[validate(length(max = 2000, message = "description must be at most 2000 characters long!"))]
    pub description: Option<String>,

    #[validate(length(max = 500, message = "thumbnailUrl must be at most 500 characters long!"))]
    pub thumbnail_url: Option<String>,

    pub location: Option<serde_json::Value>,

    #[validate(range(min = 1900, max = 2100, message = "classYear must be a valid year!"))]
    pub class_year: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AttachMediaRequest {
    #[validate(range(min = 1, message = "mediaId must be a positive integer!"))]
    pub media_id: i64,

    #[validate(range(min = 0, message = "displayOrder must be non-negative!"))]
    pub display_order: Option<i32>,
}

/// POST /api/media - Register a media record owned by the caller.
///
/// Upload to object storage happens out of band; this stores the metadata and
/// resulting URL only.
pub async fn create_media(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<CreateMediaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload)?;

    let media: serde_json::Value = sqlx::query_scalar(
        "INSERT INTO media (user_id, media_type, title, description, url, duration,
                            thumbnail_url, location, class_year)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING to_jsonb(media)",
    )
    .bind(current.id)
    .bind(&payload.media_type)
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(&payload.url)
    .bind(payload.duration)
    .bind(&payload.thumbnail_url)
    .bind(&payload.location)
    .bind(payload.class_year)
    .fetch_one(&state.pool)
    .await?;

    tracing::info!("MEDIA CREATED: User {} ({})", current.username, current.id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Media created successfully!", "media": media })),
    ))
}

/// PUT /api/media/:id - Ownership-gated partial update. The media type and
/// URL are immutable once registered.
pub async fn update_media(
    State(state): State<AppState>,
    Extension(owned): Extension<OwnedResource>,
    Json(payload): Json<UpdateMediaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload)?;

    let media: Option<serde_json::Value> = sqlx::query_scalar(
        "UPDATE media SET
             title = COALESCE($1, title),
             description = COALESCE($2, description),
             thumbnail_url = COALESCE($3, thumbnail_url),
             location = COALESCE($4, location),
             class_year = COALESCE($5, class_year),
             updated_at = NOW()
         WHERE id = $6
         RETURNING to_jsonb(media)",
    )
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(&payload.thumbnail_url)
    .bind(&payload.location)
    .bind(payload.class_year)
    .bind(owned.id)
    .fetch_optional(&state.pool)
    .await?;
    let media = super::updated_or_gone(media, "Media")?;

    Ok(Json(json!({ "message": "Media updated successfully!", "media": media })))
}

/// DELETE /api/media/:id - Ownership-gated; block links cascade.
pub async fn delete_media(
    State(state): State<AppState>,
    Extension(owned): Extension<OwnedResource>,
) -> Result<impl IntoResponse, ApiError> {
    sqlx::query("DELETE FROM media WHERE id = $1")
        .bind(owned.id)
        .execute(&state.pool)
        .await?;

    Ok(Json(json!({ "message": "Media deleted successfully!" })))
}

/// POST /api/blocks/:id/media - Attach media to an owned design block.
pub async fn attach_media(
    State(state): State<AppState>,
    Extension(owned): Extension<OwnedResource>,
    Json(payload): Json<AttachMediaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload)?;

    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM media WHERE id = $1")
        .bind(payload.media_id)
        .fetch_optional(&state.pool)
        .await?;
    if exists.is_none() {
        return Err(ApiError::not_found("Media not found!"));
    }

    let link: serde_json::Value = sqlx::query_scalar(
        "INSERT INTO block_media (design_block_id, media_id, display_order)
         VALUES ($1, $2, COALESCE($3, 0))
         RETURNING to_jsonb(block_media)",
    )
    .bind(owned.id)
    .bind(payload.media_id)
    .bind(payload.display_order)
    .fetch_one(&state.pool)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Media attached successfully!", "blockMedia": link })),
    ))
}

/// DELETE /api/block-media/:id - Detach media from a block. Ownership is
/// resolved through the block's parent design.
pub async fn detach_media(
    State(state): State<AppState>,
    Extension(owned): Extension<OwnedResource>,
) -> Result<impl IntoResponse, ApiError> {
    sqlx::query("DELETE FROM block_media WHERE id = $1")
        .bind(owned.id)
        .execute(&state.pool)
        .await?;

    Ok(Json(json!({ "message": "Media detached successfully!" })))
}
