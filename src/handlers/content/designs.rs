use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::error::{ApiError, FieldError};
use crate::middleware::{CurrentUser, OwnedResource};
use crate::state::AppState;
use crate::validation::validate_payload;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ListDesignsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDesignRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters long!"))]
    pub title: String,

    #[validate(length(max = 2000, message = "description must be at most 2000 characters long!"))]
    pub description: Option<String>,

    #[validate(length(max = 100, message = "designerName must be at most 100 characters long!"))]
    pub designer_name: Option<String>,

    #[validate(range(min = 1900, max = 2100, message = "classYear must be a valid year!"))]
    pub class_year: Option<i32>,

    #[validate(length(max = 500, message = "coverImageUrl must be at most 500 characters long!"))]
    pub cover_image_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDesignRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters long!"))]
    pub title: Option<String>,

    #[validate(length(max = 2000, message = "description must be at most 2000 characters long!"))]
    pub description: Option<String>,

    #[validate(length(max = 100, message = "designerName must be at most 100 characters long!"))]
    pub designer_name: Option<String>,

    #[validate(range(min = 1900, max = 2100, message = "classYear must be a valid year!"))]
    pub class_year: Option<i32>,

    #[validate(length(max = 500, message = "coverImageUrl must be at most 500 characters long!"))]
    pub cover_image_url: Option<String>,
}

/// GET /api/designs - Public listing, newest first.
pub async fn list_designs(
    State(state): State<AppState>,
    Query(query): Query<ListDesignsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1) * limit;

    let total_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM designs")
        .fetch_one(&state.pool)
        .await?;
    let designs: Vec<serde_json::Value> = sqlx::query_scalar(
        "SELECT to_jsonb(d) FROM designs d ORDER BY d.created_at DESC LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total_pages = (total_count + limit - 1) / limit;
    Ok(Json(json!({
        "designs": designs,
        "pagination": {
            "currentPage": page,
            "totalPages": total_pages,
            "totalCount": total_count,
            "limit": limit,
            "hasNextPage": page < total_pages,
            "hasPrevPage": page > 1,
        },
    })))
}

/// GET /api/designs/:id - Public detail view with tags and blocks inlined.
pub async fn get_design(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;

    let design: Option<serde_json::Value> =
        sqlx::query_scalar("SELECT to_jsonb(d) FROM designs d WHERE d.id = $1")
            .bind(id)
            .fetch_optional(&state.pool)
            .await?;
    let design = design.ok_or_else(|| ApiError::not_found("Design not found!"))?;

    let tags: Vec<serde_json::Value> = sqlx::query_scalar(
        "SELECT to_jsonb(t) FROM design_tags t WHERE t.design_id = $1 ORDER BY t.name",
    )
    .bind(id)
    .fetch_all(&state.pool)
    .await?;
    let blocks: Vec<serde_json::Value> = sqlx::query_scalar(
        "SELECT to_jsonb(b) FROM design_blocks b WHERE b.design_id = $1 ORDER BY b.display_order",
    )
    .bind(id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(json!({
        "design": design,
        "tags": tags,
        "blocks": blocks,
    })))
}

/// POST /api/designs - Create a design owned by the caller.
pub async fn create_design(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<CreateDesignRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload)?;

    let design: serde_json::Value = sqlx::query_scalar(
        "INSERT INTO designs (user_id, title, description, designer_name, class_year, cover_image_url)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING to_jsonb(designs)",
    )
    .bind(current.id)
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(&payload.designer_name)
    .bind(payload.class_year)
    .bind(&payload.cover_image_url)
    .fetch_one(&state.pool)
    .await?;

    tracing::info!("DESIGN CREATED: User {} ({})", current.username, current.id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Design created successfully!", "design": design })),
    ))
}

/// PUT /api/designs/:id - Ownership-gated partial update.
pub async fn update_design(
    State(state): State<AppState>,
    Extension(owned): Extension<OwnedResource>,
    Json(payload): Json<UpdateDesignRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload)?;

    let design: Option<serde_json::Value> = sqlx::query_scalar(
        "UPDATE designs SET
             title = COALESCE($1, title),
             description = COALESCE($2, description),
             designer_name = COALESCE($3, designer_name),
             class_year = COALESCE($4, class_year),
             cover_image_url = COALESCE($5, cover_image_url),
             updated_at = NOW()
         WHERE id = $6
         RETURNING to_jsonb(designs)",
    )
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(&payload.designer_name)
    .bind(payload.class_year)
    .bind(&payload.cover_image_url)
    .bind(owned.id)
    .fetch_optional(&state.pool)
    .await?;
    let design = super::updated_or_gone(design, "Design")?;

    Ok(Json(json!({ "message": "Design updated successfully!", "design": design })))
}

/// DELETE /api/designs/:id - Ownership-gated; tags, blocks, and block media
/// cascade with it.
pub async fn delete_design(
    State(state): State<AppState>,
    Extension(owned): Extension<OwnedResource>,
) -> Result<impl IntoResponse, ApiError> {
    sqlx::query("DELETE FROM designs WHERE id = $1")
        .bind(owned.id)
        .execute(&state.pool)
        .await?;

    Ok(Json(json!({ "message": "Design deleted successfully!" })))
}

pub(crate) fn parse_id(raw: &str) -> Result<i64, ApiError> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::validation_failed(vec![FieldError {
            field: "id".to_string(),
            message: "id must be a positive integer!".to_string(),
        }])),
    }
}
