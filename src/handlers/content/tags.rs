use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::error::ApiError;
use crate::middleware::OwnedResource;
use crate::state::AppState;
use crate::validation::validate_payload;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTagRequest {
    #[validate(length(min = 1, max = 50, message = "name must be 1-50 characters long!"))]
    pub name: String,

    #[validate(length(max = 500, message = "description must be at most 500 characters long!"))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTagRequest {
    #[validate(length(min = 1, max = 50, message = "name must be 1-50 characters long!"))]
    pub name: Option<String>,

    #[validate(length(max = 500, message = "description must be at most 500 characters long!"))]
    pub description: Option<String>,
}

/// Lowercased name with every non-alphanumeric run collapsed to one hyphen.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_hyphen = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// POST /api/designs/:id/tags - Add a tag to an owned design.
pub async fn create_tag(
    State(state): State<AppState>,
    Extension(owned): Extension<OwnedResource>,
    Json(payload): Json<CreateTagRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload)?;

    let tag: serde_json::Value = sqlx::query_scalar(
        "INSERT INTO design_tags (design_id, name, slug, description)
         VALUES ($1, $2, $3, $4)
         RETURNING to_jsonb(design_tags)",
    )
    .bind(owned.id)
    .bind(&payload.name)
    .bind(slugify(&payload.name))
    .bind(&payload.description)
    .fetch_one(&state.pool)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Tag created successfully!", "tag": tag })),
    ))
}

/// PUT /api/tags/:id - Ownership-gated (through the parent design).
pub async fn update_tag(
    State(state): State<AppState>,
    Extension(owned): Extension<OwnedResource>,
    Json(payload): Json<UpdateTagRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload)?;

    let slug = payload.name.as_deref().map(slugify);
    let tag: Option<serde_json::Value> = sqlx::query_scalar(
        "UPDATE design_tags SET
             name = COALESCE($1, name),
             slug = COALESCE($2, slug),
             description = COALESCE($3, description)
         WHERE id = $4
         RETURNING to_jsonb(design_tags)",
    )
    .bind(&payload.name)
    .bind(&slug)
    .bind(&payload.description)
    .bind(owned.id)
    .fetch_optional(&state.pool)
    .await?;
    let tag = super::updated_or_gone(tag, "Design tag")?;

    Ok(Json(json!({ "message": "Tag updated successfully!", "tag": tag })))
}

/// DELETE /api/tags/:id - Ownership-gated (through the parent design).
pub async fn delete_tag(
    State(state): State<AppState>,
    Extension(owned): Extension<OwnedResource>,
) -> Result<impl IntoResponse, ApiError> {
    sqlx::query("DELETE FROM design_tags WHERE id = $1")
        .bind(owned.id)
        .execute(&state.pool)
        .await?;

    Ok(Json(json!({ "message": "Tag deleted successfully!" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_and_trims() {
        assert_eq!(slugify("Stage Design"), "stage-design");
        assert_eq!(slugify("  Lots -- of?? gaps  "), "lots-of-gaps");
        assert_eq!(slugify("Already-Fine"), "already-fine");
    }
}
