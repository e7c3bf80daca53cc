use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::{Postgres, QueryBuilder};

use crate::auth::Role;
use crate::database::models::User;
use crate::error::{ApiError, FieldError};
use crate::middleware::CurrentUser;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub role: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}

fn parse_user_id(raw: &str) -> Result<i64, ApiError> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::validation_failed(vec![FieldError {
            field: "id".to_string(),
            message: "id must be a positive integer!".to_string(),
        }])),
    }
}

/// GET /api/users - Paginated listing with role and search filters.
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1) * limit;

    let role_filter = match &query.role {
        Some(raw) => Some(
            Role::parse(raw)
                .ok_or_else(|| {
                    ApiError::validation_failed(vec![FieldError {
                        field: "role".to_string(),
                        message: "role must be either designer or viewer!".to_string(),
                    }])
                })?
                .as_str(),
        ),
        None => None,
    };
    let search_filter = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s));

    let mut count_query: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT COUNT(*) FROM users WHERE TRUE");
    let mut list_query: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT * FROM users WHERE TRUE");

    for builder in [&mut count_query, &mut list_query] {
        if let Some(role) = role_filter {
            builder.push(" AND role = ").push_bind(role);
        }
        if let Some(pattern) = &search_filter {
            builder
                .push(" AND (username ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR email ILIKE ")
                .push_bind(pattern.clone())
                .push(")");
        }
    }
    list_query
        .push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    let total_count: i64 = count_query
        .build_query_scalar()
        .fetch_one(&state.pool)
        .await?;
    let users: Vec<User> = list_query
        .build_query_as()
        .fetch_all(&state.pool)
        .await?;

    let total_pages = (total_count + limit - 1) / limit;
    let users: Vec<_> = users
        .iter()
        .map(|u| u.to_public_with_admin(state.config.security.is_admin(&u.email)))
        .collect();

    Ok(Json(json!({
        "users": users,
        "pagination": {
            "currentPage": page,
            "totalPages": total_pages,
            "totalCount": total_count,
            "limit": limit,
            "hasNextPage": page < total_pages,
            "hasPrevPage": page > 1,
        },
        "filters": {
            "role": query.role,
            "search": query.search,
        },
    })))
}

/// GET /api/users/stats - Aggregate account counts.
pub async fn user_stats(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let (total_users, designers, viewers, new_30d, new_7d): (i64, i64, i64, i64, i64) =
        sqlx::query_as(
            "SELECT COUNT(*),
                    COUNT(*) FILTER (WHERE role = 'designer'),
                    COUNT(*) FILTER (WHERE role = 'viewer'),
                    COUNT(*) FILTER (WHERE created_at > NOW() - INTERVAL '30 days'),
                    COUNT(*) FILTER (WHERE created_at > NOW() - INTERVAL '7 days')
             FROM users",
        )
        .fetch_one(&state.pool)
        .await?;

    Ok(Json(json!({
        "stats": {
            "totalUsers": total_users,
            "designers": designers,
            "viewers": viewers,
            "newUsers30Days": new_30d,
            "newUsers7Days": new_7d,
        }
    })))
}

/// GET /api/users/:id - Single user, with allow-list status.
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_user_id(&id)?;

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let user = user.ok_or_else(|| ApiError::not_found("User not found!"))?;

    let is_admin = state.config.security.is_admin(&user.email);
    Ok(Json(json!({ "user": user.to_public_with_admin(is_admin) })))
}

/// PUT /api/users/:id/role - Change a user's stored role.
///
/// Accounts on the admin allow-list are off limits; their privilege comes
/// from configuration, and demoting the stored role would only mask that.
pub async fn update_role(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_user_id(&id)?;

    let role = Role::parse(&payload.role).ok_or_else(|| {
        ApiError::validation_failed(vec![FieldError {
            field: "role".to_string(),
            message: "role must be either designer or viewer!".to_string(),
        }])
    })?;

    let target: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let target = target.ok_or_else(|| ApiError::not_found("User not found!"))?;

    if state.config.security.is_admin(&target.email) {
        tracing::warn!(
            "ROLE CHANGE BLOCKED: User {} ({}) tried to change admin user {} ({})",
            current.username,
            current.id,
            target.username,
            target.id
        );
        return Err(ApiError::forbidden("Cannot change admin user role!"));
    }

    let updated: Option<User> = sqlx::query_as(
        "UPDATE users SET role = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
    )
    .bind(role.as_str())
    .bind(target.id)
    .fetch_optional(&state.pool)
    .await?;
    // The target can be deleted between the lookup and the update.
    let updated = updated.ok_or_else(|| ApiError::not_found("User not found!"))?;

    tracing::info!(
        "ROLE UPDATED: User {} ({}) set role of user {} ({}) to {}",
        current.username,
        current.id,
        updated.username,
        updated.id,
        role
    );

    Ok(Json(json!({
        "message": "User role updated successfully!",
        "user": updated.to_public_with_admin(false),
    })))
}
