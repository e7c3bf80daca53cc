use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};
use sqlx::Row;

use crate::error::{ApiError, FieldError};
use crate::middleware::auth::CurrentUser;
use crate::state::AppState;

/// The closed set of resource kinds whose routes are ownership-gated.
///
/// Each kind carries its own owner-resolution query: the owning user id is a
/// column on the resource itself, or is reached through one or two join hops
/// up to the parent design. Adding a kind means adding a variant here, never
/// editing shared branch logic; unrecognized kinds are unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Design,
    DesignTag,
    DesignBlock,
    Media,
    BlockMedia,
    Comment,
}

impl ResourceKind {
    pub fn table(&self) -> &'static str {
        match self {
            ResourceKind::Design => "designs",
            ResourceKind::DesignTag => "design_tags",
            ResourceKind::DesignBlock => "design_blocks",
            ResourceKind::Media => "media",
            ResourceKind::BlockMedia => "block_media",
            ResourceKind::Comment => "comments",
        }
    }

    /// Human-readable name used in not-found messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            ResourceKind::Design => "Design",
            ResourceKind::DesignTag => "Design tag",
            ResourceKind::DesignBlock => "Design block",
            ResourceKind::Media => "Media",
            ResourceKind::BlockMedia => "Block media",
            ResourceKind::Comment => "Comment",
        }
    }

    /// Owner-resolution lookup table. Selects the full row (for reuse by the
    /// controller) plus the resolved owning user id.
    ///
    /// Direct-owned kinds read `user_id` off the row; one-hop kinds join to
    /// the parent design; `block_media` joins through `design_blocks`.
    pub fn owner_query(&self) -> &'static str {
        match self {
            ResourceKind::Design => {
                "SELECT to_jsonb(d) AS resource, d.user_id AS owner_id \
                 FROM designs d WHERE d.id = $1"
            }
            ResourceKind::Media => {
                "SELECT to_jsonb(m) AS resource, m.user_id AS owner_id \
                 FROM media m WHERE m.id = $1"
            }
            ResourceKind::Comment => {
                "SELECT to_jsonb(c) AS resource, c.user_id AS owner_id \
                 FROM comments c WHERE c.id = $1"
            }
            ResourceKind::DesignTag => {
                "SELECT to_jsonb(dt) AS resource, d.user_id AS owner_id \
                 FROM design_tags dt \
                 JOIN designs d ON dt.design_id = d.id \
                 WHERE dt.id = $1"
            }
            ResourceKind::DesignBlock => {
                "SELECT to_jsonb(b) AS resource, d.user_id AS owner_id \
                 FROM design_blocks b \
                 JOIN designs d ON b.design_id = d.id \
                 WHERE b.id = $1"
            }
            ResourceKind::BlockMedia => {
                "SELECT to_jsonb(bm) AS resource, d.user_id AS owner_id \
                 FROM block_media bm \
                 JOIN design_blocks b ON bm.design_block_id = b.id \
                 JOIN designs d ON b.design_id = d.id \
                 WHERE bm.id = $1"
            }
        }
    }
}

/// The resolved resource, attached to request extensions on success so the
/// controller can reuse the row instead of performing a second lookup.
#[derive(Debug, Clone)]
pub struct OwnedResource {
    pub kind: ResourceKind,
    pub id: i64,
    pub owner_id: i64,
    pub row: serde_json::Value,
}

/// Ownership resolution gate for routes carrying a `:id` path parameter.
///
/// A missing row is 404; a row owned by another user is 403. The distinction
/// deliberately reveals resource existence; preserved as designed.
pub async fn require_ownership(
    kind: ResourceKind,
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<CurrentUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("Authentication required!"))?;

    let resource_id = parse_resource_id(&id)?;

    let row = sqlx::query(kind.owner_query())
        .bind(resource_id)
        .fetch_optional(&state.pool)
        .await
        .map_err(|e| {
            tracing::error!(
                "Ownership check failed: {} {} lookup error: {}",
                kind.table(),
                resource_id,
                e
            );
            ApiError::internal("Server error!")
        })?;

    let row = row.map(|r| (r.get("owner_id"), r.get("resource")));
    let owned = resolve_owned(kind, resource_id, user.id, row)?;
    request.extensions_mut().insert(owned);

    Ok(next.run(request).await)
}

/// The 404/403 decision, separated from the store lookup. A missing row is
/// 404; a row owned by someone else is 403; the caller's own row is attached
/// for the controller.
fn resolve_owned(
    kind: ResourceKind,
    resource_id: i64,
    caller_id: i64,
    row: Option<(i64, serde_json::Value)>,
) -> Result<OwnedResource, ApiError> {
    let (owner_id, resource) = row.ok_or_else(|| {
        ApiError::not_found(format!(
            "{} not found or you don't have access to it!",
            kind.display_name()
        ))
    })?;

    if owner_id != caller_id {
        tracing::warn!(
            "OWNERSHIP FAILED: User {} tried to access {} {} owned by {}",
            caller_id,
            kind.table(),
            resource_id,
            owner_id
        );
        return Err(ApiError::forbidden("You can only modify your own content!"));
    }

    Ok(OwnedResource {
        kind,
        id: resource_id,
        owner_id,
        row: resource,
    })
}

fn parse_resource_id(raw: &str) -> Result<i64, ApiError> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::validation_failed(vec![FieldError {
            field: "id".to_string(),
            message: "id must be a positive integer!".to_string(),
        }])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_owned_kinds_read_user_id_off_the_row() {
        for kind in [ResourceKind::Design, ResourceKind::Media, ResourceKind::Comment] {
            let query = kind.owner_query();
            assert!(query.contains("user_id AS owner_id"), "{:?}", kind);
            assert!(!query.contains("JOIN"), "{:?} should not join", kind);
            assert!(query.contains(kind.table()));
        }
    }

    #[test]
    fn one_hop_kinds_join_to_parent_design() {
        for kind in [ResourceKind::DesignTag, ResourceKind::DesignBlock] {
            let query = kind.owner_query();
            assert_eq!(query.matches("JOIN").count(), 1, "{:?}", kind);
            assert!(query.contains("JOIN designs"));
            assert!(query.contains("d.user_id AS owner_id"));
        }
    }

    #[test]
    fn block_media_resolves_through_two_hops() {
        let query = ResourceKind::BlockMedia.owner_query();
        assert_eq!(query.matches("JOIN").count(), 2);
        assert!(query.contains("JOIN design_blocks"));
        assert!(query.contains("JOIN designs"));
    }

    #[test]
    fn missing_row_is_not_found() {
        let err = resolve_owned(ResourceKind::DesignTag, 5, 1, None).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
        assert_eq!(
            err.to_json()["error"],
            "Design tag not found or you don't have access to it!"
        );
    }

    #[test]
    fn foreign_row_is_forbidden() {
        let row = Some((99, serde_json::json!({"id": 5, "user_id": 99})));
        let err = resolve_owned(ResourceKind::Design, 5, 1, row).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
        assert_eq!(
            err.to_json()["error"],
            "You can only modify your own content!"
        );
    }

    #[test]
    fn own_row_is_attached_for_the_controller() {
        let row = Some((1, serde_json::json!({"id": 5, "title": "mine"})));
        let owned = resolve_owned(ResourceKind::Design, 5, 1, row).unwrap();
        assert_eq!(owned.kind, ResourceKind::Design);
        assert_eq!(owned.id, 5);
        assert_eq!(owned.owner_id, 1);
        assert_eq!(owned.row["title"], "mine");
    }

    #[test]
    fn resource_id_must_be_a_positive_integer() {
        assert_eq!(parse_resource_id("17").unwrap(), 17);
        assert!(parse_resource_id("abc").is_err());
        assert!(parse_resource_id("0").is_err());
        assert!(parse_resource_id("-4").is_err());
        assert!(parse_resource_id("1.5").is_err());
    }
}
