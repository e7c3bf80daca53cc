use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::auth::Role;

/// Row in the `users` table. The password hash never leaves the server;
/// responses go through `PublicUser`.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The schema constrains `role` to known values; anything unexpected is
    /// treated as the least-privileged role.
    pub fn role(&self) -> Role {
        Role::parse(&self.role).unwrap_or(Role::Viewer)
    }

    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            is_admin: None,
        }
    }

    pub fn to_public_with_admin(&self, is_admin: bool) -> PublicUser {
        let mut public = self.to_public();
        public.is_admin = Some(is_admin);
        public
    }
}

/// Client-facing projection of a user record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Present only on admin endpoints, where the allow-list status matters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
}
