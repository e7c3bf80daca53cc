pub mod auth;
pub mod authorize;
pub mod ownership;
pub mod rate_limit;
pub mod security;

pub use auth::{optional_auth, require_auth, CurrentUser};
pub use authorize::{require_admin, require_role};
pub use ownership::{require_ownership, OwnedResource, ResourceKind};
