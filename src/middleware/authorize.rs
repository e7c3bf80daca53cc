use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::Role;
use crate::error::ApiError;
use crate::middleware::auth::CurrentUser;
use crate::state::AppState;

/// Role authorization gate. Requires an identity already attached by
/// `require_auth`; an absent identity indicates a wiring bug but still
/// degrades gracefully to 401.
///
/// Used through a closure so routes declare their allowed set inline:
/// `middleware::from_fn(|req, next| require_role(&[Role::Designer], req, next))`
pub async fn require_role(
    allowed: &'static [Role],
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = match request.extensions().get::<CurrentUser>() {
        Some(user) => user,
        None => return Err(ApiError::unauthorized("Authentication required!")),
    };

    if !allowed.contains(&user.role) {
        let required: Vec<String> = allowed.iter().map(|r| r.as_str().to_string()).collect();
        tracing::warn!(
            "AUTHORIZATION FAILED: User {} ({}) role: {}, required {}",
            user.username,
            user.id,
            user.role,
            required.join(" or ")
        );
        return Err(ApiError::role_forbidden(user.role.as_str(), required));
    }

    Ok(next.run(request).await)
}

/// Admin authorization gate. Administrator status is not a stored role; it is
/// a membership test of the identity's email against the configured allow-list,
/// so a designer or viewer can simultaneously be an admin.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = match request.extensions().get::<CurrentUser>() {
        Some(user) => user,
        None => return Err(ApiError::unauthorized("Authentication required!")),
    };

    if !state.config.security.is_admin(&user.email) {
        tracing::warn!(
            "ADMIN ACCESS DENIED: User {} ({}) attempted admin access",
            user.username,
            user.email
        );
        return Err(ApiError::forbidden_with_code(
            "Admin access denied!",
            "ADMIN_ACCESS_DENIED",
        ));
    }

    tracing::info!(
        "ADMIN ACCESS GRANTED: User {} ({}) accessed admin function",
        user.username,
        user.email
    );
    Ok(next.run(request).await)
}
