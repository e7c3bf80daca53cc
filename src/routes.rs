use axum::{
    extract::{Path, Request, State},
    http::HeaderValue,
    middleware::{self, Next},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::auth::Role;
use crate::config::Environment;
use crate::handlers::{auth, content, health, users};
use crate::middleware::rate_limit::{
    self, API_LIMIT_MESSAGE, AUTH_LIMIT_MESSAGE, REGISTER_LIMIT_MESSAGE,
};
use crate::middleware::{
    optional_auth, require_admin, require_auth, require_ownership, require_role, ResourceKind,
};
use crate::middleware::security::apply_security_headers;
use crate::state::AppState;

const DESIGNER_ONLY: &[Role] = &[Role::Designer];
const ANY_ROLE: &[Role] = &[Role::Designer, Role::Viewer];

/// Build the full application router.
///
/// Gate order per route group, outermost first: rate limit, authentication,
/// role, admin/ownership, handler. Groups are built separately and merged so
/// each carries exactly the gates it needs; axum keeps method routers intact
/// across the merge, so a public GET and a gated PUT can share a path.
pub fn app(state: AppState) -> Router {
    let router = public_routes()
        .merge(auth_routes(&state))
        .merge(user_routes(&state))
        .merge(admin_routes(&state))
        .merge(content_routes(&state));

    let router = if state.config.api.enable_rate_limiting {
        rate_limit::limit_routes(
            router,
            state.config.api.api_rate_limit,
            state.config.api.api_rate_window_secs,
            API_LIMIT_MESSAGE,
        )
    } else {
        router
    };

    let router = apply_security_headers(router)
        .layer(cors_layer(&state))
        .layer(RequestBodyLimitLayer::new(
            state.config.api.max_request_size_bytes,
        ));

    let router = if state.config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    router.with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/api/designs", get(content::designs::list_designs))
        .route("/api/designs/:id", get(content::designs::get_design))
}

fn auth_routes(state: &AppState) -> Router<AppState> {
    let register = Router::new().route("/api/auth/register", post(auth::register));
    let register = maybe_limit(
        state,
        register,
        state.config.api.register_rate_limit,
        state.config.api.register_rate_window_secs,
        REGISTER_LIMIT_MESSAGE,
    );

    let credentials = Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/forgot-password", post(auth::forgot_password))
        .route("/api/auth/reset-password", post(auth::reset_password));
    let credentials = maybe_limit(
        state,
        credentials,
        state.config.api.auth_rate_limit,
        state.config.api.auth_rate_window_secs,
        AUTH_LIMIT_MESSAGE,
    );

    let logout = Router::new()
        .route("/api/auth/logout", post(auth::logout))
        .layer(middleware::from_fn_with_state(state.clone(), optional_auth));

    let session = Router::new()
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/verify", get(auth::verify))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    register.merge(credentials).merge(logout).merge(session)
}

fn user_routes(state: &AppState) -> Router<AppState> {
    let profile = Router::new()
        .route(
            "/api/users/profile",
            get(users::get_profile).put(users::update_profile),
        )
        .route("/api/users/account", delete(users::delete_account))
        .layer(middleware::from_fn(|request: Request, next: Next| {
            require_role(ANY_ROLE, request, next)
        }))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // Password changes share the credential throttle with login.
    let password = Router::new()
        .route("/api/users/change-password", put(users::change_password))
        .layer(middleware::from_fn(|request: Request, next: Next| {
            require_role(ANY_ROLE, request, next)
        }))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));
    let password = maybe_limit(
        state,
        password,
        state.config.api.auth_rate_limit,
        state.config.api.auth_rate_window_secs,
        AUTH_LIMIT_MESSAGE,
    );

    profile.merge(password)
}

fn admin_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/users", get(users::list_users))
        .route("/api/users/stats", get(users::user_stats))
        .route("/api/users/:id", get(users::get_user))
        .route("/api/users/:id/role", put(users::update_role))
        .layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

fn content_routes(state: &AppState) -> Router<AppState> {
    // Creation under a parent the caller must own goes through the parent's
    // ownership gate; direct creation needs only the designer role.
    let create = Router::new()
        .route("/api/designs", post(content::designs::create_design))
        .route("/api/media", post(content::media::create_media))
        .layer(middleware::from_fn(|request: Request, next: Next| {
            require_role(DESIGNER_ONLY, request, next)
        }))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let comments = Router::new()
        .route(
            "/api/designs/:id/comments",
            post(content::comments::create_comment),
        )
        .layer(middleware::from_fn(|request: Request, next: Next| {
            require_role(ANY_ROLE, request, next)
        }))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let design_owned = Router::new()
        .route(
            "/api/designs/:id",
            put(content::designs::update_design).delete(content::designs::delete_design),
        )
        .route("/api/designs/:id/tags", post(content::tags::create_tag))
        .route("/api/designs/:id/blocks", post(content::blocks::create_block))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            |s: State<AppState>, p: Path<String>, request: Request, next: Next| {
                require_ownership(ResourceKind::Design, s, p, request, next)
            },
        ))
        .layer(middleware::from_fn(|request: Request, next: Next| {
            require_role(DESIGNER_ONLY, request, next)
        }))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let tag_owned = Router::new()
        .route(
            "/api/tags/:id",
            put(content::tags::update_tag).delete(content::tags::delete_tag),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            |s: State<AppState>, p: Path<String>, request: Request, next: Next| {
                require_ownership(ResourceKind::DesignTag, s, p, request, next)
            },
        ))
        .layer(middleware::from_fn(|request: Request, next: Next| {
            require_role(DESIGNER_ONLY, request, next)
        }))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let block_owned = Router::new()
        .route(
            "/api/blocks/:id",
            put(content::blocks::update_block).delete(content::blocks::delete_block),
        )
        .route("/api/blocks/:id/media", post(content::media::attach_media))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            |s: State<AppState>, p: Path<String>, request: Request, next: Next| {
                require_ownership(ResourceKind::DesignBlock, s, p, request, next)
            },
        ))
        .layer(middleware::from_fn(|request: Request, next: Next| {
            require_role(DESIGNER_ONLY, request, next)
        }))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let media_owned = Router::new()
        .route(
            "/api/media/:id",
            put(content::media::update_media).delete(content::media::delete_media),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            |s: State<AppState>, p: Path<String>, request: Request, next: Next| {
                require_ownership(ResourceKind::Media, s, p, request, next)
            },
        ))
        .layer(middleware::from_fn(|request: Request, next: Next| {
            require_role(DESIGNER_ONLY, request, next)
        }))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let block_media_owned = Router::new()
        .route("/api/block-media/:id", delete(content::media::detach_media))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            |s: State<AppState>, p: Path<String>, request: Request, next: Next| {
                require_ownership(ResourceKind::BlockMedia, s, p, request, next)
            },
        ))
        .layer(middleware::from_fn(|request: Request, next: Next| {
            require_role(DESIGNER_ONLY, request, next)
        }))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // Viewers may edit and remove their own comments.
    let comment_owned = Router::new()
        .route(
            "/api/comments/:id",
            put(content::comments::update_comment).delete(content::comments::delete_comment),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            |s: State<AppState>, p: Path<String>, request: Request, next: Next| {
                require_ownership(ResourceKind::Comment, s, p, request, next)
            },
        ))
        .layer(middleware::from_fn(|request: Request, next: Next| {
            require_role(ANY_ROLE, request, next)
        }))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    create
        .merge(comments)
        .merge(design_owned)
        .merge(tag_owned)
        .merge(block_owned)
        .merge(media_owned)
        .merge(block_media_owned)
        .merge(comment_owned)
}

fn maybe_limit(
    state: &AppState,
    router: Router<AppState>,
    burst: u32,
    window_secs: u64,
    message: &'static str,
) -> Router<AppState> {
    if state.config.api.enable_rate_limiting {
        rate_limit::limit_routes(router, burst, window_secs, message)
    } else {
        router
    }
}

fn cors_layer(state: &AppState) -> CorsLayer {
    if state.config.environment == Environment::Development {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = state
        .config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
