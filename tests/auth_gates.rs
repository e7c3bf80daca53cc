mod common;

use axum::http::StatusCode;
use chrono::Duration;
use design_hub_api::auth::Role;

use common::{body_json, dispatch, get, get_with_token, send_json, test_app, test_state};

#[tokio::test]
async fn verify_without_token_is_401() {
    let state = test_state();
    let response = dispatch(test_app(&state), get("/api/auth/verify")).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Access denied! No authentication token provided!");
    assert!(body.get("code").is_none());
}

#[tokio::test]
async fn malformed_authorization_header_is_treated_as_missing() {
    let state = test_state();
    let request = axum::http::Request::builder()
        .method("GET")
        .uri("/api/auth/verify")
        .header("authorization", "Token abc123")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = dispatch(test_app(&state), request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Access denied! No authentication token provided!");
}

#[tokio::test]
async fn garbage_token_is_401_invalid_token() {
    let state = test_state();
    let response = dispatch(
        test_app(&state),
        get_with_token("/api/auth/verify", "not.a.jwt"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn expired_token_is_401_token_expired() {
    let state = test_state();
    let token = state
        .tokens
        .issue(7, "nia", "nia@example.com", Role::Designer, None, Duration::hours(-1))
        .unwrap();

    let response = dispatch(test_app(&state), get_with_token("/api/auth/verify", &token)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], "TOKEN_EXPIRED");
    assert_eq!(body["error"], "Token expired! Please login again!");
}

#[tokio::test]
async fn reset_token_cannot_be_used_as_access_token() {
    let state = test_state();
    let token = state
        .tokens
        .issue_reset(7, "nia", "nia@example.com", Role::Designer)
        .unwrap();

    let response = dispatch(test_app(&state), get_with_token("/api/auth/verify", &token)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn valid_token_passes_and_identity_is_echoed() {
    let state = test_state();
    let token = state
        .tokens
        .issue_access(7, "nia", "nia@example.com", Role::Designer)
        .unwrap();

    let response = dispatch(test_app(&state), get_with_token("/api/auth/verify", &token)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Token is valid!");
    assert_eq!(body["user"]["id"], 7);
    assert_eq!(body["user"]["username"], "nia");
    assert_eq!(body["user"]["role"], "designer");
}

#[tokio::test]
async fn refresh_returns_a_fresh_token() {
    let state = test_state();
    let token = state
        .tokens
        .issue_access(7, "nia", "nia@example.com", Role::Viewer)
        .unwrap();

    let response = dispatch(
        test_app(&state),
        send_json("POST", "/api/auth/refresh", Some(&token), serde_json::json!({})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Token refreshed successfully!");
    let refreshed = body["token"].as_str().unwrap();
    assert!(state.tokens.verify_access(refreshed).is_ok());
}

#[tokio::test]
async fn logout_works_with_and_without_a_token() {
    let state = test_state();

    let response = dispatch(
        test_app(&state),
        send_json("POST", "/api/auth/logout", None, serde_json::json!({})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "Logout successfully!");

    // An expired token does not block logout either; the auth here is the
    // non-blocking variant.
    let expired = state
        .tokens
        .issue(7, "nia", "nia@example.com", Role::Viewer, None, Duration::hours(-1))
        .unwrap();
    let response = dispatch(
        test_app(&state),
        send_json("POST", "/api/auth/logout", Some(&expired), serde_json::json!({})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

/// In-memory sink so a test can read back what the subscriber wrote.
struct LogSink(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn captured_logs() -> (
    std::sync::Arc<std::sync::Mutex<Vec<u8>>>,
    tracing::subscriber::DefaultGuard,
) {
    let buffer = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || LogSink(sink.clone()))
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (buffer, guard)
}

#[tokio::test]
async fn bad_token_on_logout_is_still_audited() {
    let state = test_state();
    let (buffer, _guard) = captured_logs();

    let expired = state
        .tokens
        .issue(7, "nia", "nia@example.com", Role::Viewer, None, Duration::hours(-1))
        .unwrap();
    let response = dispatch(
        test_app(&state),
        send_json("POST", "/api/auth/logout", Some(&expired), serde_json::json!({})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let logs = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
    assert!(logs.contains("AUTH FAILED"), "missing audit line in: {logs}");
    assert!(logs.contains("continuing unauthenticated"));
    assert!(logs.contains("/api/auth/logout"));
}

#[tokio::test]
async fn valid_token_on_logout_is_audited_with_identity() {
    let state = test_state();
    let (buffer, _guard) = captured_logs();

    let token = state
        .tokens
        .issue_access(7, "nia", "nia@example.com", Role::Viewer)
        .unwrap();
    let response = dispatch(
        test_app(&state),
        send_json("POST", "/api/auth/logout", Some(&token), serde_json::json!({})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let logs = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
    assert!(logs.contains("AUTH SUCCESS: User nia (7)"), "missing audit line in: {logs}");
    assert!(logs.contains("POST /api/auth/logout"));
}

#[tokio::test]
async fn root_banner_and_security_headers() {
    let state = test_state();
    let response = dispatch(test_app(&state), get("/")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");

    let body = body_json(response).await;
    assert_eq!(body["name"], "Design Hub API");
}

#[tokio::test]
async fn health_reports_unhealthy_when_database_is_unreachable() {
    let state = test_state();
    let response = dispatch(test_app(&state), get("/health")).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["database"], "disconnected");
}
