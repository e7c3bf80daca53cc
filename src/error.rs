// HTTP API error types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// HTTP API error with appropriate status codes and client-friendly messages.
///
/// Response body shape is `{ "error": string, "code"?: string, "details"?: array }`.
/// The status code conveys the category; `code` is a machine-readable
/// discriminator where clients need to branch (token lifecycle, admin gate).
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationFailed {
        message: String,
        details: Vec<FieldError>,
    },

    // 401 Unauthorized
    Unauthorized {
        message: String,
        code: Option<&'static str>,
    },

    // 403 Forbidden
    Forbidden {
        message: String,
        code: Option<&'static str>,
    },
    /// Role gate rejection. Discloses the caller's role and the required set
    /// for client diagnostics; role names are not secret.
    RoleForbidden {
        user_role: String,
        required_roles: Vec<String>,
    },

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 429 Too Many Requests
    TooManyRequests(String),

    // 500 Internal Server Error
    Internal {
        message: String,
        /// Server-side detail, disclosed only when debug errors are enabled.
        detail: Option<String>,
        code: Option<&'static str>,
    },
}

/// One entry of a validation failure `details` array.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::RoleForbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            ApiError::ValidationFailed { message, details } => json!({
                "error": message,
                "details": details,
            }),
            ApiError::RoleForbidden {
                user_role,
                required_roles,
            } => json!({
                "error": format!("Access denied! Required role: {}", required_roles.join(" or ")),
                "userRole": user_role,
                "requiredRoles": required_roles,
            }),
            ApiError::Unauthorized { message, code } | ApiError::Forbidden { message, code } => {
                match code {
                    Some(code) => json!({ "error": message, "code": code }),
                    None => json!({ "error": message }),
                }
            }
            ApiError::Internal {
                message,
                detail,
                code,
            } => {
                let mut body = json!({ "error": message });
                if let Some(code) = code {
                    body["code"] = json!(code);
                }
                if let Some(detail) = detail {
                    body["details"] = json!([detail]);
                }
                body
            }
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::TooManyRequests(msg) => json!({ "error": msg }),
        }
    }
}

// Static constructors, one per category, mirroring how handlers raise them.
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_failed(details: Vec<FieldError>) -> Self {
        ApiError::ValidationFailed {
            message: "Validation failed!".to_string(),
            details,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized {
            message: message.into(),
            code: None,
        }
    }

    pub fn unauthorized_with_code(message: impl Into<String>, code: &'static str) -> Self {
        ApiError::Unauthorized {
            message: message.into(),
            code: Some(code),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden {
            message: message.into(),
            code: None,
        }
    }

    pub fn forbidden_with_code(message: impl Into<String>, code: &'static str) -> Self {
        ApiError::Forbidden {
            message: message.into(),
            code: Some(code),
        }
    }

    pub fn role_forbidden(user_role: impl Into<String>, required_roles: Vec<String>) -> Self {
        ApiError::RoleForbidden {
            user_role: user_role.into(),
            required_roles,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        ApiError::TooManyRequests(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal {
            message: message.into(),
            detail: None,
            code: None,
        }
    }

    pub fn internal_with_code(message: impl Into<String>, code: &'static str) -> Self {
        ApiError::Internal {
            message: message.into(),
            detail: None,
            code: Some(code),
        }
    }

    /// Maps a unique-constraint violation to a 409 with the given message.
    /// Pre-insert existence checks race with concurrent writers; the database
    /// constraint is the authority. Any other error stays a 500.
    pub fn conflict_on_unique(err: sqlx::Error, message: impl Into<String>) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ApiError::conflict(message)
            }
            _ => err.into(),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        // Never leak SQL detail to clients; the real error goes to the log.
        tracing::error!("Database error: {}", err);
        ApiError::internal("Server error!")
    }
}

impl From<crate::auth::PasswordError> for ApiError {
    fn from(err: crate::auth::PasswordError) -> Self {
        tracing::error!("Password service error: {}", err);
        ApiError::internal("Server error!")
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_forbidden_discloses_roles() {
        let err = ApiError::role_forbidden("viewer", vec!["designer".to_string()]);
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        let body = err.to_json();
        assert_eq!(body["userRole"], "viewer");
        assert_eq!(body["requiredRoles"], json!(["designer"]));
    }

    #[test]
    fn unauthorized_carries_machine_code() {
        let err = ApiError::unauthorized_with_code("Token expired! Please login again!", "TOKEN_EXPIRED");
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_json()["code"], "TOKEN_EXPIRED");
    }

    #[test]
    fn validation_failure_lists_fields() {
        let err = ApiError::validation_failed(vec![FieldError {
            field: "username".to_string(),
            message: "Username must be 3-50 characters long!".to_string(),
        }]);
        let body = err.to_json();
        assert_eq!(body["error"], "Validation failed!");
        assert_eq!(body["details"][0]["field"], "username");
    }

    #[derive(Debug)]
    struct FakeDbError {
        unique: bool,
        constraint: Option<&'static str>,
    }

    impl std::fmt::Display for FakeDbError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "duplicate key value violates unique constraint")
        }
    }

    impl std::error::Error for FakeDbError {}

    impl sqlx::error::DatabaseError for FakeDbError {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            if self.unique {
                sqlx::error::ErrorKind::UniqueViolation
            } else {
                sqlx::error::ErrorKind::Other
            }
        }

        fn constraint(&self) -> Option<&str> {
            self.constraint
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }
    }

    fn db_error(unique: bool, constraint: Option<&'static str>) -> sqlx::Error {
        sqlx::Error::Database(Box::new(FakeDbError { unique, constraint }))
    }

    #[test]
    fn unique_violation_becomes_conflict() {
        let err = ApiError::conflict_on_unique(
            db_error(true, Some("users_email_key")),
            "User already existing with this email or username!",
        );
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            err.to_json()["error"],
            "User already existing with this email or username!"
        );
    }

    #[test]
    fn other_database_errors_stay_server_errors() {
        let err = ApiError::conflict_on_unique(
            db_error(false, None),
            "User already existing with this email or username!",
        );
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_json()["error"], "Server error!");

        let err: ApiError = ApiError::conflict_on_unique(
            sqlx::Error::RowNotFound,
            "User already existing with this email or username!",
        );
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
