pub mod blocks;
pub mod comments;
pub mod designs;
pub mod media;
pub mod tags;

use crate::error::ApiError;

/// Unwraps the row an `UPDATE ... RETURNING` gave back. The ownership gate
/// saw the row, but it can be deleted before the update lands; an empty
/// result is a 404, not a server error.
pub(crate) fn updated_or_gone(
    row: Option<serde_json::Value>,
    what: &str,
) -> Result<serde_json::Value, ApiError> {
    row.ok_or_else(|| {
        ApiError::not_found(format!("{} not found or you don't have access to it!", what))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn update_hitting_a_vanished_row_is_not_found() {
        let err = updated_or_gone(None, "Design").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            err.to_json()["error"],
            "Design not found or you don't have access to it!"
        );
    }

    #[test]
    fn update_returning_a_row_passes_it_through() {
        let row = serde_json::json!({ "id": 4, "title": "Facade study" });
        assert_eq!(updated_or_gone(Some(row.clone()), "Design").unwrap(), row);
    }
}
