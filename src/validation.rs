use validator::{Validate, ValidationError};

use crate::error::{ApiError, FieldError};

/// Run derive-based validation on a request payload and convert failures into
/// the API's 400 response shape.
pub fn validate_payload<T: Validate>(payload: &T) -> Result<(), ApiError> {
    let errors = match payload.validate() {
        Ok(()) => return Ok(()),
        Err(errors) => errors,
    };

    let mut details = Vec::new();
    for (field, field_errors) in errors.field_errors() {
        for error in field_errors {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("{} is invalid!", field));
            details.push(FieldError {
                field: field.to_string(),
                message,
            });
        }
    }

    tracing::warn!("VALIDATION ERROR: {} field(s) rejected", details.len());
    Err(ApiError::validation_failed(details))
}

/// Usernames: letters, numbers, underscore, and hyphen only.
pub fn username_chars(username: &str) -> Result<(), ValidationError> {
    if username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        Ok(())
    } else {
        Err(ValidationError::new("username_chars"))
    }
}

/// Full password complexity: lowercase, uppercase, digit, and one of the
/// permitted special characters.
pub fn password_strength(password: &str) -> Result<(), ValidationError> {
    const SPECIALS: &str = "@$!%*?&";

    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| SPECIALS.contains(c));

    if has_lower && has_upper && has_digit && has_special {
        Ok(())
    } else {
        Err(ValidationError::new("password_strength"))
    }
}

/// Roles arrive as plain strings so invalid values produce a 400 validation
/// failure rather than a body-deserialization rejection.
pub fn known_role(role: &str) -> Result<(), ValidationError> {
    match crate::auth::Role::parse(role) {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("known_role")),
    }
}

pub fn known_media_type(media_type: &str) -> Result<(), ValidationError> {
    const MEDIA_TYPES: &[&str] = &["design_image", "video", "icon", "backstage_photo", "map_dot"];

    if MEDIA_TYPES.contains(&media_type) {
        Ok(())
    } else {
        Err(ValidationError::new("known_media_type"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_chars_accepts_word_characters() {
        assert!(username_chars("alice_01-x").is_ok());
        assert!(username_chars("bad name").is_err());
        assert!(username_chars("no@sign").is_err());
    }

    #[test]
    fn password_strength_requires_all_classes() {
        assert!(password_strength("Str0ng!Pass").is_ok());
        assert!(password_strength("alllowercase1!").is_err());
        assert!(password_strength("NoDigits!!").is_err());
        assert!(password_strength("NoSpecial123").is_err());
    }

    #[test]
    fn only_designer_and_viewer_are_roles() {
        assert!(known_role("designer").is_ok());
        assert!(known_role("viewer").is_ok());
        assert!(known_role("admin").is_err());
    }

    #[test]
    fn media_type_must_be_known() {
        assert!(known_media_type("design_image").is_ok());
        assert!(known_media_type("map_dot").is_ok());
        assert!(known_media_type("gif").is_err());
    }
}
