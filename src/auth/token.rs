use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::Role;

/// Reset tokens live for one hour regardless of the access token TTL.
const RESET_TOKEN_TTL_HOURS: i64 = 1;

/// Identity claims embedded in a bearer token. Immutable once issued and
/// request-scoped; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Owning user id.
    pub sub: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
    /// Discriminator present only on special-purpose tokens. Access tokens
    /// carry no `type` field at all.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<TokenType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenType {
    #[serde(rename = "password_reset")]
    PasswordReset,
}

/// Token verification outcome, expressed as an explicit enum rather than
/// introspecting error names. `Expired`, `Invalid` and `NotYetValid` are
/// client errors; `Verification` covers signing-key misconfiguration and
/// anything else unexpected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,

    #[error("Token not active yet")]
    NotYetValid,

    #[error("Wrong token type")]
    WrongType,

    #[error("Token verification failed: {0}")]
    Verification(String),
}

/// Issues and verifies signed, time-limited bearer tokens.
///
/// Stateless: verification needs only the signing secret, no store round-trip.
/// There is no revocation list; expiry is the only deactivation mechanism, and
/// rotating the secret invalidates every previously issued token.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, access_ttl_hours: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl: Duration::hours(access_ttl_hours as i64),
        }
    }

    /// Issue a standard access token for the given identity.
    pub fn issue_access(
        &self,
        sub: i64,
        username: &str,
        email: &str,
        role: Role,
    ) -> Result<String, TokenError> {
        self.issue(sub, username, email, role, None, self.access_ttl)
    }

    /// Issue a password-reset token. Carries the `password_reset` type
    /// discriminator and a fixed one-hour TTL.
    pub fn issue_reset(
        &self,
        sub: i64,
        username: &str,
        email: &str,
        role: Role,
    ) -> Result<String, TokenError> {
        self.issue(
            sub,
            username,
            email,
            role,
            Some(TokenType::PasswordReset),
            Duration::hours(RESET_TOKEN_TTL_HOURS),
        )
    }

    pub fn issue(
        &self,
        sub: i64,
        username: &str,
        email: &str,
        role: Role,
        token_type: Option<TokenType>,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub,
            username: username.to_string(),
            email: email.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            token_type,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Verification(e.to_string()))
    }

    /// Verify an access token. Rejects tokens carrying any `type`
    /// discriminator so a reset token can never double as an access credential.
    pub fn verify_access(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.decode(token)?;
        if claims.token_type.is_some() {
            return Err(TokenError::WrongType);
        }
        Ok(claims)
    }

    /// Verify a password-reset token. Requires the `password_reset` type
    /// discriminator; a plain access token is rejected even when otherwise valid.
    pub fn verify_reset(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.decode(token)?;
        if claims.token_type != Some(TokenType::PasswordReset) {
            return Err(TokenError::WrongType);
        }
        Ok(claims)
    }

    fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Zero leeway: expiry is exact, matching the documented token lifecycle.
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::ImmatureSignature => TokenError::NotYetValid,
                ErrorKind::InvalidToken
                | ErrorKind::InvalidSignature
                | ErrorKind::MissingRequiredClaim(_)
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => TokenError::Invalid,
                _ => TokenError::Verification(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("unit-test-secret-at-least-this-long", 24)
    }

    #[test]
    fn access_token_round_trips_claims() {
        let svc = service();
        let token = svc
            .issue_access(42, "alice", "alice@x.com", Role::Viewer)
            .unwrap();

        let claims = svc.verify_access(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.email, "alice@x.com");
        assert_eq!(claims.role, Role::Viewer);
        assert!(claims.exp > claims.iat);
        assert_eq!(claims.token_type, None);
    }

    #[test]
    fn expired_token_fails_with_expired() {
        let svc = service();
        let token = svc
            .issue(
                1,
                "bob",
                "bob@x.com",
                Role::Designer,
                None,
                Duration::seconds(-5),
            )
            .unwrap();

        assert_eq!(svc.verify_access(&token), Err(TokenError::Expired));
    }

    #[test]
    fn garbage_token_fails_with_invalid() {
        let svc = service();
        assert_eq!(
            svc.verify_access("not.a.token"),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn signature_from_other_secret_is_invalid() {
        let svc = service();
        let other = TokenService::new("a-completely-different-secret-value", 24);
        let token = other
            .issue_access(7, "mallory", "m@x.com", Role::Viewer)
            .unwrap();

        assert_eq!(svc.verify_access(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn reset_token_rejected_as_access_credential() {
        let svc = service();
        let reset = svc
            .issue_reset(9, "carol", "carol@x.com", Role::Designer)
            .unwrap();

        assert_eq!(svc.verify_access(&reset), Err(TokenError::WrongType));
        assert!(svc.verify_reset(&reset).is_ok());
    }

    #[test]
    fn access_token_rejected_in_reset_flow() {
        let svc = service();
        let access = svc
            .issue_access(9, "carol", "carol@x.com", Role::Designer)
            .unwrap();

        assert_eq!(svc.verify_reset(&access), Err(TokenError::WrongType));
    }
}
