use serde::{Deserialize, Serialize};

pub mod password;
pub mod token;

pub use password::{PasswordError, PasswordService};
pub use token::{Claims, TokenError, TokenService, TokenType};

/// Stored user role. Administrator status is deliberately not a role value;
/// it is derived from the configured email allow-list (see `SecurityConfig`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Designer,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Designer => "designer",
            Role::Viewer => "viewer",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "designer" => Some(Role::Designer),
            "viewer" => Some(Role::Viewer),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_strings() {
        assert_eq!(Role::parse("designer"), Some(Role::Designer));
        assert_eq!(Role::parse("viewer"), Some(Role::Viewer));
        assert_eq!(Role::parse("admin"), None);
        assert_eq!(Role::Designer.as_str(), "designer");
    }
}
