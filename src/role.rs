//! Authorization grant levels.
//!
//! Roles are stored in the `roles` lookup table by name, but the set is closed,
//! so the rest of the application works with the [`Role`] enum and only
//! touches the strings at the database and serialization boundaries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const ROLE_USER: &str = "ROLE_USER";
pub const ROLE_ADMINISTRATOR: &str = "ROLE_ADMINISTRATOR";

/// Roles accepted by member-facing endpoints.
pub const USER_OR_ADMIN: &[Role] = &[Role::User, Role::Administrator];
/// Roles accepted by curation endpoints.
pub const ADMIN_ONLY: &[Role] = &[Role::Administrator];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ROLE_USER")]
    User,
    #[serde(rename = "ROLE_ADMINISTRATOR")]
    Administrator,
}

impl Role {
    /// Authority string matched by the authorization layer.
    pub fn authority(&self) -> &'static str {
        match self {
            Role::User => ROLE_USER,
            Role::Administrator => ROLE_ADMINISTRATOR,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.authority())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown role: {}", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ROLE_USER => Ok(Role::User),
            ROLE_ADMINISTRATOR => Ok(Role::Administrator),
            _ => Err(UnknownRole(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authority_strings() {
        assert_eq!(Role::User.authority(), "ROLE_USER");
        assert_eq!(Role::Administrator.authority(), "ROLE_ADMINISTRATOR");
        assert_eq!(Role::Administrator.to_string(), "ROLE_ADMINISTRATOR");
    }

    #[test]
    fn test_parse_authority() {
        assert_eq!("ROLE_USER".parse::<Role>(), Ok(Role::User));
        assert_eq!("ROLE_ADMINISTRATOR".parse::<Role>(), Ok(Role::Administrator));
        assert!("ROLE_MODERATOR".parse::<Role>().is_err());
        // Matching is by exact name.
        assert!("role_user".parse::<Role>().is_err());
    }

    #[test]
    fn test_serializes_as_authority() {
        let json = serde_json::to_string(&vec![Role::User, Role::Administrator]).unwrap();
        assert_eq!(json, r#"["ROLE_USER","ROLE_ADMINISTRATOR"]"#);

        let role: Role = serde_json::from_str(r#""ROLE_USER""#).unwrap();
        assert_eq!(role, Role::User);
    }

    #[test]
    fn test_endpoint_policies() {
        assert!(USER_OR_ADMIN.contains(&Role::User));
        assert!(USER_OR_ADMIN.contains(&Role::Administrator));
        assert!(!ADMIN_ONLY.contains(&Role::User));
    }
}
