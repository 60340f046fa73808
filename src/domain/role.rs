use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Privilege tier of an account. The variants form a total order:
/// `User < Moderator < Admin`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Moderator,
    Admin,
}

impl Role {
    #[must_use]
    pub fn is_at_least(self, threshold: Self) -> bool {
        self >= threshold
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "moderator" => Ok(Self::Moderator),
            "admin" => Ok(Self::Admin),
            other => Err(format!(
                "Unknown role: '{other}'. Expected one of: user, moderator, admin"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(Role::Admin.is_at_least(Role::Moderator));
        assert!(Role::Admin.is_at_least(Role::Admin));
        assert!(Role::Moderator.is_at_least(Role::User));
        assert!(!Role::User.is_at_least(Role::Moderator));
        assert!(!Role::Moderator.is_at_least(Role::Admin));
    }

    #[test]
    fn test_role_round_trip() {
        for role in [Role::User, Role::Moderator, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("superuser".parse::<Role>().is_err());
    }
}
