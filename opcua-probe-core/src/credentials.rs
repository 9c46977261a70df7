//! User credentials and session identities

use serde::{Deserialize, Serialize};
use std::fmt;

/// A user-name/password pair
///
/// `Debug` never prints the password.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Build credentials only when both halves are present and non-empty
    pub fn from_parts(username: Option<&str>, password: Option<&str>) -> Option<Self> {
        match (username, password) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => {
                Some(Self::new(user, pass))
            }
            _ => None,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Identity presented when activating a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIdentity {
    Anonymous,
    UserName(Credentials),
}

impl UserIdentity {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, UserIdentity::Anonymous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_requires_both() {
        assert!(Credentials::from_parts(Some("operator"), Some("secret")).is_some());
        assert!(Credentials::from_parts(Some("operator"), None).is_none());
        assert!(Credentials::from_parts(None, Some("secret")).is_none());
        assert!(Credentials::from_parts(Some(""), Some("secret")).is_none());
    }

    #[test]
    fn test_debug_hides_password() {
        let creds = Credentials::new("operator", "hunter2");
        let printed = format!("{:?}", creds);
        assert!(printed.contains("operator"));
        assert!(!printed.contains("hunter2"));
    }
}
