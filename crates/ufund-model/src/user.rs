//! Users and roles

use crate::basket::BasketNeed;
use serde::{Deserialize, Serialize};

/// Account name that holds the manager role
pub const ADMIN_USER_NAME: &str = "admin";

/// Display name used when nobody is logged in
pub const GUEST_USER_NAME: &str = "Guest";

/// Server-assigned user identifier
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub i32);

impl UserId {
    /// Identifier carried by the guest user after logout
    pub const GUEST: Self = Self(-1);
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Cupboard manager
    Manager,
    /// Regular helper
    Helper,
}

impl Role {
    /// Role the backend assigns to a user name
    #[must_use]
    pub fn for_user_name(user_name: &str) -> Self {
        if user_name == ADMIN_USER_NAME {
            Role::Manager
        } else {
            Role::Helper
        }
    }
}

/// A user record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Identifier
    pub id: UserId,
    /// Login name
    pub user_name: String,
    /// Password (plain on create/update, hashed when read back)
    #[serde(default)]
    pub password: String,
    /// Security question answers, in question order
    #[serde(default)]
    pub security: Vec<String>,
    /// Pending basket
    #[serde(default)]
    pub basket: Vec<BasketNeed>,
    /// Whether the account is barred from logging in
    #[serde(default)]
    pub restricted: bool,
    /// Role, when the backend reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl User {
    /// Create a user to register
    #[must_use]
    pub fn new(user_name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// With security answers
    #[inline]
    #[must_use]
    pub fn with_security(mut self, answers: Vec<String>) -> Self {
        self.security = answers;
        self
    }

    /// Whether this is the manager account
    #[inline]
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user_name == ADMIN_USER_NAME
    }

    /// Compare the answer for `question` (0-based)
    #[must_use]
    pub fn security_matches(&self, question: usize, answer: &str) -> bool {
        self.security.get(question).is_some_and(|a| a == answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_json_is_camel_case() {
        let user = User::new("sam", "pw").with_security(vec!["a".into(), "b".into()]);
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["userName"], "sam");
        assert!(json.get("role").is_none());
    }

    #[test]
    fn user_json_accepts_role() {
        let user: User = serde_json::from_str(
            r#"{"id":1,"userName":"admin","role":"MANAGER","basket":[],"restricted":false}"#,
        )
        .unwrap();
        assert_eq!(user.role, Some(Role::Manager));
        assert!(user.is_admin());
    }

    #[test]
    fn role_for_user_name() {
        assert_eq!(Role::for_user_name("admin"), Role::Manager);
        assert_eq!(Role::for_user_name("sam"), Role::Helper);
    }

    #[test]
    fn security_matches_by_position() {
        let user = User::new("sam", "pw").with_security(vec!["blue".into(), "rex".into()]);
        assert!(user.security_matches(0, "blue"));
        assert!(!user.security_matches(1, "blue"));
        assert!(!user.security_matches(2, "rex"));
    }
}
