//! Login sessions

use serde::{Deserialize, Serialize};

/// Sessions expire this long after their last validation
pub const SESSION_TTL_MS: i64 = 30 * 60 * 1000;

/// A backend session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Session id (equals the user id)
    pub id: i32,
    /// Linked user name
    pub user_name: String,
    /// Epoch millis of the last validation
    pub timer: i64,
}

impl Session {
    /// Whether the session has lapsed at `now_ms`
    #[inline]
    #[must_use]
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms - self.timer > SESSION_TTL_MS
    }

    /// Whether the session has lapsed now
    #[must_use]
    pub fn is_expired_now(&self) -> bool {
        self.is_expired(chrono::Utc::now().timestamp_millis())
    }
}

/// Login request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// User name
    pub username: String,
    /// Password, plain or hashed depending on the endpoint
    pub password: String,
}

impl Credentials {
    /// Create credentials
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_expiry_boundary() {
        let session = Session {
            id: 1,
            user_name: "sam".into(),
            timer: 1_000,
        };
        assert!(!session.is_expired(1_000 + SESSION_TTL_MS));
        assert!(session.is_expired(1_001 + SESSION_TTL_MS));
    }

    #[test]
    fn fresh_session_is_live() {
        let mut session = Session {
            id: 1,
            user_name: "sam".into(),
            timer: chrono::Utc::now().timestamp_millis(),
        };
        assert!(!session.is_expired_now());

        session.timer -= SESSION_TTL_MS + 1_000;
        assert!(session.is_expired_now());
    }

    #[test]
    fn session_json_shape() {
        let session: Session =
            serde_json::from_str(r#"{"id":7,"userName":"sam","timer":42}"#).unwrap();
        assert_eq!(session.user_name, "sam");
        assert_eq!(session.timer, 42);
    }
}
