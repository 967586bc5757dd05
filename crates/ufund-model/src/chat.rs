//! Chat assistant types

use serde::{Deserialize, Serialize};

/// An assistant personality offered by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatPersonality {
    /// Identifier
    pub id: i32,
    /// Name the assistant speaks under
    pub name: String,
    /// Short description
    #[serde(default)]
    pub description: String,
}

/// One line of a chat transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatLine {
    /// Speaker
    pub username: String,
    /// Text
    pub message: String,
}

impl ChatLine {
    /// Create a transcript line
    #[must_use]
    pub fn new(username: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            message: message.into(),
        }
    }
}
