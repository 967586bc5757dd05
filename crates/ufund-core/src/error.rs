//! Error types for uFund Core
//!
//! Most user-facing flows degrade instead of failing (see
//! [`ufund_client::LogFailure`]). These errors cover the paths that do
//! surface to the caller:
//! - Configuration loading
//! - Access checks for manager-only operations
//! - Write-behind queue lifecycle

use ufund_client::ClientError;
use ufund_model::ModelError;

/// Main core error type
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Remote service call failed
    #[error("backend error: {0}")]
    Client(#[from] ClientError),

    /// Record violates a model invariant
    #[error("invalid record: {0}")]
    Model(#[from] ModelError),

    /// Operation needs a logged-in user
    #[error("not logged in")]
    NotLoggedIn,

    /// Operation needs the manager account
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Write-behind worker has stopped
    #[error("write-behind queue closed")]
    QueueClosed,
}

impl CoreError {
    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Client(e) => e.is_retryable(),
            _ => false,
        }
    }
}
