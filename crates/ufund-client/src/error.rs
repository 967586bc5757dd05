//! Client error types

/// Errors from a remote service call
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Request never produced a response
    #[error("{operation}: transport error: {source}")]
    Transport {
        /// Operation name
        operation: &'static str,
        /// Underlying reqwest error
        #[source]
        source: reqwest::Error,
    },

    /// Backend answered with a non-success status
    #[error("{operation}: backend returned status {status}")]
    Status {
        /// Operation name
        operation: &'static str,
        /// HTTP status code
        status: u16,
    },

    /// Response body did not match the expected shape
    #[error("{operation}: failed to decode response: {source}")]
    Decode {
        /// Operation name
        operation: &'static str,
        /// Underlying serde error
        #[source]
        source: serde_json::Error,
    },

    /// Configured base URL cannot carry path segments
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
}

impl ClientError {
    /// Operation that failed, when known
    #[must_use]
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            Self::Transport { operation, .. }
            | Self::Status { operation, .. }
            | Self::Decode { operation, .. } => Some(operation),
            Self::InvalidBaseUrl(_) => None,
        }
    }

    /// Backend reported the resource as missing
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }

    /// Whether repeating the call may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Decode { .. } | Self::InvalidBaseUrl(_) => false,
        }
    }
}
