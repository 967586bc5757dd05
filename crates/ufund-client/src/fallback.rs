//! Degrade-to-default handling for collaborator failures
//!
//! Call sites in the user-facing flows never surface a transport error:
//! they log it and carry on with an empty or default value.

use crate::error::ClientError;

/// Log-and-degrade extension for client results
pub trait LogFailure<T> {
    /// `Some(value)` on success, `None` after logging the failure
    fn or_log(self, operation: &str) -> Option<T>;

    /// Value on success, `T::default()` after logging the failure
    fn or_log_default(self, operation: &str) -> T
    where
        T: Default;
}

impl<T> LogFailure<T> for Result<T, ClientError> {
    fn or_log(self, operation: &str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::error!(operation, %error, "backend call failed");
                None
            }
        }
    }

    fn or_log_default(self, operation: &str) -> T
    where
        T: Default,
    {
        self.or_log(operation).unwrap_or_default()
    }
}
