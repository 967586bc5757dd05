//! Basket entries as stored on the user record

use crate::need::Need;
use serde::{Deserialize, Serialize};

/// One need in a user's basket with the requested additional amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketNeed {
    /// Need snapshot
    pub need: Need,
    /// Requested additional quantity
    pub count: i32,
}

impl BasketNeed {
    /// Create a basket need
    #[inline]
    #[must_use]
    pub fn new(need: Need, count: i32) -> Self {
        Self { need, count }
    }
}
