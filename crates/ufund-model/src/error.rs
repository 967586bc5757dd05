//! Model validation errors

use crate::need::NeedId;

/// Errors raised when a record violates a model invariant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A required text field was empty
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Committed quantity is outside `0..=cost`
    #[error("need {id}: quantity {quantity} outside 0..={cost}")]
    QuantityOutOfRange {
        /// Offending need
        id: NeedId,
        /// Committed quantity
        quantity: i32,
        /// Capacity ceiling
        cost: i32,
    },

    /// Capacity ceiling is negative
    #[error("need {id}: negative cost {cost}")]
    NegativeCost {
        /// Offending need
        id: NeedId,
        /// Capacity ceiling
        cost: i32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_error_display() {
        let err = ModelError::QuantityOutOfRange {
            id: NeedId(4),
            quantity: 12,
            cost: 10,
        };
        assert_eq!(err.to_string(), "need 4: quantity 12 outside 0..=10");
        assert!(ModelError::MissingField("name").to_string().contains("name"));
    }
}
