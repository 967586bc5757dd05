//! Cupboard needs
//!
//! A need has a capacity ceiling (`cost`) and a committed amount
//! (`quantity`). Persisted needs satisfy `0 <= quantity <= cost`.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};

/// Server-assigned need identifier (0 = not yet assigned)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NeedId(pub i32);

impl NeedId {
    /// Identifier of a need the backend has not stored yet
    pub const UNASSIGNED: Self = Self(0);
}

impl std::fmt::Display for NeedId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A cupboard need
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Need {
    /// Identifier
    pub id: NeedId,
    /// Display name
    pub name: String,
    /// Capacity ceiling
    pub cost: i32,
    /// Currently committed amount
    pub quantity: i32,
    /// Free-form category
    #[serde(rename = "type")]
    pub need_type: String,
    /// Description shown to helpers
    #[serde(default)]
    pub description: String,
}

impl Need {
    /// Create an unassigned need with nothing committed
    #[must_use]
    pub fn new(name: impl Into<String>, cost: i32, need_type: impl Into<String>) -> Self {
        Self {
            id: NeedId::UNASSIGNED,
            name: name.into(),
            cost,
            quantity: 0,
            need_type: need_type.into(),
            description: String::new(),
        }
    }

    /// With id
    #[inline]
    #[must_use]
    pub fn with_id(mut self, id: i32) -> Self {
        self.id = NeedId(id);
        self
    }

    /// With committed quantity
    #[inline]
    #[must_use]
    pub fn with_quantity(mut self, quantity: i32) -> Self {
        self.quantity = quantity;
        self
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Capacity left before the ceiling is reached.
    ///
    /// Negative when the catalog is over-allocated.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> i32 {
        self.cost.saturating_sub(self.quantity)
    }

    /// Whether `count` more units still fit under the ceiling
    #[inline]
    #[must_use]
    pub fn can_absorb(&self, count: i32) -> bool {
        self.quantity
            .checked_add(count)
            .is_some_and(|total| total <= self.cost)
    }

    /// Whether nothing more can be committed
    #[inline]
    #[must_use]
    pub fn is_fulfilled(&self) -> bool {
        self.quantity >= self.cost
    }

    /// Check the persisted-need invariants
    ///
    /// # Errors
    /// - `ModelError::MissingField` for an empty name
    /// - `ModelError::NegativeCost` / `ModelError::QuantityOutOfRange`
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.name.trim().is_empty() {
            return Err(ModelError::MissingField("name"));
        }
        if self.cost < 0 {
            return Err(ModelError::NegativeCost {
                id: self.id,
                cost: self.cost,
            });
        }
        if self.quantity < 0 || self.quantity > self.cost {
            return Err(ModelError::QuantityOutOfRange {
                id: self.id,
                quantity: self.quantity,
                cost: self.cost,
            });
        }
        Ok(())
    }

    /// Case-insensitive substring match on the name
    #[must_use]
    pub fn name_contains(&self, term: &str) -> bool {
        self.name.to_lowercase().contains(&term.to_lowercase())
    }
}

impl std::fmt::Display for Need {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Need [name={}, cost={}, quantity={}, type={}, description={}]",
            self.name, self.cost, self.quantity, self.need_type, self.description
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn need_json_uses_backend_field_names() {
        let need = Need::new("Blankets", 10, "goods").with_id(3).with_quantity(2);
        let json = serde_json::to_value(&need).unwrap();

        assert_eq!(json["id"], 3);
        assert_eq!(json["type"], "goods");
        assert!(json.get("need_type").is_none());
    }

    #[test]
    fn need_json_without_description() {
        let need: Need = serde_json::from_str(
            r#"{"id":1,"name":"Soap","cost":5,"quantity":0,"type":"hygiene"}"#,
        )
        .unwrap();
        assert_eq!(need.id, NeedId(1));
        assert!(need.description.is_empty());
    }

    #[test]
    fn remaining_can_go_negative() {
        let need = Need::new("Over", 4, "x").with_quantity(6);
        assert_eq!(need.remaining(), -2);
        assert!(need.is_fulfilled());
        assert!(need.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_name() {
        let need = Need::new("  ", 4, "x");
        assert_eq!(need.validate(), Err(ModelError::MissingField("name")));
    }

    #[test]
    fn name_contains_ignores_case() {
        let need = Need::new("Winter Coats", 4, "clothing");
        assert!(need.name_contains("coat"));
        assert!(!need.name_contains("boots"));
    }

    #[test]
    fn capacity_checks_do_not_overflow() {
        let need = Need::new("Rice", 10, "food").with_quantity(2);
        assert!(!need.can_absorb(i32::MAX));
        assert!(need.can_absorb(8));

        let deep = Need::new("Over", i32::MIN, "x").with_quantity(i32::MAX);
        assert_eq!(deep.remaining(), i32::MIN);
    }

    proptest! {
        #[test]
        fn can_absorb_matches_remaining(cost in 0i32..1000, quantity in 0i32..1000, count in 0i32..1000) {
            let need = Need::new("n", cost, "t").with_quantity(quantity);
            prop_assert_eq!(need.can_absorb(count), count <= need.remaining());
        }
    }
}
