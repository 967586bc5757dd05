//! Need catalog cache
//!
//! The catalog owns the canonical [`Need`] records by id. Basket entries
//! keep snapshots and refresh them from here; nothing aliases a catalog
//! record.

use indexmap::IndexMap;
use ufund_model::{Need, NeedId};

/// Locally known needs, in backend order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NeedCatalog {
    needs: IndexMap<NeedId, Need>,
}

impl NeedCatalog {
    /// Create empty catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a backend listing; a repeated id keeps its first position
    /// and the last record
    #[must_use]
    pub fn from_needs(needs: impl IntoIterator<Item = Need>) -> Self {
        let mut catalog = Self::new();
        catalog.extend(needs);
        catalog
    }

    /// Replace the whole catalog
    pub fn replace_all(&mut self, needs: impl IntoIterator<Item = Need>) {
        self.needs.clear();
        self.extend(needs);
    }

    fn extend(&mut self, needs: impl IntoIterator<Item = Need>) {
        for need in needs {
            self.needs.insert(need.id, need);
        }
    }

    /// Need by id
    #[inline]
    #[must_use]
    pub fn get(&self, id: NeedId) -> Option<&Need> {
        self.needs.get(&id)
    }

    /// Mutable need by id
    #[inline]
    pub fn get_mut(&mut self, id: NeedId) -> Option<&mut Need> {
        self.needs.get_mut(&id)
    }

    /// Whether the catalog knows `id`
    #[inline]
    #[must_use]
    pub fn contains(&self, id: NeedId) -> bool {
        self.needs.contains_key(&id)
    }

    /// Insert or overwrite a need, keeping its position if known
    pub fn upsert(&mut self, need: Need) -> Option<Need> {
        self.needs.insert(need.id, need)
    }

    /// Remove a need, preserving the order of the rest
    pub fn remove(&mut self, id: NeedId) -> Option<Need> {
        self.needs.shift_remove(&id)
    }

    /// Set the committed quantity of a need
    ///
    /// Returns `false` if the need is unknown.
    pub fn set_quantity(&mut self, id: NeedId, quantity: i32) -> bool {
        match self.needs.get_mut(&id) {
            Some(need) => {
                need.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Needs whose name contains `term`, case-insensitively
    #[must_use]
    pub fn search(&self, term: &str) -> Vec<&Need> {
        self.needs.values().filter(|n| n.name_contains(term)).collect()
    }

    /// Iterate in order
    pub fn iter(&self) -> impl Iterator<Item = &Need> {
        self.needs.values()
    }

    /// Owned copy of every need, in order
    #[must_use]
    pub fn to_vec(&self) -> Vec<Need> {
        self.needs.values().cloned().collect()
    }

    /// Number of needs
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.needs.len()
    }

    /// Whether the catalog is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.needs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ufund_test_utils::need;

    #[test]
    fn catalog_preserves_order_on_remove() {
        let mut catalog = NeedCatalog::from_needs([need(3, 5, 0), need(1, 5, 0), need(2, 5, 0)]);
        catalog.remove(NeedId(1));

        let ids: Vec<_> = catalog.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![NeedId(3), NeedId(2)]);
    }

    #[test]
    fn upsert_keeps_position() {
        let mut catalog = NeedCatalog::from_needs([need(1, 5, 0), need(2, 5, 0)]);
        let previous = catalog.upsert(need(1, 9, 4));

        assert_eq!(previous.map(|n| n.cost), Some(5));
        assert_eq!(catalog.iter().next().map(|n| n.cost), Some(9));
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn set_quantity_on_unknown_need() {
        let mut catalog = NeedCatalog::from_needs([need(1, 5, 0)]);
        assert!(catalog.set_quantity(NeedId(1), 3));
        assert!(!catalog.set_quantity(NeedId(8), 3));
        assert_eq!(catalog.get(NeedId(1)).map(|n| n.quantity), Some(3));
    }

    #[test]
    fn search_matches_names() {
        let mut coats = need(1, 5, 0);
        coats.name = "Winter Coats".into();
        let catalog = NeedCatalog::from_needs([coats, need(2, 5, 0)]);

        assert_eq!(catalog.search("COAT").len(), 1);
        assert!(catalog.search("shoes").is_empty());
    }

    #[test]
    fn replace_all_drops_stale_needs() {
        let mut catalog = NeedCatalog::from_needs([need(1, 5, 0)]);
        catalog.replace_all([need(2, 5, 0)]);
        assert!(!catalog.contains(NeedId(1)));
        assert!(catalog.contains(NeedId(2)));
    }
}
