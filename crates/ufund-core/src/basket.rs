//! Per-user basket store
//!
//! Entries are ordered and identified by a local [`EntryId`], so two
//! entries for the same need stay distinct and removal never depends on
//! value equality.

use crate::catalog::NeedCatalog;
use crate::outbox::{Outbox, RemoteWrite};
use crate::reconcile::reconcile_entry;
use serde::{Deserialize, Serialize};
use ufund_model::{BasketNeed, Need, NeedId, UserId};
use ulid::Ulid;

/// Local identity of a basket entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryId(pub Ulid);

impl EntryId {
    /// Generate new entry id
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A need snapshot plus the requested additional amount
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasketEntry {
    id: EntryId,
    /// Need snapshot, refreshed by reconciliation
    pub need: Need,
    /// Requested additional quantity
    pub count: i32,
}

impl BasketEntry {
    /// Create entry with a fresh identity
    #[must_use]
    pub fn new(need: Need, count: i32) -> Self {
        Self {
            id: EntryId::new(),
            need,
            count,
        }
    }

    /// Local identity
    #[inline]
    #[must_use]
    pub fn id(&self) -> EntryId {
        self.id
    }

    /// Id of the need this entry refers to
    #[inline]
    #[must_use]
    pub fn need_id(&self) -> NeedId {
        self.need.id
    }

    /// Wire form
    #[must_use]
    pub fn to_wire(&self) -> BasketNeed {
        BasketNeed::new(self.need.clone(), self.count)
    }
}

impl From<BasketNeed> for BasketEntry {
    fn from(wire: BasketNeed) -> Self {
        Self::new(wire.need, wire.count)
    }
}

/// One user's basket
#[derive(Debug, Clone)]
pub struct BasketStore {
    user: UserId,
    entries: Vec<BasketEntry>,
    checkout_blocked: bool,
}

impl BasketStore {
    /// Create empty basket for `user`
    #[must_use]
    pub fn new(user: UserId) -> Self {
        Self {
            user,
            entries: Vec::new(),
            checkout_blocked: false,
        }
    }

    /// Build from the basket stored on the user record
    #[must_use]
    pub fn from_remote(user: UserId, basket: Vec<BasketNeed>) -> Self {
        let mut store = Self::new(user);
        store.replace_from_remote(basket);
        store
    }

    /// Replace every entry with the backend's copy
    pub fn replace_from_remote(&mut self, basket: Vec<BasketNeed>) {
        self.entries = basket.into_iter().map(BasketEntry::from).collect();
    }

    /// Owner
    #[inline]
    #[must_use]
    pub fn user(&self) -> UserId {
        self.user
    }

    /// Append an entry
    pub fn add(&mut self, need: Need, count: i32) -> EntryId {
        let entry = BasketEntry::new(need, count);
        let id = entry.id();
        tracing::debug!(user = %self.user, need_id = %entry.need_id(), count, "basket entry added");
        self.entries.push(entry);
        id
    }

    /// Entry by identity
    #[must_use]
    pub fn get(&self, id: EntryId) -> Option<&BasketEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: EntryId) -> Option<&mut BasketEntry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    /// Position of an entry
    #[must_use]
    pub fn position(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    /// Entry at a position
    #[must_use]
    pub fn entry_at(&self, index: usize) -> Option<&BasketEntry> {
        self.entries.get(index)
    }

    /// Entries in order
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[BasketEntry] {
        &self.entries
    }

    /// Remove an entry and queue the remote removal
    ///
    /// The local removal does not wait for the backend.
    pub fn remove(&mut self, id: EntryId, outbox: &dyn Outbox) -> Option<BasketEntry> {
        let index = self.position(id)?;
        let entry = self.entries.remove(index);
        tracing::debug!(user = %self.user, need_id = %entry.need_id(), "basket entry removed");
        outbox.enqueue(RemoteWrite::RemoveFromBasket {
            user: self.user,
            need: entry.need.clone(),
        });
        Some(entry)
    }

    /// Refresh every entry from the catalog, dropping entries whose need
    /// is gone
    pub fn update_all(&mut self, catalog: &NeedCatalog, outbox: &dyn Outbox) -> &[BasketEntry] {
        let ids: Vec<EntryId> = self.entries.iter().map(BasketEntry::id).collect();
        for id in ids {
            reconcile_entry(self, id, catalog, 0, outbox);
        }
        &self.entries
    }

    /// Replace every entry
    pub fn replace(&mut self, entries: Vec<BasketEntry>) {
        self.entries = entries;
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the basket is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the last checkout left entries it could not fulfil
    #[inline]
    #[must_use]
    pub fn checkout_blocked(&self) -> bool {
        self.checkout_blocked
    }

    /// Acknowledge a blocked checkout
    pub fn dismiss_blocked(&mut self) {
        self.checkout_blocked = false;
    }

    pub(crate) fn set_blocked(&mut self, blocked: bool) {
        self.checkout_blocked = blocked;
    }

    /// Wire form of every entry
    #[must_use]
    pub fn to_wire(&self) -> Vec<BasketNeed> {
        self.entries.iter().map(BasketEntry::to_wire).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbox::RecordingOutbox;
    use ufund_test_utils::need;

    #[test]
    fn duplicate_needs_are_distinct_entries() {
        let mut store = BasketStore::new(UserId(7));
        let first = store.add(need(1, 10, 0), 2);
        let second = store.add(need(1, 10, 0), 2);
        assert_ne!(first, second);

        let outbox = RecordingOutbox::new();
        store.remove(second, &outbox);

        assert_eq!(store.len(), 1);
        assert_eq!(store.entries()[0].id(), first);
    }

    #[test]
    fn remove_is_immediate_and_queues_remote_write() {
        let mut store = BasketStore::new(UserId(7));
        let id = store.add(need(1, 10, 0), 2);
        let outbox = RecordingOutbox::new();

        let removed = store.remove(id, &outbox).unwrap();

        assert!(store.is_empty());
        assert_eq!(removed.count, 2);
        assert_eq!(
            outbox.writes(),
            vec![RemoteWrite::RemoveFromBasket {
                user: UserId(7),
                need: need(1, 10, 0),
            }]
        );
    }

    #[test]
    fn remove_unknown_entry_is_noop() {
        let mut store = BasketStore::new(UserId(7));
        store.add(need(1, 10, 0), 2);
        let outbox = RecordingOutbox::new();

        assert!(store.remove(EntryId::new(), &outbox).is_none());
        assert_eq!(store.len(), 1);
        assert!(outbox.is_empty());
    }

    #[test]
    fn update_all_refreshes_and_drops() {
        let mut store = BasketStore::new(UserId(7));
        let kept = store.add(need(1, 10, 0), 2);
        store.add(need(2, 10, 0), 1);
        let catalog = NeedCatalog::from_needs([need(1, 10, 6)]);
        let outbox = RecordingOutbox::new();

        let entries = store.update_all(&catalog, &outbox);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id(), kept);
        assert_eq!(entries[0].need.quantity, 6);
        assert_eq!(entries[0].count, 2);
        assert_eq!(outbox.len(), 1);
    }

    #[test]
    fn from_remote_keeps_order() {
        let store = BasketStore::from_remote(
            UserId(7),
            vec![
                BasketNeed::new(need(2, 5, 0), 1),
                BasketNeed::new(need(1, 5, 0), 3),
            ],
        );
        let ids: Vec<_> = store.entries().iter().map(BasketEntry::need_id).collect();
        assert_eq!(ids, vec![NeedId(2), NeedId(1)]);
        assert_eq!(store.to_wire()[1].count, 3);
    }

    #[test]
    fn blocked_flag_is_dismissable() {
        let mut store = BasketStore::new(UserId(7));
        store.set_blocked(true);
        assert!(store.checkout_blocked());
        store.dismiss_blocked();
        assert!(!store.checkout_blocked());
    }
}
