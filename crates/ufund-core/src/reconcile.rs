//! Basket reconciliation
//!
//! Refreshes an entry's need snapshot from the catalog and, on a count
//! change, validates and clamps the new count against the capacity left.
//!
//! Clamp rule for `new_count != 0`:
//! - negative counts are rejected
//! - a count that does not decrease and exceeds `cost - quantity` becomes
//!   `cost - quantity`
//! - a clamp target below zero (over-allocated catalog) is rejected
//!
//! An entry whose need is missing from the catalog is removed from the
//! basket.

use crate::basket::{BasketStore, EntryId};
use crate::catalog::NeedCatalog;
use crate::outbox::{Outbox, RemoteWrite};

/// Why a count change was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The requested count was negative
    NegativeCount(i32),
    /// The catalog already commits more than the ceiling
    OverAllocated {
        /// `cost - quantity`, below zero
        remaining: i32,
    },
}

/// Result of reconciling one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Snapshot refreshed, count untouched
    Refreshed,
    /// Snapshot refreshed and a new count applied
    Applied {
        /// Count now on the entry
        count: i32,
        /// Whether the requested count was lowered to fit
        clamped: bool,
    },
    /// Snapshot refreshed, count change refused
    Rejected(RejectReason),
    /// Need no longer in the catalog; entry removed
    Dropped,
    /// No entry with that id in the basket
    UnknownEntry,
    /// Catalog could not be loaded; nothing changed
    CatalogUnavailable,
}

impl ReconcileOutcome {
    /// Whether reconciliation succeeded
    #[inline]
    #[must_use]
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Refreshed | Self::Applied { .. })
    }
}

/// Target count for a change from `current` to `requested` with
/// `remaining` capacity left, or the reason it is refused
///
/// # Errors
/// `RejectReason` when the change cannot be applied
pub fn clamp_count(current: i32, requested: i32, remaining: i32) -> Result<(i32, bool), RejectReason> {
    if requested < 0 {
        return Err(RejectReason::NegativeCount(requested));
    }
    if requested >= current && requested > remaining {
        if remaining < 0 {
            return Err(RejectReason::OverAllocated { remaining });
        }
        return Ok((remaining, true));
    }
    Ok((requested, false))
}

/// Reconcile one entry, with `new_count == 0` meaning refresh only
pub fn reconcile_entry(
    store: &mut BasketStore,
    id: EntryId,
    catalog: &NeedCatalog,
    new_count: i32,
    outbox: &dyn Outbox,
) -> ReconcileOutcome {
    let user = store.user();
    let Some(entry) = store.get_mut(id) else {
        return ReconcileOutcome::UnknownEntry;
    };

    let Some(current) = catalog.get(entry.need_id()) else {
        let need_id = entry.need_id();
        store.remove(id, outbox);
        tracing::info!(%user, %need_id, "need left the cupboard, entry dropped");
        return ReconcileOutcome::Dropped;
    };
    entry.need = current.clone();

    if new_count == 0 {
        return ReconcileOutcome::Refreshed;
    }

    match clamp_count(entry.count, new_count, entry.need.remaining()) {
        Ok((count, clamped)) => {
            entry.count = count;
            tracing::debug!(%user, need_id = %entry.need_id(), count, clamped, "basket count applied");
            outbox.enqueue(RemoteWrite::SetCount {
                user,
                need: entry.need.clone(),
                count,
            });
            ReconcileOutcome::Applied { count, clamped }
        }
        Err(reason) => {
            tracing::warn!(%user, need_id = %entry.need_id(), ?reason, "basket count rejected");
            ReconcileOutcome::Rejected(reason)
        }
    }
}

/// Reconcile one entry and report plain success
pub fn reconcile(
    store: &mut BasketStore,
    id: EntryId,
    catalog: &NeedCatalog,
    new_count: i32,
    outbox: &dyn Outbox,
) -> bool {
    reconcile_entry(store, id, catalog, new_count, outbox).succeeded()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbox::RecordingOutbox;
    use proptest::prelude::*;
    use ufund_model::UserId;
    use ufund_test_utils::need;

    fn store_with(count: i32) -> (BasketStore, EntryId) {
        let mut store = BasketStore::new(UserId(7));
        let id = store.add(need(1, 10, 0), count);
        (store, id)
    }

    #[test]
    fn refresh_only_updates_snapshot() {
        let (mut store, id) = store_with(2);
        let catalog = NeedCatalog::from_needs([need(1, 10, 4)]);
        let outbox = RecordingOutbox::new();

        let outcome = reconcile_entry(&mut store, id, &catalog, 0, &outbox);

        assert_eq!(outcome, ReconcileOutcome::Refreshed);
        assert_eq!(store.get(id).unwrap().need.quantity, 4);
        assert!(outbox.is_empty());
    }

    #[test]
    fn increase_past_capacity_is_clamped() {
        // C=10, Q=7: asking for 5 leaves the entry at 3
        let (mut store, id) = store_with(1);
        let catalog = NeedCatalog::from_needs([need(1, 10, 7)]);
        let outbox = RecordingOutbox::new();

        let outcome = reconcile_entry(&mut store, id, &catalog, 5, &outbox);

        assert_eq!(outcome, ReconcileOutcome::Applied { count: 3, clamped: true });
        assert_eq!(store.get(id).unwrap().count, 3);
        assert!(matches!(
            outbox.writes().as_slice(),
            [RemoteWrite::SetCount { count: 3, .. }]
        ));
    }

    #[test]
    fn equal_count_still_clamps() {
        let (mut store, id) = store_with(5);
        let catalog = NeedCatalog::from_needs([need(1, 10, 7)]);
        let outbox = RecordingOutbox::new();

        assert!(reconcile(&mut store, id, &catalog, 5, &outbox));
        assert_eq!(store.get(id).unwrap().count, 3);
    }

    #[test]
    fn decrease_skips_capacity_check() {
        let (mut store, id) = store_with(8);
        let catalog = NeedCatalog::from_needs([need(1, 10, 7)]);
        let outbox = RecordingOutbox::new();

        let outcome = reconcile_entry(&mut store, id, &catalog, 6, &outbox);

        assert_eq!(outcome, ReconcileOutcome::Applied { count: 6, clamped: false });
    }

    #[test]
    fn negative_count_rejected() {
        let (mut store, id) = store_with(2);
        let catalog = NeedCatalog::from_needs([need(1, 10, 3)]);
        let outbox = RecordingOutbox::new();

        let outcome = reconcile_entry(&mut store, id, &catalog, -1, &outbox);

        assert_eq!(outcome, ReconcileOutcome::Rejected(RejectReason::NegativeCount(-1)));
        let entry = store.get(id).unwrap();
        assert_eq!(entry.count, 2);
        assert_eq!(entry.need.quantity, 3);
        assert!(outbox.is_empty());
    }

    #[test]
    fn over_allocated_catalog_rejects_increase() {
        let (mut store, id) = store_with(1);
        let catalog = NeedCatalog::from_needs([need(1, 10, 12)]);
        let outbox = RecordingOutbox::new();

        assert!(!reconcile(&mut store, id, &catalog, 4, &outbox));
        assert_eq!(store.get(id).unwrap().count, 1);
        assert!(outbox.is_empty());
    }

    #[test]
    fn missing_need_drops_entry() {
        let (mut store, id) = store_with(2);
        let catalog = NeedCatalog::new();
        let outbox = RecordingOutbox::new();

        let outcome = reconcile_entry(&mut store, id, &catalog, 3, &outbox);

        assert_eq!(outcome, ReconcileOutcome::Dropped);
        assert!(store.is_empty());
        assert!(matches!(
            outbox.writes().as_slice(),
            [RemoteWrite::RemoveFromBasket { .. }]
        ));
    }

    #[test]
    fn unknown_entry() {
        let (mut store, _) = store_with(2);
        let catalog = NeedCatalog::from_needs([need(1, 10, 0)]);
        let outbox = RecordingOutbox::new();

        let outcome = reconcile_entry(&mut store, EntryId::new(), &catalog, 3, &outbox);
        assert_eq!(outcome, ReconcileOutcome::UnknownEntry);
        assert!(!outcome.succeeded());
    }

    proptest! {
        #[test]
        fn clamp_never_exceeds_remaining_on_increase(
            cost in 0i32..100,
            quantity in 0i32..100,
            current in 0i32..50,
            requested in 1i32..200,
        ) {
            prop_assume!(quantity <= cost);
            let remaining = cost - quantity;

            match clamp_count(current, requested, remaining) {
                Ok((count, clamped)) => {
                    prop_assert!(count >= 0);
                    if requested >= current {
                        prop_assert!(count <= remaining);
                        prop_assert_eq!(clamped, requested > remaining);
                    } else {
                        prop_assert_eq!(count, requested);
                    }
                }
                Err(reason) => prop_assert!(false, "unexpected rejection {:?}", reason),
            }
        }

        #[test]
        fn negative_requests_always_rejected(current in 0i32..50, requested in -100i32..0, remaining in -10i32..50) {
            prop_assert_eq!(
                clamp_count(current, requested, remaining),
                Err(RejectReason::NegativeCount(requested))
            );
        }
    }
}
