//! Cupboard facade for one logged-in user
//!
//! Owns the user's catalog cache and basket behind a single async mutex,
//! so every mutation for the session runs in order. Remote writes go to
//! the outbox; only the add-to-basket calls are awaited.

use crate::basket::{BasketEntry, BasketStore, EntryId};
use crate::catalog::NeedCatalog;
use crate::checkout::{checkout, CheckoutReport};
use crate::outbox::{Outbox, RemoteWrite};
use crate::reconcile::{reconcile_entry, ReconcileOutcome};
use std::sync::Arc;
use tokio::sync::Mutex;
use ufund_client::{Backend, LogFailure};
use ufund_model::{Need, NeedId, UserId};

#[derive(Debug)]
struct CupboardState {
    catalog: NeedCatalog,
    basket: BasketStore,
}

/// Catalog and basket of one user session
pub struct Cupboard {
    backend: Arc<dyn Backend>,
    outbox: Arc<dyn Outbox>,
    user: UserId,
    state: Mutex<CupboardState>,
}

impl std::fmt::Debug for Cupboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cupboard").field("user", &self.user).finish_non_exhaustive()
    }
}

impl Cupboard {
    /// Create cupboard with an empty catalog and basket
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, outbox: Arc<dyn Outbox>, user: UserId) -> Self {
        Self {
            backend,
            outbox,
            user,
            state: Mutex::new(CupboardState {
                catalog: NeedCatalog::new(),
                basket: BasketStore::new(user),
            }),
        }
    }

    /// Owner
    #[inline]
    #[must_use]
    pub fn user(&self) -> UserId {
        self.user
    }

    /// Reload the catalog from the backend
    ///
    /// Returns `None` when the backend could not be reached; the cached
    /// catalog is kept in that case.
    pub async fn refresh_catalog(&self) -> Option<Vec<Need>> {
        let needs = self.backend.list_needs().await.or_log("list_needs")?;
        let mut state = self.state.lock().await;
        state.catalog.replace_all(needs.iter().cloned());
        tracing::debug!(user = %self.user, needs = needs.len(), "catalog refreshed");
        Some(needs)
    }

    /// Whether a catalog is available, loading it if nothing is cached
    async fn ensure_catalog(&self) -> bool {
        if !self.state.lock().await.catalog.is_empty() {
            return true;
        }
        self.refresh_catalog().await.is_some()
    }

    /// Needs whose name contains `term`; the full list for an empty term
    pub async fn search(&self, term: &str) -> Vec<Need> {
        let term = term.trim();
        if term.is_empty() {
            return self.refresh_catalog().await.unwrap_or_default();
        }
        self.backend
            .search_needs(term)
            .await
            .or_log_default("search_needs")
    }

    /// Cached catalog
    pub async fn needs(&self) -> Vec<Need> {
        self.state.lock().await.catalog.to_vec()
    }

    /// Cached need by id
    pub async fn need(&self, id: NeedId) -> Option<Need> {
        self.state.lock().await.catalog.get(id).cloned()
    }

    /// Add a need to the basket with at least one unit requested
    ///
    /// Both backend calls are awaited; the local entry is only appended
    /// when they succeed.
    pub async fn add_to_basket(&self, need: &Need, requested: i32) -> bool {
        let count = requested.max(1);
        let mut state = self.state.lock().await;

        if self
            .backend
            .add_to_basket(self.user, need)
            .await
            .or_log("add_to_basket")
            .is_none()
        {
            return false;
        }
        if self
            .backend
            .set_basket_count(self.user, need, count)
            .await
            .or_log("set_basket_count")
            .is_none()
        {
            return false;
        }

        state.basket.add(need.clone(), count);
        tracing::info!(user = %self.user, need_id = %need.id, count, "need added to basket");
        true
    }

    /// Load the stored basket and reconcile it against the catalog
    ///
    /// Without a catalog the stored basket is returned as is.
    pub async fn open_basket(&self) -> Vec<BasketEntry> {
        let catalog_ready = self.ensure_catalog().await;
        let remote = self.backend.get_basket(self.user).await.or_log("get_basket");

        let mut state = self.state.lock().await;
        let CupboardState { catalog, basket } = &mut *state;
        if let Some(remote) = remote {
            basket.replace_from_remote(remote);
        }
        if !catalog_ready {
            tracing::warn!(user = %self.user, "catalog unavailable, basket not reconciled");
            return basket.entries().to_vec();
        }
        basket.update_all(catalog, self.outbox.as_ref()).to_vec()
    }

    /// Current basket
    pub async fn basket(&self) -> Vec<BasketEntry> {
        self.state.lock().await.basket.entries().to_vec()
    }

    /// Identity of the entry at `position`
    pub async fn entry_at(&self, position: usize) -> Option<EntryId> {
        self.state.lock().await.basket.entry_at(position).map(BasketEntry::id)
    }

    /// Change an entry's requested count
    pub async fn edit_count(&self, entry: EntryId, new_count: i32) -> ReconcileOutcome {
        if !self.ensure_catalog().await {
            return ReconcileOutcome::CatalogUnavailable;
        }
        let mut state = self.state.lock().await;
        let CupboardState { catalog, basket } = &mut *state;
        reconcile_entry(basket, entry, catalog, new_count, self.outbox.as_ref())
    }

    /// Remove an entry
    pub async fn remove(&self, entry: EntryId) -> bool {
        let mut state = self.state.lock().await;
        state.basket.remove(entry, self.outbox.as_ref()).is_some()
    }

    /// Commit every entry that fits
    ///
    /// Nothing is committed while the catalog cannot be loaded; the whole
    /// basket is reported as residue.
    pub async fn checkout(&self) -> CheckoutReport {
        if !self.ensure_catalog().await {
            tracing::warn!(user = %self.user, "catalog unavailable, checkout skipped");
            return CheckoutReport {
                committed: Vec::new(),
                residue: self.basket().await,
            };
        }
        let mut state = self.state.lock().await;
        let CupboardState { catalog, basket } = &mut *state;
        checkout(basket, catalog, self.outbox.as_ref())
    }

    /// Whether the last checkout left residue
    pub async fn checkout_blocked(&self) -> bool {
        self.state.lock().await.basket.checkout_blocked()
    }

    /// Acknowledge a blocked checkout
    pub async fn dismiss_blocked(&self) {
        self.state.lock().await.basket.dismiss_blocked();
    }

    pub(crate) async fn upsert_need(&self, need: Need) {
        self.state.lock().await.catalog.upsert(need);
    }

    pub(crate) async fn persist_need(&self, need: Need) {
        let mut state = self.state.lock().await;
        state.catalog.upsert(need.clone());
        self.outbox.enqueue(RemoteWrite::PersistNeed(need));
    }

    pub(crate) async fn forget_need(&self, id: NeedId) {
        self.state.lock().await.catalog.remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbox::RecordingOutbox;
    use ufund_test_utils::{need, named_need, user, FakeBackend};

    fn setup(needs: Vec<Need>) -> (Arc<FakeBackend>, Arc<RecordingOutbox>, Cupboard) {
        let backend = Arc::new(FakeBackend::new().with_needs(needs).with_user(user(7, "sam")));
        let outbox = Arc::new(RecordingOutbox::new());
        let cupboard = Cupboard::new(backend.clone(), outbox.clone(), UserId(7));
        (backend, outbox, cupboard)
    }

    #[tokio::test]
    async fn refresh_failure_keeps_cache() {
        let (backend, _, cupboard) = setup(vec![need(1, 10, 0)]);
        assert_eq!(cupboard.refresh_catalog().await.map(|needs| needs.len()), Some(1));

        backend.fail_operation("list_needs");
        assert!(cupboard.refresh_catalog().await.is_none());
        assert_eq!(cupboard.needs().await.len(), 1);
    }

    #[tokio::test]
    async fn empty_listing_is_not_a_failure() {
        let (_, _, cupboard) = setup(Vec::new());
        assert_eq!(cupboard.refresh_catalog().await, Some(Vec::new()));
    }

    #[tokio::test]
    async fn open_basket_without_catalog_keeps_stored_entries() {
        let (backend, outbox, cupboard) = setup(vec![need(1, 10, 0), need(2, 10, 0)]);
        cupboard.add_to_basket(&need(1, 10, 0), 2).await;
        cupboard.add_to_basket(&need(2, 10, 0), 1).await;
        backend.fail_operation("list_needs");

        let fresh = Cupboard::new(backend.clone(), outbox.clone(), UserId(7));
        let basket = fresh.open_basket().await;

        assert_eq!(basket.len(), 2);
        assert!(outbox.is_empty());
        assert_eq!(backend.user_named("sam").map(|u| u.basket.len()), Some(2));
    }

    #[tokio::test]
    async fn edit_and_checkout_wait_for_catalog() {
        let (backend, outbox, cupboard) = setup(vec![need(1, 10, 0)]);
        cupboard.add_to_basket(&need(1, 10, 0), 2).await;
        backend.fail_operation("list_needs");

        let fresh = Cupboard::new(backend.clone(), outbox.clone(), UserId(7));
        fresh.open_basket().await;
        let entry = fresh.entry_at(0).await.unwrap();

        assert_eq!(fresh.edit_count(entry, 4).await, ReconcileOutcome::CatalogUnavailable);
        let report = fresh.checkout().await;
        assert!(report.committed.is_empty());
        assert_eq!(report.residue.len(), 1);
        assert_eq!(fresh.basket().await.len(), 1);
        assert!(outbox.is_empty());
    }

    #[tokio::test]
    async fn search_empty_term_lists_all() {
        let (_, _, cupboard) = setup(vec![named_need(1, "Coats", 5), named_need(2, "Soap", 5)]);

        assert_eq!(cupboard.search("  ").await.len(), 2);
        assert_eq!(cupboard.search("coat").await.len(), 1);
        // Searching leaves the cached catalog alone
        assert_eq!(cupboard.needs().await.len(), 2);
    }

    #[tokio::test]
    async fn search_failure_is_empty() {
        let (backend, _, cupboard) = setup(vec![named_need(1, "Coats", 5)]);
        backend.fail_operation("search_needs");
        assert!(cupboard.search("coat").await.is_empty());
    }

    #[tokio::test]
    async fn add_to_basket_requests_at_least_one() {
        let (backend, _, cupboard) = setup(vec![need(1, 10, 0)]);

        assert!(cupboard.add_to_basket(&need(1, 10, 0), 0).await);

        let basket = cupboard.basket().await;
        assert_eq!(basket.len(), 1);
        assert_eq!(basket[0].count, 1);
        assert_eq!(backend.calls(), vec!["add_to_basket", "set_basket_count"]);
    }

    #[tokio::test]
    async fn add_to_basket_failure_leaves_basket() {
        let (backend, _, cupboard) = setup(vec![need(1, 10, 0)]);
        backend.fail_operation("set_basket_count");

        assert!(!cupboard.add_to_basket(&need(1, 10, 0), 3).await);
        assert!(cupboard.basket().await.is_empty());
    }

    #[tokio::test]
    async fn open_basket_drops_vanished_needs() {
        let (backend, outbox, cupboard) = setup(vec![need(1, 10, 2), need(2, 10, 0)]);
        cupboard.add_to_basket(&need(1, 10, 0), 2).await;
        cupboard.add_to_basket(&need(2, 10, 0), 1).await;
        backend.remove_need(NeedId(2));

        let basket = cupboard.open_basket().await;

        assert_eq!(basket.len(), 1);
        assert_eq!(basket[0].need.quantity, 2);
        assert!(matches!(
            outbox.writes().as_slice(),
            [RemoteWrite::RemoveFromBasket { need, .. }] if need.id == NeedId(2)
        ));
    }

    #[tokio::test]
    async fn open_basket_keeps_local_when_backend_fails() {
        let (backend, _, cupboard) = setup(vec![need(1, 10, 0)]);
        cupboard.refresh_catalog().await;
        cupboard.add_to_basket(&need(1, 10, 0), 2).await;
        backend.fail_operation("get_basket");

        assert_eq!(cupboard.open_basket().await.len(), 1);
    }

    #[tokio::test]
    async fn edit_and_checkout() {
        let (_, outbox, cupboard) = setup(vec![need(1, 10, 7)]);
        cupboard.refresh_catalog().await;
        cupboard.add_to_basket(&need(1, 10, 7), 1).await;
        let entry = cupboard.entry_at(0).await.unwrap();

        let outcome = cupboard.edit_count(entry, 5).await;
        assert_eq!(outcome, ReconcileOutcome::Applied { count: 3, clamped: true });

        let report = cupboard.checkout().await;
        assert_eq!(report.committed, vec![NeedId(1)]);
        assert_eq!(cupboard.need(NeedId(1)).await.map(|n| n.quantity), Some(10));
        assert!(!cupboard.checkout_blocked().await);
        assert_eq!(outbox.len(), 3);
    }

    #[tokio::test]
    async fn remove_entry() {
        let (_, _, cupboard) = setup(vec![need(1, 10, 0)]);
        cupboard.add_to_basket(&need(1, 10, 0), 1).await;
        let entry = cupboard.entry_at(0).await.unwrap();

        assert!(cupboard.remove(entry).await);
        assert!(!cupboard.remove(entry).await);
        assert!(cupboard.entry_at(0).await.is_none());
    }
}
