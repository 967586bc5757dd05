//! End-to-end basket flows
//!
//! Drives the cupboard facade against the in-memory backend with the
//! write-behind queue in between, then checks what the backend ends up
//! holding once the queue is flushed.

use pretty_assertions::assert_eq;
use std::sync::Arc;
use ufund_core::{
    Cupboard, ReconcileOutcome, RetryPolicy, SessionFlow, WriteBehindQueue, LoginOutcome,
};
use ufund_model::{NeedId, UserId};
use ufund_test_utils::{need, user, FakeBackend};

struct Harness {
    backend: Arc<FakeBackend>,
    queue: Arc<WriteBehindQueue>,
    cupboard: Cupboard,
}

async fn harness(cost: i32, quantity: i32) -> Harness {
    let backend = Arc::new(
        FakeBackend::new()
            .with_needs(vec![need(1, cost, quantity)])
            .with_user(user(7, "sam")),
    );
    let policy = RetryPolicy {
        max_attempts: 3,
        backoff_ms: 1,
    };
    let queue = Arc::new(WriteBehindQueue::spawn(backend.clone(), policy));
    let cupboard = Cupboard::new(backend.clone(), queue.clone(), UserId(7));
    cupboard.refresh_catalog().await;
    Harness {
        backend,
        queue,
        cupboard,
    }
}

fn remote_quantity(backend: &FakeBackend) -> Option<i32> {
    backend.need(NeedId(1)).map(|n| n.quantity)
}

fn remote_basket_len(backend: &FakeBackend) -> usize {
    backend.user_named("sam").map_or(0, |u| u.basket.len())
}

#[tokio::test]
async fn fulfillable_entry_commits_remotely() {
    let h = harness(10, 2).await;
    assert!(h.cupboard.add_to_basket(&need(1, 10, 2), 5).await);

    let report = h.cupboard.checkout().await;
    h.queue.flush().await.unwrap();

    assert_eq!(report.committed, vec![NeedId(1)]);
    assert!(report.residue.is_empty());
    assert_eq!(remote_quantity(&h.backend), Some(7));
    assert_eq!(remote_basket_len(&h.backend), 0);
    assert_eq!(h.queue.stats().applied, 2);
}

#[tokio::test]
async fn over_capacity_entry_stays_behind() {
    let h = harness(10, 8).await;
    h.cupboard.add_to_basket(&need(1, 10, 8), 5).await;

    let report = h.cupboard.checkout().await;
    h.queue.flush().await.unwrap();

    assert!(report.committed.is_empty());
    assert_eq!(report.residue.len(), 1);
    assert!(h.cupboard.checkout_blocked().await);
    assert_eq!(remote_quantity(&h.backend), Some(8));
    assert_eq!(remote_basket_len(&h.backend), 1);

    h.cupboard.dismiss_blocked().await;
    assert!(!h.cupboard.checkout_blocked().await);
    assert_eq!(h.cupboard.basket().await.len(), 1);
}

#[tokio::test]
async fn entries_on_one_need_commit_in_order() {
    let h = harness(10, 0).await;
    h.cupboard.add_to_basket(&need(1, 10, 0), 6).await;
    h.cupboard.add_to_basket(&need(1, 10, 0), 6).await;

    let report = h.cupboard.checkout().await;
    h.queue.flush().await.unwrap();

    assert_eq!(report.committed, vec![NeedId(1)]);
    assert_eq!(report.residue.len(), 1);
    assert_eq!(report.residue[0].need.quantity, 6);
    assert_eq!(remote_quantity(&h.backend), Some(6));
    assert_eq!(remote_basket_len(&h.backend), 1);
}

#[tokio::test]
async fn decrease_skips_capacity_check() {
    let h = harness(10, 8).await;
    h.cupboard.add_to_basket(&need(1, 10, 8), 5).await;
    let entry = h.cupboard.entry_at(0).await.unwrap();

    let outcome = h.cupboard.edit_count(entry, 3).await;
    h.queue.flush().await.unwrap();

    assert_eq!(outcome, ReconcileOutcome::Applied { count: 3, clamped: false });
    let stored = h.backend.user_named("sam").unwrap();
    assert_eq!(stored.basket[0].count, 3);
}

#[tokio::test]
async fn removal_is_local_even_when_remote_fails() {
    let h = harness(10, 0).await;
    h.cupboard.add_to_basket(&need(1, 10, 0), 2).await;
    h.backend.fail_operation("remove_from_basket");

    let entry = h.cupboard.entry_at(0).await.unwrap();
    assert!(h.cupboard.remove(entry).await);
    assert!(h.cupboard.basket().await.is_empty());

    h.queue.flush().await.unwrap();
    assert_eq!(h.queue.stats().failed, 1);
    assert_eq!(remote_basket_len(&h.backend), 1);

    // The next open picks the remote entry back up
    h.backend.recover_operation("remove_from_basket");
    assert_eq!(h.cupboard.open_basket().await.len(), 1);
}

#[tokio::test]
async fn transient_failures_are_retried() {
    let h = harness(10, 0).await;
    h.cupboard.add_to_basket(&need(1, 10, 0), 4).await;
    h.backend.fail_next(1);

    h.cupboard.checkout().await;
    let stats = h.queue.shutdown().await.unwrap();

    assert_eq!(stats.retried, 1);
    assert_eq!(stats.applied, 2);
    assert_eq!(stats.failed, 0);
    assert_eq!(remote_quantity(&h.backend), Some(4));
}

#[tokio::test]
async fn empty_checkout_changes_nothing() {
    let h = harness(10, 3).await;

    let report = h.cupboard.checkout().await;
    h.queue.flush().await.unwrap();

    assert!(report.committed.is_empty() && report.residue.is_empty());
    assert_eq!(h.queue.stats().enqueued, 0);
    assert_eq!(remote_quantity(&h.backend), Some(3));
}

#[tokio::test]
async fn restricted_user_cannot_log_in() {
    let mut restricted = user(8, "riley");
    restricted.restricted = true;
    let backend = Arc::new(FakeBackend::new().with_user(user(7, "sam")).with_user(restricted));
    let flow = SessionFlow::new(backend.clone());

    assert_eq!(flow.login("riley", "pw").await, LoginOutcome::Restricted);
    assert!(!backend.has_session("riley"));

    assert!(matches!(flow.login("sam", "pw").await, LoginOutcome::LoggedIn(u) if u.id == UserId(7)));
    assert!(flow.is_session_valid("sam").await);
}
