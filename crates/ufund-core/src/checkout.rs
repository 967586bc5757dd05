//! Checkout engine
//!
//! One pass over the basket in order. An entry commits when its count
//! still fits under the need's ceiling; otherwise it stays behind as
//! residue. The catalog is re-read for every entry, so entries for the
//! same need see each other's commits.

use crate::basket::{BasketEntry, BasketStore};
use crate::catalog::NeedCatalog;
use crate::outbox::{Outbox, RemoteWrite};
use ufund_model::NeedId;

/// Result of one checkout pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutReport {
    /// Needs committed, in basket order
    pub committed: Vec<NeedId>,
    /// Entries that did not fit; the basket now holds exactly these
    pub residue: Vec<BasketEntry>,
}

impl CheckoutReport {
    /// Whether some entries could not be fulfilled
    #[inline]
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        !self.residue.is_empty()
    }
}

/// Run a checkout pass
pub fn checkout(
    basket: &mut BasketStore,
    catalog: &mut NeedCatalog,
    outbox: &dyn Outbox,
) -> CheckoutReport {
    basket.set_blocked(false);
    let user = basket.user();
    let mut report = CheckoutReport::default();

    for mut entry in basket.entries().to_vec() {
        match catalog.get(entry.need_id()) {
            Some(current) => entry.need = current.clone(),
            None => {
                tracing::warn!(%user, need_id = %entry.need_id(), "need missing from catalog, using basket snapshot");
            }
        }

        if !entry.need.can_absorb(entry.count) {
            tracing::debug!(
                %user,
                need_id = %entry.need_id(),
                count = entry.count,
                remaining = entry.need.remaining(),
                "entry exceeds capacity"
            );
            report.residue.push(entry);
            continue;
        }

        let total = entry.need.quantity + entry.count;
        entry.need.quantity = total;
        catalog.set_quantity(entry.need_id(), total);
        outbox.enqueue(RemoteWrite::PersistNeed(entry.need.clone()));
        outbox.enqueue(RemoteWrite::RemoveFromBasket {
            user,
            need: entry.need.clone(),
        });
        report.committed.push(entry.need_id());
    }

    basket.replace(report.residue.clone());
    basket.set_blocked(report.is_blocked());

    tracing::info!(
        %user,
        committed = report.committed.len(),
        residue = report.residue.len(),
        "checkout finished"
    );
    report
}
