//! uFund Core - basket reconciliation and checkout
//!
//! Keeps a user's cached catalog and basket consistent with the backend:
//! - Refreshes basket snapshots and clamps requested counts to capacity
//! - Commits fulfillable entries at checkout and reports the residue
//! - Hands remote writes to a write-behind queue with its own retries
//! - Runs the login, manager and chat flows over the client traits
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ufund_client::{ClientConfig, HttpBackend};
//! use ufund_core::{Cupboard, RetryPolicy, WriteBehindQueue};
//! use ufund_model::UserId;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = Arc::new(HttpBackend::new(&ClientConfig::default())?);
//! let queue = Arc::new(WriteBehindQueue::spawn(backend.clone(), RetryPolicy::default()));
//! let cupboard = Cupboard::new(backend, queue.clone(), UserId(7));
//!
//! cupboard.open_basket().await;
//! let report = cupboard.checkout().await;
//! println!("committed {} needs", report.committed.len());
//! queue.flush().await?;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

// Engines
pub mod basket;
pub mod catalog;
pub mod checkout;
pub mod outbox;
pub mod reconcile;

// Flows
pub mod admin;
pub mod chat;
pub mod cupboard;
pub mod session;

pub mod config;
pub mod error;

// Re-exports for convenience
pub use admin::{is_admin, AdminConsole};
pub use basket::{BasketEntry, BasketStore, EntryId};
pub use catalog::NeedCatalog;
pub use chat::ChatBox;
pub use checkout::{checkout, CheckoutReport};
pub use config::{RetryPolicy, UfundConfig, API_URL_ENV};
pub use cupboard::Cupboard;
pub use error::CoreError;
pub use outbox::{Outbox, QueueStats, RecordingOutbox, RemoteWrite, WriteBehindQueue};
pub use reconcile::{reconcile, reconcile_entry, ReconcileOutcome, RejectReason};
pub use session::{
    AccountOutcome, CurrentUser, LoginOutcome, ProfileOutcome, RecoveryOutcome, SessionFlow,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with uFund Core
    pub use crate::{
        BasketEntry, BasketStore, CheckoutReport, Cupboard, CurrentUser, EntryId, NeedCatalog,
        Outbox, ReconcileOutcome, SessionFlow, UfundConfig, WriteBehindQueue,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
