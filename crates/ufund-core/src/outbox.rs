//! Write-behind outbox for remote writes
//!
//! The engines mutate local state first and hand the matching remote write
//! to an [`Outbox`]. They never wait for the backend:
//! - [`RecordingOutbox`] keeps writes in memory (tests, dry runs)
//! - [`WriteBehindQueue`] applies them in FIFO order on a worker task,
//!   retrying transient failures per [`RetryPolicy`]

use crate::config::RetryPolicy;
use crate::error::CoreError;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use ufund_client::{Backend, ClientError};
use ufund_model::{Need, NeedId, UserId};

/// A remote write produced by a local mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteWrite {
    /// Set the requested count of a basket entry
    SetCount {
        /// Basket owner
        user: UserId,
        /// Need snapshot
        need: Need,
        /// New count
        count: i32,
    },
    /// Remove a need from a user's basket
    RemoveFromBasket {
        /// Basket owner
        user: UserId,
        /// Need snapshot
        need: Need,
    },
    /// Overwrite a catalog need
    PersistNeed(Need),
}

impl RemoteWrite {
    /// Short name for logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SetCount { .. } => "set_count",
            Self::RemoveFromBasket { .. } => "remove_from_basket",
            Self::PersistNeed(_) => "persist_need",
        }
    }

    /// Need the write concerns
    #[must_use]
    pub fn need_id(&self) -> NeedId {
        match self {
            Self::SetCount { need, .. }
            | Self::RemoveFromBasket { need, .. }
            | Self::PersistNeed(need) => need.id,
        }
    }

    /// Perform the write against the backend
    ///
    /// # Errors
    /// Whatever the backend call returns
    pub async fn apply(&self, backend: &dyn Backend) -> Result<(), ClientError> {
        match self {
            Self::SetCount { user, need, count } => {
                backend.set_basket_count(*user, need, *count).await?;
            }
            Self::RemoveFromBasket { user, need } => {
                backend.remove_from_basket(*user, need).await?;
            }
            Self::PersistNeed(need) => {
                backend.update_need(need).await?;
            }
        }
        Ok(())
    }
}

/// Sink for remote writes
pub trait Outbox: Send + Sync {
    /// Hand off a write; never blocks on the backend
    fn enqueue(&self, write: RemoteWrite);
}

/// Outbox that only records what it was given
#[derive(Debug, Default)]
pub struct RecordingOutbox {
    writes: Mutex<Vec<RemoteWrite>>,
}

impl RecordingOutbox {
    /// Create empty outbox
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every recorded write, oldest first
    #[must_use]
    pub fn writes(&self) -> Vec<RemoteWrite> {
        self.writes.lock().clone()
    }

    /// Take the recorded writes, leaving the outbox empty
    pub fn take(&self) -> Vec<RemoteWrite> {
        std::mem::take(&mut *self.writes.lock())
    }

    /// Number of recorded writes
    #[must_use]
    pub fn len(&self) -> usize {
        self.writes.lock().len()
    }

    /// Whether nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes.lock().is_empty()
    }
}

impl Outbox for RecordingOutbox {
    fn enqueue(&self, write: RemoteWrite) {
        self.writes.lock().push(write);
    }
}

/// Write-behind queue statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Writes accepted
    pub enqueued: u64,
    /// Writes the backend accepted
    pub applied: u64,
    /// Writes abandoned after the last attempt
    pub failed: u64,
    /// Retry attempts made
    pub retried: u64,
    /// Writes refused because the worker had stopped
    pub dropped: u64,
}

impl QueueStats {
    /// Writes accepted but not yet settled
    #[inline]
    #[must_use]
    pub fn pending(&self) -> u64 {
        self.enqueued.saturating_sub(self.applied + self.failed)
    }
}

enum Command {
    Write(RemoteWrite),
    Flush(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

/// FIFO write-behind queue drained by a background task
#[derive(Debug)]
pub struct WriteBehindQueue {
    sender: mpsc::UnboundedSender<Command>,
    stats: Arc<Mutex<QueueStats>>,
}

impl WriteBehindQueue {
    /// Spawn the worker on the current tokio runtime
    #[must_use]
    pub fn spawn(backend: Arc<dyn Backend>, policy: RetryPolicy) -> Self {
        let (sender, rx) = mpsc::unbounded_channel();
        let stats = Arc::new(Mutex::new(QueueStats::default()));

        tokio::spawn(run_worker(backend, policy, rx, Arc::clone(&stats)));

        Self { sender, stats }
    }

    /// Wait until every write enqueued so far has been settled
    ///
    /// # Errors
    /// `CoreError::QueueClosed` if the worker has stopped
    pub async fn flush(&self) -> Result<(), CoreError> {
        let (done, wait) = oneshot::channel();
        self.sender
            .send(Command::Flush(done))
            .map_err(|_| CoreError::QueueClosed)?;
        wait.await.map_err(|_| CoreError::QueueClosed)
    }

    /// Settle outstanding writes and stop the worker
    ///
    /// # Errors
    /// `CoreError::QueueClosed` if the worker had already stopped
    pub async fn shutdown(&self) -> Result<QueueStats, CoreError> {
        let (done, wait) = oneshot::channel();
        self.sender
            .send(Command::Shutdown(done))
            .map_err(|_| CoreError::QueueClosed)?;
        wait.await.map_err(|_| CoreError::QueueClosed)?;
        Ok(self.stats())
    }

    /// Current statistics
    #[must_use]
    pub fn stats(&self) -> QueueStats {
        *self.stats.lock()
    }
}

impl Outbox for WriteBehindQueue {
    fn enqueue(&self, write: RemoteWrite) {
        let kind = write.kind();
        let need_id = write.need_id();
        self.stats.lock().enqueued += 1;
        if self.sender.send(Command::Write(write)).is_err() {
            let mut stats = self.stats.lock();
            stats.enqueued -= 1;
            stats.dropped += 1;
            tracing::error!(kind, %need_id, "write-behind queue closed, dropping write");
        }
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Write(write) => f.debug_tuple("Write").field(write).finish(),
            Self::Flush(_) => f.write_str("Flush"),
            Self::Shutdown(_) => f.write_str("Shutdown"),
        }
    }
}

/// Worker loop (runs in separate tokio task)
async fn run_worker(
    backend: Arc<dyn Backend>,
    policy: RetryPolicy,
    mut rx: mpsc::UnboundedReceiver<Command>,
    stats: Arc<Mutex<QueueStats>>,
) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Write(write) => apply_with_retry(backend.as_ref(), policy, &write, &stats).await,
            Command::Flush(done) => {
                let _ = done.send(());
            }
            Command::Shutdown(done) => {
                rx.close();
                while let Ok(pending) = rx.try_recv() {
                    match pending {
                        Command::Write(write) => {
                            apply_with_retry(backend.as_ref(), policy, &write, &stats).await;
                        }
                        Command::Flush(waiter) | Command::Shutdown(waiter) => {
                            let _ = waiter.send(());
                        }
                    }
                }
                let _ = done.send(());
                break;
            }
        }
    }
    tracing::debug!("write-behind worker stopped");
}

async fn apply_with_retry(
    backend: &dyn Backend,
    policy: RetryPolicy,
    write: &RemoteWrite,
    stats: &Mutex<QueueStats>,
) {
    let kind = write.kind();
    let need_id = write.need_id();
    let mut attempt = 1;

    loop {
        match write.apply(backend).await {
            Ok(()) => {
                stats.lock().applied += 1;
                tracing::debug!(kind, %need_id, attempt, "remote write applied");
                return;
            }
            Err(error) if error.is_retryable() && attempt < policy.max_attempts => {
                stats.lock().retried += 1;
                tracing::warn!(kind, %need_id, attempt, %error, "remote write failed, retrying");
                tokio::time::sleep(policy.delay_after(attempt)).await;
                attempt += 1;
            }
            Err(error) => {
                stats.lock().failed += 1;
                tracing::error!(kind, %need_id, attempt, %error, "remote write abandoned");
                return;
            }
        }
    }
}
