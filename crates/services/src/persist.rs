//! Debounced background persistence of a local edit buffer.
//!
//! Each view owns one `DebouncedPersister`. Every edit hands it a full snapshot via
//! [`DebouncedPersister::schedule`]; the snapshot replaces whatever was pending and
//! restarts the quiet period. Only the snapshot present when the quiet period runs out
//! uninterrupted is written. Writes are full overwrites on the server, so a failed write
//! is repaired by any later one.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use storage::repository::StorageError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Quiet period observed for quiz answer autosave.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(1200);

/// Undrained write outcomes kept per persister; newer outcomes are dropped once full.
pub const EVENT_CAPACITY: usize = 16;

/// Destination of debounced writes.
#[async_trait]
pub trait PersistSink: Send + Sync + 'static {
    type Payload: Clone + Send + Sync + 'static;

    /// Write the full payload, replacing what the server had.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    async fn persist(&self, payload: Self::Payload) -> Result<(), StorageError>;
}

/// Outcome of a background write, delivered in completion order.
#[derive(Debug)]
pub enum PersistEvent {
    Saved,
    Failed(StorageError),
}

impl PersistEvent {
    #[must_use]
    pub fn is_saved(&self) -> bool {
        matches!(self, PersistEvent::Saved)
    }
}

/// Single-slot debounce in front of a [`PersistSink`].
///
/// Write outcomes queue up to [`EVENT_CAPACITY`]; callers that never drain them only
/// lose the outcomes, never the writes. Dropping the persister aborts its timer task;
/// a write already on the wire is not recalled.
pub struct DebouncedPersister<S: PersistSink> {
    sink: Arc<S>,
    pending: watch::Sender<Option<S::Payload>>,
    events: mpsc::Receiver<PersistEvent>,
    worker: JoinHandle<()>,
}

impl<S: PersistSink> DebouncedPersister<S> {
    /// Start the timer task for `sink`.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    #[must_use]
    pub fn spawn(sink: S, quiet_period: Duration) -> Self {
        let sink = Arc::new(sink);
        let (pending, slot) = watch::channel(None);
        let (event_tx, events) = mpsc::channel(EVENT_CAPACITY);
        let worker = tokio::spawn(run_worker(
            Arc::clone(&sink),
            slot,
            event_tx,
            quiet_period,
        ));

        Self {
            sink,
            pending,
            events,
            worker,
        }
    }

    /// Replace the pending snapshot and restart the quiet period.
    pub fn schedule(&self, payload: S::Payload) {
        self.pending.send_replace(Some(payload));
    }

    /// Drop the pending snapshot, if any, without writing it.
    pub fn cancel(&self) {
        self.pending.send_if_modified(|slot| slot.take().is_some());
    }

    /// Write `payload` now, bypassing the timer. Any pending snapshot is discarded
    /// since `payload` supersedes it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    pub async fn flush(&self, payload: S::Payload) -> Result<(), StorageError> {
        self.cancel();
        self.sink.persist(payload).await
    }

    /// Wait for the next background write to complete.
    ///
    /// Pending forever if nothing is ever scheduled.
    pub async fn next_event(&mut self) -> Option<PersistEvent> {
        self.events.recv().await
    }

    /// Take an already completed background write outcome, if any.
    pub fn try_next_event(&mut self) -> Option<PersistEvent> {
        self.events.try_recv().ok()
    }
}

impl<S: PersistSink> Drop for DebouncedPersister<S> {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn run_worker<S: PersistSink>(
    sink: Arc<S>,
    mut slot: watch::Receiver<Option<S::Payload>>,
    events: mpsc::Sender<PersistEvent>,
    quiet_period: Duration,
) {
    while slot.changed().await.is_ok() {
        // Any further change restarts the quiet period.
        loop {
            tokio::select! {
                changed = slot.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
                () = tokio::time::sleep(quiet_period) => break,
            }
        }

        let latest = slot.borrow_and_update().clone();
        let Some(payload) = latest else {
            continue;
        };

        let event = match sink.persist(payload).await {
            Ok(()) => {
                tracing::debug!("autosave written");
                PersistEvent::Saved
            }
            Err(err) => {
                tracing::warn!(error = %err, "autosave failed; edits kept locally");
                PersistEvent::Failed(err)
            }
        };
        match events.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::debug!("autosave outcome dropped; event queue full");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => return,
        }
    }
}
