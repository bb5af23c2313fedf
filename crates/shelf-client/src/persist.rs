//! # Offline Write Queue
//!
//! Mirrors cart and catalog changes into the offline store without making
//! the caller wait on disk.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Offline Write Queue                                │
//! │                                                                         │
//! │  controller ── enqueue(op) ───────────► bounded mpsc (capacity N)      │
//! │     │            never blocks;                  │                       │
//! │     │            full / closed → failed += 1    ▼                       │
//! │     │                               ┌───────────────────────┐          │
//! │     │                               │ OfflineWriter task    │          │
//! │     │                               │                       │          │
//! │     │                               │ for each command:     │          │
//! │     │                               │   attempt 1..=max     │          │
//! │     │                               │   exponential backoff │          │
//! │     │                               │   between attempts    │          │
//! │     │                               └──────────┬────────────┘          │
//! │     │                                          │                        │
//! │     ▼                                          ▼                        │
//! │  stats() / reports() / flush()        OfflineStore (SQLite)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commands are applied strictly in enqueue order. `flush` and `shutdown`
//! travel through the same queue, so they complete only after every write
//! enqueued before them. A catalog refresh is one `ReplaceAll` command no
//! matter how many records it carries.

use async_trait::async_trait;
use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use shelf_db::{OfflineRecordRepository, StoreName};

use crate::config::PersistSettings;
use crate::error::{ClientError, ClientResult};

const REPORT_CHANNEL_CAPACITY: usize = 64;

// =============================================================================
// Offline Store Seam
// =============================================================================

/// Keyed record storage the client mirrors its state into.
#[async_trait]
pub trait OfflineStore: Send + Sync {
    async fn put(&self, store: StoreName, key: &str, record: &Value) -> ClientResult<()>;

    async fn get(&self, store: StoreName, key: &str) -> ClientResult<Option<Value>>;

    /// Every record in `store`, in first-insert order.
    async fn get_all(&self, store: StoreName) -> ClientResult<Vec<Value>>;

    /// Returns whether a record was removed.
    async fn delete(&self, store: StoreName, key: &str) -> ClientResult<bool>;

    /// Atomically swaps the contents of `store` for `records`.
    async fn replace_all(&self, store: StoreName, records: &[(String, Value)]) -> ClientResult<()>;
}

#[async_trait]
impl OfflineStore for OfflineRecordRepository {
    async fn put(&self, store: StoreName, key: &str, record: &Value) -> ClientResult<()> {
        Ok(OfflineRecordRepository::put(self, store, key, record).await?)
    }

    async fn get(&self, store: StoreName, key: &str) -> ClientResult<Option<Value>> {
        Ok(OfflineRecordRepository::get(self, store, key).await?)
    }

    async fn get_all(&self, store: StoreName) -> ClientResult<Vec<Value>> {
        Ok(OfflineRecordRepository::get_all(self, store).await?)
    }

    async fn delete(&self, store: StoreName, key: &str) -> ClientResult<bool> {
        Ok(OfflineRecordRepository::delete(self, store, key).await?)
    }

    async fn replace_all(&self, store: StoreName, records: &[(String, Value)]) -> ClientResult<()> {
        Ok(OfflineRecordRepository::replace_all(self, store, records).await?)
    }
}

// =============================================================================
// Write Operations
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Put {
        store: StoreName,
        key: String,
        record: Value,
    },
    Delete {
        store: StoreName,
        key: String,
    },
    /// Swaps the whole store for a fresh snapshot, e.g. a catalog fetch.
    ReplaceAll {
        store: StoreName,
        records: Vec<(String, Value)>,
    },
}

impl WriteOp {
    pub fn put(store: StoreName, key: impl Into<String>, record: Value) -> Self {
        WriteOp::Put {
            store,
            key: key.into(),
            record,
        }
    }

    pub fn delete(store: StoreName, key: impl Into<String>) -> Self {
        WriteOp::Delete {
            store,
            key: key.into(),
        }
    }

    pub fn store(&self) -> StoreName {
        match self {
            WriteOp::Put { store, .. }
            | WriteOp::Delete { store, .. }
            | WriteOp::ReplaceAll { store, .. } => *store,
        }
    }

    /// Record key; `*` for a whole-store replace.
    pub fn key(&self) -> &str {
        match self {
            WriteOp::Put { key, .. } | WriteOp::Delete { key, .. } => key,
            WriteOp::ReplaceAll { .. } => "*",
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            WriteOp::Put { .. } => "put",
            WriteOp::Delete { .. } => "delete",
            WriteOp::ReplaceAll { .. } => "replace",
        }
    }

    async fn apply(&self, store: &dyn OfflineStore) -> ClientResult<()> {
        match self {
            WriteOp::Put { store: name, key, record } => store.put(*name, key, record).await,
            WriteOp::Delete { store: name, key } => store.delete(*name, key).await.map(|_| ()),
            WriteOp::ReplaceAll { store: name, records } => store.replace_all(*name, records).await,
        }
    }
}

/// Outcome of one write, published after its last attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteReport {
    pub op: WriteOp,
    pub attempts: u32,
    /// `None` on success.
    pub error: Option<String>,
}

impl WriteReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub enqueued: u64,
    pub completed: u64,
    pub failed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    enqueued: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> WriteStats {
        WriteStats {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

enum Command {
    Write(WriteOp),
    Flush(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

// =============================================================================
// Writer Task
// =============================================================================

/// Background task applying queued writes to an [`OfflineStore`].
pub struct OfflineWriter {
    store: Arc<dyn OfflineStore>,
    settings: PersistSettings,
    rx: mpsc::Receiver<Command>,
    counters: Arc<Counters>,
    reports: broadcast::Sender<WriteReport>,
}

/// Handle for enqueueing writes. Cheap to clone.
#[derive(Clone)]
pub struct OfflineWriterHandle {
    tx: mpsc::Sender<Command>,
    capacity: usize,
    counters: Arc<Counters>,
    reports: broadcast::Sender<WriteReport>,
}

impl OfflineWriter {
    /// Creates the writer and its handle. The writer does nothing until
    /// [`run`](Self::run) is polled.
    pub fn new(
        store: Arc<dyn OfflineStore>,
        settings: PersistSettings,
    ) -> (Self, OfflineWriterHandle) {
        let capacity = settings.queue_capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        let (reports, _) = broadcast::channel(REPORT_CHANNEL_CAPACITY);
        let counters = Arc::new(Counters::default());

        let writer = OfflineWriter {
            store,
            settings,
            rx,
            counters: counters.clone(),
            reports: reports.clone(),
        };

        let handle = OfflineWriterHandle {
            tx,
            capacity,
            counters,
            reports,
        };

        (writer, handle)
    }

    /// Creates the writer and spawns it on the current runtime.
    pub fn spawn(store: Arc<dyn OfflineStore>, settings: PersistSettings) -> OfflineWriterHandle {
        let (writer, handle) = Self::new(store, settings);
        tokio::spawn(writer.run());
        handle
    }

    /// Runs until shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        info!(
            capacity = self.settings.queue_capacity,
            max_attempts = self.settings.max_attempts,
            "Offline writer starting"
        );

        while let Some(command) = self.rx.recv().await {
            match command {
                Command::Write(op) => self.process(op).await,
                Command::Flush(ack) => {
                    let _ = ack.send(());
                }
                Command::Shutdown(ack) => {
                    // Close first so no write can slip in behind the drain.
                    self.rx.close();
                    while let Some(command) = self.rx.recv().await {
                        match command {
                            Command::Write(op) => self.process(op).await,
                            Command::Flush(ack) | Command::Shutdown(ack) => {
                                let _ = ack.send(());
                            }
                        }
                    }
                    let _ = ack.send(());
                    break;
                }
            }
        }

        info!("Offline writer stopped");
    }

    async fn process(&self, op: WriteOp) {
        let max_attempts = self.settings.max_attempts.max(1);
        let mut attempts = 0;
        let mut backoff = self.create_backoff();

        let error = loop {
            attempts += 1;
            match op.apply(self.store.as_ref()).await {
                Ok(()) => break None,
                Err(e) if attempts < max_attempts && e.is_retryable() => {
                    debug!(
                        op = op.kind(),
                        store = %op.store(),
                        key = %op.key(),
                        attempt = attempts,
                        error = %e,
                        "Offline write failed, retrying"
                    );
                    if let Some(delay) = backoff.next_backoff() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(e) => break Some(e.to_string()),
            }
        };

        match &error {
            None => {
                self.counters.completed.fetch_add(1, Ordering::Relaxed);
                debug!(op = op.kind(), store = %op.store(), key = %op.key(), "Offline write applied");
            }
            Some(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!(
                    op = op.kind(),
                    store = %op.store(),
                    key = %op.key(),
                    attempts,
                    error = %e,
                    "Offline write dropped"
                );
            }
        }

        // No subscribers is fine.
        let _ = self.reports.send(WriteReport {
            op,
            attempts,
            error,
        });
    }

    /// Retry delays double from `retry_backoff_ms` up to `max_backoff_ms`.
    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.settings.retry_backoff(),
            initial_interval: self.settings.retry_backoff(),
            max_interval: self.settings.max_backoff(),
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}

impl OfflineWriterHandle {
    /// Queues a write without waiting.
    ///
    /// A full or closed queue counts the write as failed and returns the
    /// reason; the caller's in-memory change stands either way.
    pub fn enqueue(&self, op: WriteOp) -> ClientResult<()> {
        let kind = op.kind();
        let store = op.store();
        let key = op.key().to_string();

        match self.tx.try_send(Command::Write(op)) {
            Ok(()) => {
                self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!(op = kind, store = %store, key = %key, "Offline write queue full");
                Err(ClientError::QueueFull {
                    capacity: self.capacity,
                })
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!(op = kind, store = %store, key = %key, "Offline writer has stopped");
                Err(ClientError::ShuttingDown)
            }
        }
    }

    pub fn put(&self, store: StoreName, key: impl Into<String>, record: Value) -> ClientResult<()> {
        self.enqueue(WriteOp::put(store, key, record))
    }

    pub fn delete(&self, store: StoreName, key: impl Into<String>) -> ClientResult<()> {
        self.enqueue(WriteOp::delete(store, key))
    }

    pub fn replace_all(&self, store: StoreName, records: Vec<(String, Value)>) -> ClientResult<()> {
        self.enqueue(WriteOp::ReplaceAll { store, records })
    }

    pub fn stats(&self) -> WriteStats {
        self.counters.snapshot()
    }

    /// Per-write outcomes from now on.
    pub fn reports(&self) -> broadcast::Receiver<WriteReport> {
        self.reports.subscribe()
    }

    /// Waits until every write enqueued before this call has been applied
    /// or dropped.
    pub async fn flush(&self) -> ClientResult<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(Command::Flush(ack_tx))
            .await
            .map_err(|_| ClientError::ShuttingDown)?;
        ack_rx
            .await
            .map_err(|_| ClientError::ChannelError("Flush acknowledgement dropped".into()))
    }

    /// Drains the queue and stops the writer. Later writes fail.
    pub async fn shutdown(&self) -> ClientResult<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(Command::Shutdown(ack_tx))
            .await
            .map_err(|_| ClientError::ShuttingDown)?;
        ack_rx
            .await
            .map_err(|_| ClientError::ChannelError("Shutdown acknowledgement dropped".into()))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
