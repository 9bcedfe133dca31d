//! Remote store seam: the four primitives the arbitration protocol needs,
//! plus an in-memory implementation used by tests and same-process play.
//!
//! The protocol is agnostic to the transport behind the trait; anything
//! offering an atomic conditional write and push subscriptions can back it.

use crate::record::SessionRecord;
use async_trait::async_trait;
use derive_more::{Display, Error};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

/// Remote store failure with caller location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("store unavailable: {} at {}:{}", message, file, line)]
pub struct StoreError {
    /// Error message.
    pub message: String,
    /// Line number where the error was raised.
    pub line: u32,
    /// Source file where the error was raised.
    pub file: &'static str,
}

impl StoreError {
    /// Creates a new store error, capturing the caller's location.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// Result of a conditional update attempt.
#[derive(Debug, Clone)]
pub enum Commit {
    /// The mutation was applied; carries the record as committed.
    Committed(SessionRecord),
    /// The mutation was rejected; carries the record at commit time, or
    /// `None` when no record exists under the identifier.
    Aborted(Option<SessionRecord>),
}

/// Mutator passed to [`RemoteStore::conditional_update`]: inspects the
/// at-commit-time snapshot and either returns the replacement record or
/// `None` to abort.
pub type Mutator<'a> = &'a (dyn Fn(&SessionRecord) -> Option<SessionRecord> + Send + Sync);

/// The contract a backing store must offer the arbitration protocol.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Writes a brand-new record. Fails if the identifier is taken.
    async fn create(&self, id: &str, record: SessionRecord) -> Result<(), StoreError>;

    /// Reads the current record, or `None` if absent.
    async fn read(&self, id: &str) -> Result<Option<SessionRecord>, StoreError>;

    /// Atomic read-modify-write: the mutator sees the record as it stands
    /// at commit time, and its output is applied only if it accepts.
    ///
    /// A plain read-then-write is not an acceptable implementation; two
    /// writers racing between the read and the write must not both commit.
    async fn conditional_update(&self, id: &str, mutator: Mutator<'_>)
    -> Result<Commit, StoreError>;

    /// Replaces the record wholesale.
    async fn write(&self, id: &str, record: &SessionRecord) -> Result<(), StoreError>;

    /// Opens a push subscription. The current record is delivered first,
    /// followed by every subsequent write.
    async fn subscribe(&self, id: &str) -> Result<Subscription, StoreError>;
}

/// Live subscription to a session record.
///
/// Dropping the handle unsubscribes; no further snapshots are delivered.
pub struct Subscription {
    current: Option<SessionRecord>,
    rx: broadcast::Receiver<SessionRecord>,
}

impl Subscription {
    /// Waits for the next snapshot.
    ///
    /// Returns `None` once the store side has gone away. A lagged receiver
    /// skips ahead; consumers treat every snapshot as a full replacement,
    /// so dropped intermediates are harmless.
    pub async fn next(&mut self) -> Option<SessionRecord> {
        if let Some(record) = self.current.take() {
            return Some(record);
        }
        loop {
            match self.rx.recv().await {
                Ok(record) => return Some(record),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Subscription lagged; skipping to latest snapshot");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Cancels the subscription explicitly.
    pub fn cancel(self) {
        debug!("Subscription cancelled");
    }
}

struct Entry {
    record: SessionRecord,
    tx: broadcast::Sender<SessionRecord>,
}

/// In-memory store: a mutex-guarded map with broadcast fan-out.
///
/// Holding the map lock across the mutator makes `conditional_update`
/// genuinely atomic, which is all the arbitration protocol relies on.
#[derive(Clone, Default)]
pub struct MemoryStore {
    sessions: Arc<Mutex<HashMap<String, Entry>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    #[instrument(skip(self, record))]
    async fn create(&self, id: &str, record: SessionRecord) -> Result<(), StoreError> {
        let mut sessions = self.sessions.lock().unwrap();
        if sessions.contains_key(id) {
            warn!(session_id = id, "Session already exists");
            return Err(StoreError::new("session identifier already exists"));
        }
        let (tx, _) = broadcast::channel(16);
        sessions.insert(id.to_string(), Entry { record, tx });
        info!(session_id = id, "Created session record");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn read(&self, id: &str) -> Result<Option<SessionRecord>, StoreError> {
        let sessions = self.sessions.lock().unwrap();
        Ok(sessions.get(id).map(|entry| entry.record.clone()))
    }

    #[instrument(skip(self, mutator))]
    async fn conditional_update(
        &self,
        id: &str,
        mutator: Mutator<'_>,
    ) -> Result<Commit, StoreError> {
        let mut sessions = self.sessions.lock().unwrap();
        let Some(entry) = sessions.get_mut(id) else {
            debug!(session_id = id, "Conditional update against absent record");
            return Ok(Commit::Aborted(None));
        };
        match mutator(&entry.record) {
            Some(next) => {
                entry.record = next.clone();
                let _ = entry.tx.send(next.clone());
                debug!(session_id = id, "Conditional update committed");
                Ok(Commit::Committed(next))
            }
            None => {
                debug!(session_id = id, "Conditional update aborted");
                Ok(Commit::Aborted(Some(entry.record.clone())))
            }
        }
    }

    #[instrument(skip(self, record))]
    async fn write(&self, id: &str, record: &SessionRecord) -> Result<(), StoreError> {
        let mut sessions = self.sessions.lock().unwrap();
        let Some(entry) = sessions.get_mut(id) else {
            return Err(StoreError::new("session not found"));
        };
        entry.record = record.clone();
        let _ = entry.tx.send(record.clone());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn subscribe(&self, id: &str) -> Result<Subscription, StoreError> {
        let sessions = self.sessions.lock().unwrap();
        let Some(entry) = sessions.get(id) else {
            return Err(StoreError::new("session not found"));
        };
        Ok(Subscription {
            current: Some(entry.record.clone()),
            rx: entry.tx.subscribe(),
        })
    }
}
