//! Persistent storage for todo items
//!
//! The repository is the single writer of the authoritative record collection.
//! Every backend exposes the same [`TodoRepository`] contract:
//!
//! - `subscribe()` returns a stream that yields the full collection right away
//!   and again after each successful mutation
//! - mutations are synchronous and emit exactly once when they change state
//! - mutations that change nothing (unknown id, identical name) emit nothing
//!
//! Backends:
//!
//! ```text
//! InMemoryRepository      # Mutex<Vec<TodoRecord>>, lost on exit
//! JsonFileRepository      # same, mirrored to a JSON array on every mutation
//! ```

pub mod file;
pub mod ids;
pub mod memory;

use std::fmt;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::task::{Context, Poll};

use futures::Stream;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

pub use file::JsonFileRepository;
pub use ids::{IdGenerator, IdStrategy};
pub use memory::InMemoryRepository;

/// Identifier of a todo record. Opaque to callers, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(u64);

impl TodoId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for TodoId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single todo item as stored by the repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoRecord {
    pub id: TodoId,
    pub name: String,
    #[serde(default)]
    pub completed: bool,
}

impl TodoRecord {
    /// Create a new, not yet completed record
    pub fn new(id: impl Into<TodoId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            completed: false,
        }
    }
}

/// Errors raised by repository backends
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Duplicate todo id: {0}")]
    DuplicateId(TodoId),

    #[error("Corrupt todo store {}: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}

/// Storage contract shared by every backend
pub trait TodoRepository: Send + Sync {
    /// Subscribe to the record collection.
    ///
    /// The current collection is queued immediately, followed by one
    /// collection per successful mutation, in mutation order.
    fn subscribe(&self) -> RecordSubscription;

    /// Current collection, in emission order
    fn records(&self) -> Vec<TodoRecord>;

    /// Highest id ever added, including records deleted since
    fn last_issued_id(&self) -> Option<TodoId>;

    /// Look up a single record by id
    fn get(&self, id: TodoId) -> Option<TodoRecord> {
        self.records().into_iter().find(|record| record.id == id)
    }

    /// Insert a new record. Fails if the id is already present.
    fn add_item(&self, record: TodoRecord) -> Result<(), RepositoryError>;

    /// Rename a record in place. Returns `false` when nothing changed.
    fn update_item(&self, id: TodoId, name: &str) -> Result<bool, RepositoryError>;

    /// Remove a record. Returns `false` when the id was absent.
    fn delete_item(&self, id: TodoId) -> Result<bool, RepositoryError>;

    /// Flip `completed`. Returns `false` when the id was absent.
    fn toggle_completed(&self, id: TodoId) -> Result<bool, RepositoryError>;
}

/// A single change to the collection, applied identically by every backend
#[derive(Debug, Clone)]
pub(crate) enum Mutation {
    Add(TodoRecord),
    Rename { id: TodoId, name: String },
    Delete(TodoId),
    Toggle(TodoId),
}

impl Mutation {
    /// Apply to `records`. `Ok(false)` means the collection is unchanged.
    pub(crate) fn apply(self, records: &mut Vec<TodoRecord>) -> Result<bool, RepositoryError> {
        match self {
            Mutation::Add(record) => {
                if records.iter().any(|existing| existing.id == record.id) {
                    return Err(RepositoryError::DuplicateId(record.id));
                }
                records.push(record);
                Ok(true)
            }
            Mutation::Rename { id, name } => match records.iter_mut().find(|r| r.id == id) {
                Some(record) if record.name != name => {
                    record.name = name;
                    Ok(true)
                }
                _ => Ok(false),
            },
            Mutation::Delete(id) => {
                let before = records.len();
                records.retain(|record| record.id != id);
                Ok(records.len() != before)
            }
            Mutation::Toggle(id) => match records.iter_mut().find(|r| r.id == id) {
                Some(record) => {
                    record.completed = !record.completed;
                    Ok(true)
                }
                None => Ok(false),
            },
        }
    }
}

/// Records plus the highest id ever added to them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Collection {
    pub(crate) records: Vec<TodoRecord>,
    pub(crate) last_id: Option<TodoId>,
}

impl Collection {
    /// Build from seed records. Duplicate ids are rejected.
    pub(crate) fn seeded(records: Vec<TodoRecord>) -> Result<Self, RepositoryError> {
        let mut collection = Self::default();
        for record in records {
            collection.apply(Mutation::Add(record))?;
        }
        Ok(collection)
    }

    /// Apply `mutation`, raising the high-water mark on add
    pub(crate) fn apply(&mut self, mutation: Mutation) -> Result<bool, RepositoryError> {
        let added = match &mutation {
            Mutation::Add(record) => Some(record.id),
            _ => None,
        };
        let changed = mutation.apply(&mut self.records)?;
        if added.is_some() {
            self.last_id = self.last_id.max(added);
        }
        Ok(changed)
    }
}

/// Lock a mutex, recovering from poison
pub(crate) fn lock_recovering<'a, T>(mutex: &'a Mutex<T>, what: &str) -> MutexGuard<'a, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        tracing::warn!("{} lock was poisoned, recovering", what);
        poisoned.into_inner()
    })
}

type RecordSender = mpsc::UnboundedSender<Vec<TodoRecord>>;

#[derive(Default)]
struct SubscriberList {
    next_id: u64,
    senders: Vec<(u64, RecordSender)>,
}

/// Registry of live record subscriptions.
///
/// Backends call [`Subscribers::subscribe`] and [`Subscribers::emit`] while
/// holding their collection lock, so a subscriber never misses or reorders a
/// mutation.
#[derive(Default)]
pub(crate) struct Subscribers {
    inner: Arc<Mutex<SubscriberList>>,
}

impl Subscribers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn subscribe(&self, current: Vec<TodoRecord>) -> RecordSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        // Receiver is alive, cannot fail
        let _ = tx.send(current);

        let mut list = lock_recovering(&self.inner, "Subscriber list");
        let id = list.next_id;
        list.next_id += 1;
        list.senders.push((id, tx));
        tracing::debug!(subscription = id, "Record subscription opened");

        RecordSubscription {
            id,
            rx,
            registry: Arc::downgrade(&self.inner),
        }
    }

    pub(crate) fn emit(&self, records: &[TodoRecord]) {
        let mut list = lock_recovering(&self.inner, "Subscriber list");
        list.senders
            .retain(|(_, tx)| tx.send(records.to_vec()).is_ok());
    }

    pub(crate) fn len(&self) -> usize {
        lock_recovering(&self.inner, "Subscriber list").senders.len()
    }
}

/// Live subscription to a repository's record collection.
///
/// Implements [`Stream`]. Dropping it (or calling [`unsubscribe`]) detaches
/// it from the repository; nothing is delivered afterwards.
///
/// [`unsubscribe`]: RecordSubscription::unsubscribe
pub struct RecordSubscription {
    id: u64,
    rx: mpsc::UnboundedReceiver<Vec<TodoRecord>>,
    registry: Weak<Mutex<SubscriberList>>,
}

impl RecordSubscription {
    /// Wait for the next emission. `None` once the repository is gone.
    pub async fn recv(&mut self) -> Option<Vec<TodoRecord>> {
        self.rx.recv().await
    }

    /// Take the next queued emission without waiting
    pub fn try_recv(&mut self) -> Option<Vec<TodoRecord>> {
        self.rx.try_recv().ok()
    }

    /// Detach from the repository
    pub fn unsubscribe(self) {}
}

impl Drop for RecordSubscription {
    fn drop(&mut self) {
        self.rx.close();
        if let Some(registry) = self.registry.upgrade() {
            let mut list = lock_recovering(&registry, "Subscriber list");
            list.senders.retain(|(id, _)| *id != self.id);
            tracing::debug!(subscription = self.id, "Record subscription closed");
        }
    }
}

impl fmt::Debug for RecordSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordSubscription")
            .field("id", &self.id)
            .finish()
    }
}

impl Stream for RecordSubscription {
    type Item = Vec<TodoRecord>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}
