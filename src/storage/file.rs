//! JSON file repository backend
//!
//! Records live in memory and are mirrored to a JSON document after every
//! mutation. The file is written (temp file + rename) before the in-memory
//! collection is committed, so a failed write leaves both untouched and emits
//! nothing.
//!
//! ```text
//! { "last_id": 7, "records": [ { "id": 1, "name": "...", "completed": false } ] }
//! ```
//!
//! `last_id` keeps deleted ids from being handed out again after a reopen.
//! A bare records array is still accepted on load.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::{
    lock_recovering, Collection, Mutation, RecordSubscription, RepositoryError, Subscribers,
    TodoId, TodoRecord, TodoRepository,
};

#[derive(Serialize)]
struct StoredFileRef<'a> {
    last_id: Option<TodoId>,
    records: &'a [TodoRecord],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredFile {
    Records(Vec<TodoRecord>),
    Document {
        #[serde(default)]
        last_id: Option<TodoId>,
        records: Vec<TodoRecord>,
    },
}

/// Repository persisted to a JSON file
pub struct JsonFileRepository {
    path: PathBuf,
    collection: Mutex<Collection>,
    subscribers: Subscribers,
}

impl JsonFileRepository {
    /// Open the store at `path`. A missing file is an empty collection.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let collection = if path.exists() {
            load_collection(&path)?
        } else {
            Collection::default()
        };

        tracing::info!(
            "Opened todo store {} ({} records)",
            path.display(),
            collection.records.len()
        );

        Ok(Self {
            path,
            collection: Mutex::new(collection),
            subscribers: Subscribers::new(),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn mutate(&self, mutation: Mutation) -> Result<bool, RepositoryError> {
        let mut collection = lock_recovering(&self.collection, "Repository");
        let mut next = collection.clone();
        if !next.apply(mutation)? {
            return Ok(false);
        }

        self.persist(&next)?;
        *collection = next;
        self.subscribers.emit(&collection.records);
        Ok(true)
    }

    fn persist(&self, collection: &Collection) -> Result<(), RepositoryError> {
        let stored = StoredFileRef {
            last_id: collection.last_id,
            records: &collection.records,
        };
        let json = serde_json::to_string_pretty(&stored).map_err(std::io::Error::other)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            tracing::warn!("Failed to replace {}: {}", self.path.display(), e);
            return Err(e.into());
        }
        Ok(())
    }
}

fn load_collection(path: &Path) -> Result<Collection, RepositoryError> {
    let corrupt = |reason: String| RepositoryError::Corrupt {
        path: path.to_path_buf(),
        reason,
    };

    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Collection::default());
    }

    let stored: StoredFile = serde_json::from_str(&content).map_err(|e| corrupt(e.to_string()))?;
    let (last_id, records) = match stored {
        StoredFile::Document { last_id, records } => (last_id, records),
        StoredFile::Records(records) => (None, records),
    };

    let mut collection = Collection::seeded(records).map_err(|e| corrupt(e.to_string()))?;
    collection.last_id = collection.last_id.max(last_id);
    Ok(collection)
}

impl std::fmt::Debug for JsonFileRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFileRepository")
            .field("path", &self.path)
            .field(
                "records",
                &lock_recovering(&self.collection, "Repository").records.len(),
            )
            .finish()
    }
}

impl TodoRepository for JsonFileRepository {
    fn subscribe(&self) -> RecordSubscription {
        let collection = lock_recovering(&self.collection, "Repository");
        self.subscribers.subscribe(collection.records.clone())
    }

    fn records(&self) -> Vec<TodoRecord> {
        lock_recovering(&self.collection, "Repository").records.clone()
    }

    fn last_issued_id(&self) -> Option<TodoId> {
        lock_recovering(&self.collection, "Repository").last_id
    }

    fn add_item(&self, record: TodoRecord) -> Result<(), RepositoryError> {
        self.mutate(Mutation::Add(record)).map(|_| ())
    }

    fn update_item(&self, id: TodoId, name: &str) -> Result<bool, RepositoryError> {
        self.mutate(Mutation::Rename {
            id,
            name: name.to_string(),
        })
    }

    fn delete_item(&self, id: TodoId) -> Result<bool, RepositoryError> {
        self.mutate(Mutation::Delete(id))
    }

    fn toggle_completed(&self, id: TodoId) -> Result<bool, RepositoryError> {
        self.mutate(Mutation::Toggle(id))
    }
}
