//! In-memory repository backend

use std::sync::Mutex;

use super::{
    lock_recovering, Collection, Mutation, RecordSubscription, RepositoryError, Subscribers,
    TodoId, TodoRecord, TodoRepository,
};

/// Repository that keeps records in process memory
#[derive(Default)]
pub struct InMemoryRepository {
    collection: Mutex<Collection>,
    subscribers: Subscribers,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with existing records. Duplicate ids are rejected.
    pub fn with_records(records: Vec<TodoRecord>) -> Result<Self, RepositoryError> {
        Ok(Self {
            collection: Mutex::new(Collection::seeded(records)?),
            subscribers: Subscribers::new(),
        })
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn mutate(&self, mutation: Mutation) -> Result<bool, RepositoryError> {
        let mut collection = lock_recovering(&self.collection, "Repository");
        let changed = collection.apply(mutation)?;
        if changed {
            self.subscribers.emit(&collection.records);
        }
        Ok(changed)
    }
}

impl std::fmt::Debug for InMemoryRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRepository")
            .field(
                "records",
                &lock_recovering(&self.collection, "Repository").records.len(),
            )
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl TodoRepository for InMemoryRepository {
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
