//! Screen State
//!
//! Immutable snapshots of everything the renderer needs, published through a
//! watch channel so observers always see the latest one.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use crate::storage::{TodoId, TodoRecord};

/// A record augmented with transient, never persisted display state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodoUiItem {
    pub id: TodoId,
    pub name: String,
    pub completed: bool,
    /// True exactly while the inline editor for this item is open
    pub is_being_modified: bool,
}

impl TodoUiItem {
    pub fn from_record(record: &TodoRecord, is_being_modified: bool) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            completed: record.completed,
            is_being_modified,
        }
    }
}

/// The complete data needed to render the screen at one instant
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ScreenState {
    pub new_item_input_text: String,
    /// Repository emission order
    pub todo_list_items: Vec<TodoUiItem>,
}

impl ScreenState {
    pub fn item(&self, id: TodoId) -> Option<&TodoUiItem> {
        self.todo_list_items.iter().find(|item| item.id == id)
    }

    /// Item at a 1-based row, as shown by the renderers
    pub fn item_at_row(&self, row: usize) -> Option<&TodoUiItem> {
        row.checked_sub(1)
            .and_then(|index| self.todo_list_items.get(index))
    }

    pub fn remaining(&self) -> usize {
        self.todo_list_items
            .iter()
            .filter(|item| !item.completed)
            .count()
    }

    /// Copy of this state with `f` applied to the item matching `id`
    pub(crate) fn with_item(&self, id: TodoId, f: impl FnOnce(&mut TodoUiItem)) -> Self {
        let mut next = self.clone();
        if let Some(item) = next.todo_list_items.iter_mut().find(|item| item.id == id) {
            f(item);
        }
        next
    }
}

/// Owner of the current [`ScreenState`] snapshot
#[derive(Debug)]
pub struct ScreenStore {
    tx: watch::Sender<Arc<ScreenState>>,
    version: u64,
}

impl Default for ScreenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(ScreenState::default()));
        Self { tx, version: 0 }
    }

    /// Latest snapshot
    pub fn current(&self) -> Arc<ScreenState> {
        self.tx.borrow().clone()
    }

    /// Number of snapshots published since creation
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Publish `next` if it differs from the current snapshot
    pub fn publish(&mut self, next: ScreenState) -> bool {
        if *self.current() == next {
            return false;
        }
        self.tx.send_replace(Arc::new(next));
        self.version += 1;
        tracing::trace!(version = self.version, "Screen state published");
        true
    }

    pub fn subscribe(&self) -> ScreenSubscription {
        ScreenSubscription {
            rx: self.tx.subscribe(),
        }
    }
}

/// Observer handle for screen snapshots. Drop or [`unsubscribe`] to stop.
///
/// [`unsubscribe`]: ScreenSubscription::unsubscribe
#[derive(Debug)]
pub struct ScreenSubscription {
    rx: watch::Receiver<Arc<ScreenState>>,
}

impl ScreenSubscription {
    /// Latest snapshot, marking it seen
    pub fn latest(&mut self) -> Arc<ScreenState> {
        self.rx.borrow_and_update().clone()
    }

    /// Whether a snapshot newer than the last one seen is available
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Wait for the next snapshot. `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<Arc<ScreenState>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    pub fn unsubscribe(self) {}
}
