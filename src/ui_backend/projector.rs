//! Record → UI item projection
//!
//! Every repository emission is projected in full. Edit state lives in an
//! [`EditTable`] keyed by id rather than on the projected items, so a
//! mutation of one record never closes the editor of another.

use std::collections::{HashMap, HashSet};

use super::state::TodoUiItem;
use crate::storage::{TodoId, TodoRecord};

/// Open inline editor for one item
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditEntry {
    /// Text typed into the editor but not yet submitted
    pub draft: Option<String>,
}

/// Side table of open editors, keyed by record id
#[derive(Debug, Clone, Default)]
pub struct EditTable {
    entries: HashMap<TodoId, EditEntry>,
}

impl EditTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the editor for `id`. Returns `false` if it was already open.
    pub fn open(&mut self, id: TodoId) -> bool {
        if self.entries.contains_key(&id) {
            return false;
        }
        self.entries.insert(id, EditEntry::default());
        true
    }

    /// Close the editor for `id`, returning its entry
    pub fn take(&mut self, id: TodoId) -> Option<EditEntry> {
        self.entries.remove(&id)
    }

    pub fn restore(&mut self, id: TodoId, entry: EditEntry) {
        self.entries.insert(id, entry);
    }

    pub fn is_open(&self, id: TodoId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Record a draft for an open editor. Ignored when the editor is closed.
    pub fn set_draft(&mut self, id: TodoId, text: impl Into<String>) -> bool {
        match self.entries.get_mut(&id) {
            Some(entry) => {
                entry.draft = Some(text.into());
                true
            }
            None => false,
        }
    }

    pub fn draft(&self, id: TodoId) -> Option<&str> {
        self.entries.get(&id).and_then(|entry| entry.draft.as_deref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn retain_ids(&mut self, live: &HashSet<TodoId>) {
        self.entries.retain(|id, _| live.contains(id));
    }
}

/// Project `records` into UI items, merging open editors from `edits`.
///
/// Entries for ids that no longer exist are dropped from `edits`.
pub fn project(records: &[TodoRecord], edits: &mut EditTable) -> Vec<TodoUiItem> {
    let live: HashSet<TodoId> = records.iter().map(|record| record.id).collect();
    edits.retain_ids(&live);

    records
        .iter()
        .map(|record| {
            let mut item = TodoUiItem::from_record(record, edits.is_open(record.id));
            if let Some(draft) = edits.draft(record.id) {
                item.name = draft.to_string();
            }
            item
        })
        .collect()
}
