//! Id generation for new todo records

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::TodoId;

/// How fresh ids are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdStrategy {
    /// 64 bits folded from a v4 UUID
    #[default]
    Random,
    /// Monotonic counter starting after the highest existing id
    Sequential,
}

/// Produces ids for records created by the add command
#[derive(Debug, Clone, Default)]
pub enum IdGenerator {
    #[default]
    Random,
    Sequential { next: u64 },
}

impl IdGenerator {
    /// Build a generator that never returns `last_issued` or anything below it.
    ///
    /// Pass the repository's [`last_issued_id`] so ids of deleted records are
    /// not handed out again.
    ///
    /// [`last_issued_id`]: super::TodoRepository::last_issued_id
    pub fn new(strategy: IdStrategy, last_issued: Option<TodoId>) -> Self {
        match strategy {
            IdStrategy::Random => IdGenerator::Random,
            IdStrategy::Sequential => {
                let next = last_issued.map_or(1, |id| id.get().saturating_add(1));
                IdGenerator::Sequential { next }
            }
        }
    }

    pub fn next_id(&mut self) -> TodoId {
        match self {
            IdGenerator::Random => {
                let (high, low) = Uuid::new_v4().as_u64_pair();
                TodoId::new(high ^ low)
            }
            IdGenerator::Sequential { next } => {
                let id = TodoId::new(*next);
                *next = next.saturating_add(1);
                id
            }
        }
    }
}
