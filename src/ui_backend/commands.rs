//! User Commands
//!
//! Defines all possible user actions that can be triggered from the UI.

use super::state::TodoUiItem;
use crate::storage::TodoId;

/// User commands that can be executed
///
/// These represent user actions translated from input lines, button presses,
/// etc. The TodoService handles these commands and updates state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // ========== New Item Field ==========
    /// Replace the text of the "add new item" field
    UpdateNewItemInputText(String),

    /// Add the current field text as a new item
    AddNewItem,

    // ========== Inline Editing ==========
    /// Open the inline editor for an item
    EditItem(TodoUiItem),

    /// Live-type into an item's editor (not persisted)
    UpdateItemText { id: TodoId, text: String },

    /// Submit an item's editor
    SubmitItemEdit(TodoUiItem),

    // ========== Item Actions ==========
    /// Flip an item's completed flag
    ToggleChecked(TodoUiItem),

    /// Delete an item
    DeleteItem(TodoUiItem),
}

impl Command {
    /// Id of the item this command targets, if any
    pub fn target_id(&self) -> Option<TodoId> {
        match self {
            Command::UpdateNewItemInputText(_) | Command::AddNewItem => None,
            Command::UpdateItemText { id, .. } => Some(*id),
            Command::EditItem(item)
            | Command::SubmitItemEdit(item)
            | Command::ToggleChecked(item)
            | Command::DeleteItem(item) => Some(item.id),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Command::UpdateNewItemInputText(_) => "update-input",
            Command::AddNewItem => "add",
            Command::EditItem(_) => "edit",
            Command::UpdateItemText { .. } => "update-item-text",
            Command::SubmitItemEdit(_) => "submit-edit",
            Command::ToggleChecked(_) => "toggle",
            Command::DeleteItem(_) => "delete",
        }
    }
}

/// Result of a handled command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// State changed
    Applied,
    /// Preconditions not met; nothing changed
    Ignored,
}

impl CommandOutcome {
    pub fn is_applied(self) -> bool {
        self == CommandOutcome::Applied
    }
}
