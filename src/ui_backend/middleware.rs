//! Command Middleware
//!
//! Provides a pipeline pattern for processing commands with logging,
//! validation, and transformation capabilities.

use super::commands::Command;
use super::state::ScreenState;

/// Result of middleware processing
#[derive(Debug, Clone)]
pub enum MiddlewareResult {
    /// Continue processing with this command
    Continue(Command),
    /// Transform the command into another command
    Transform(Command),
    /// Block this command from being processed
    Block,
}

/// Middleware function type
pub type MiddlewareFn =
    Box<dyn Fn(&Command, &ScreenState) -> MiddlewareResult + Send + Sync + 'static>;

/// Command pipeline that applies middlewares in sequence
pub struct CommandPipeline {
    middlewares: Vec<MiddlewareFn>,
}

impl CommandPipeline {
    /// Create a new empty pipeline
    pub fn new() -> Self {
        Self {
            middlewares: Vec::new(),
        }
    }

    /// Logging, normalization and validation, in that order
    pub fn standard() -> Self {
        Self::new()
            .with_middleware(Box::new(logging_middleware))
            .with_middleware(Box::new(normalization_middleware))
            .with_middleware(Box::new(validation_middleware))
    }

    /// Add a middleware to the pipeline
    pub fn with_middleware(mut self, middleware: MiddlewareFn) -> Self {
        self.middlewares.push(middleware);
        self
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Process a command through the middleware pipeline
    ///
    /// Returns Some(Command) if the command should be processed,
    /// None if it was blocked by a middleware.
    pub fn process(&self, cmd: Command, state: &ScreenState) -> Option<Command> {
        let mut current = cmd;

        for middleware in &self.middlewares {
            match middleware(&current, state) {
                MiddlewareResult::Continue(c) => current = c,
                MiddlewareResult::Transform(c) => current = c,
                MiddlewareResult::Block => return None,
            }
        }

        Some(current)
    }
}

impl Default for CommandPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CommandPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandPipeline")
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}

// ========== Built-in Middlewares ==========

/// Logging middleware - logs all commands
pub fn logging_middleware(cmd: &Command, _state: &ScreenState) -> MiddlewareResult {
    tracing::debug!(command = cmd.display_name(), target_id = ?cmd.target_id(), "Processing command");
    MiddlewareResult::Continue(cmd.clone())
}

/// Validation middleware - blocks commands that cannot change anything
pub fn validation_middleware(cmd: &Command, state: &ScreenState) -> MiddlewareResult {
    match cmd {
        Command::AddNewItem => {
            if state.new_item_input_text.trim().is_empty() {
                tracing::debug!("Blocked add: input is blank");
                return MiddlewareResult::Block;
            }
        }
        Command::SubmitItemEdit(item) => {
            if item.name.trim().is_empty() {
                tracing::debug!(id = %item.id, "Blocked submit: name is blank");
                return MiddlewareResult::Block;
            }
        }
        // Submit is checked against the repository by its handler
        Command::EditItem(_)
        | Command::UpdateItemText { .. }
        | Command::ToggleChecked(_)
        | Command::DeleteItem(_) => {
            if let Some(id) = cmd.target_id() {
                if state.item(id).is_none() {
                    tracing::debug!(id = %id, command = cmd.display_name(), "Blocked: unknown item");
                    return MiddlewareResult::Block;
                }
            }
        }
        Command::UpdateNewItemInputText(_) => {}
    }

    MiddlewareResult::Continue(cmd.clone())
}

/// Normalization middleware - single-line input, trimmed submissions
pub fn normalization_middleware(cmd: &Command, _state: &ScreenState) -> MiddlewareResult {
    match cmd {
        Command::UpdateNewItemInputText(text) if text.contains(['\n', '\r']) => {
            MiddlewareResult::Transform(Command::UpdateNewItemInputText(single_line(text)))
        }
        Command::UpdateItemText { id, text } if text.contains(['\n', '\r']) => {
            MiddlewareResult::Transform(Command::UpdateItemText {
                id: *id,
                text: single_line(text),
            })
        }
        Command::SubmitItemEdit(item) if item.name.trim() != item.name => {
            let mut trimmed = item.clone();
            trimmed.name = item.name.trim().to_string();
            MiddlewareResult::Transform(Command::SubmitItemEdit(trimmed))
        }
        _ => MiddlewareResult::Continue(cmd.clone()),
    }
}

fn single_line(text: &str) -> String {
    text.split(['\n', '\r'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{TodoId, TodoRecord};
    use crate::ui_backend::state::TodoUiItem;

    fn state_with_item() -> (ScreenState, TodoUiItem) {
        let item = TodoUiItem::from_record(&TodoRecord::new(1u64, "milk"), false);
        let state = ScreenState {
            new_item_input_text: String::new(),
            todo_list_items: vec![item.clone()],
        };
        (state, item)
    }

    #[test]
    fn test_pipeline_empty() {
        let pipeline = CommandPipeline::new();
        let state = ScreenState::default();

        let result = pipeline.process(Command::AddNewItem, &state);
        assert!(matches!(result, Some(Command::AddNewItem)));
    }

    #[test]
    fn test_pipeline_with_logging() {
        let pipeline = CommandPipeline::new().with_middleware(Box::new(logging_middleware));
        let state = ScreenState::default();

        let result = pipeline.process(Command::UpdateNewItemInputText("x".into()), &state);
        assert!(result.is_some());
    }

    #[test]
    fn test_validation_blocks_blank_add() {
        let pipeline = CommandPipeline::new().with_middleware(Box::new(validation_middleware));
        let mut state = ScreenState::default();
        state.new_item_input_text = "   ".into();

        assert!(pipeline.process(Command::AddNewItem, &state).is_none());

        state.new_item_input_text = "Buy milk".into();
        assert!(pipeline.process(Command::AddNewItem, &state).is_some());
    }

    #[test]
    fn test_validation_blocks_unknown_item() {
        let pipeline = CommandPipeline::new().with_middleware(Box::new(validation_middleware));
        let (state, item) = state_with_item();

        let mut stranger = item.clone();
        stranger.id = TodoId::new(99);

        assert!(pipeline
            .process(Command::ToggleChecked(stranger.clone()), &state)
            .is_none());
        assert!(pipeline
            .process(Command::DeleteItem(stranger), &state)
            .is_none());
        assert!(pipeline
            .process(Command::ToggleChecked(item), &state)
            .is_some());
    }

    #[test]
    fn test_validation_leaves_unknown_submit_to_handler() {
        let pipeline = CommandPipeline::new().with_middleware(Box::new(validation_middleware));
        let (state, mut item) = state_with_item();
        item.id = TodoId::new(99);

        assert!(pipeline
            .process(Command::SubmitItemEdit(item), &state)
            .is_some());
    }

    #[test]
    fn test_normalization_trims_submitted_name() {
        let pipeline = CommandPipeline::new().with_middleware(Box::new(normalization_middleware));
        let (state, mut item) = state_with_item();
        item.name = "  oat milk ".into();

        match pipeline.process(Command::SubmitItemEdit(item), &state) {
            Some(Command::SubmitItemEdit(submitted)) => assert_eq!(submitted.name, "oat milk"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_normalization_flattens_newlines() {
        let pipeline = CommandPipeline::new().with_middleware(Box::new(normalization_middleware));
        let state = ScreenState::default();

        let result = pipeline.process(
            Command::UpdateNewItemInputText("buy\nmilk".into()),
            &state,
        );
        assert_eq!(
            result,
            Some(Command::UpdateNewItemInputText("buy milk".into()))
        );
    }

    #[test]
    fn test_standard_pipeline_order() {
        let pipeline = CommandPipeline::standard();
        assert_eq!(pipeline.len(), 3);

        // Normalization runs before validation, so a whitespace-only name is blocked
        let (state, mut item) = state_with_item();
        item.name = "   ".into();
        assert!(pipeline
            .process(Command::SubmitItemEdit(item), &state)
            .is_none());
    }
}
