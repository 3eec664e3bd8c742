//! Todo Service - Command Handlers
//!
//! Owns the screen store, the edit side table and the repository
//! subscription. Every handler either mutates the repository (and then
//! projects the resulting emissions) or mutates transient screen state
//! directly. Handlers take `&mut self`, so commands never interleave and each
//! one is fully projected before the next is admitted.

use std::sync::Arc;

use super::commands::{Command, CommandOutcome};
use super::errors::ServiceError;
use super::middleware::CommandPipeline;
use super::projector::{self, EditTable};
use super::state::{ScreenState, ScreenStore, ScreenSubscription, TodoUiItem};
use crate::config::StoreConfig;
use crate::storage::{
    IdGenerator, RecordSubscription, RepositoryError, TodoId, TodoRecord, TodoRepository,
};

/// Todo Service - state store plus command handlers for one screen session
pub struct TodoService {
    /// Authoritative record storage
    repository: Arc<dyn TodoRepository>,

    /// Record stream; `None` once shut down
    subscription: Option<RecordSubscription>,

    /// Published screen snapshots
    store: ScreenStore,

    /// Open inline editors, keyed by id
    edits: EditTable,

    ids: IdGenerator,
    pipeline: CommandPipeline,
    clear_input_on_add: bool,
}

impl std::fmt::Debug for TodoService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoService")
            .field("attached", &self.subscription.is_some())
            .field("version", &self.store.version())
            .field("open_editors", &self.edits.len())
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

impl TodoService {
    /// Create a service bound to `repository`.
    ///
    /// Subscribes immediately and projects the initial collection.
    pub fn new(repository: Arc<dyn TodoRepository>, config: &StoreConfig) -> Self {
        let subscription = repository.subscribe();
        let ids = IdGenerator::new(config.id_strategy, repository.last_issued_id());

        let mut service = Self {
            repository,
            subscription: Some(subscription),
            store: ScreenStore::new(),
            edits: EditTable::new(),
            ids,
            pipeline: CommandPipeline::standard(),
            clear_input_on_add: config.clear_input_on_add,
        };
        service.sync();
        service
    }

    /// Replace the middleware pipeline used by [`handle_command`]
    ///
    /// [`handle_command`]: TodoService::handle_command
    pub fn with_pipeline(mut self, pipeline: CommandPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Replace the id generator
    pub fn with_id_generator(mut self, ids: IdGenerator) -> Self {
        self.ids = ids;
        self
    }

    // ========== Observation ==========

    /// Latest screen snapshot
    pub fn screen(&self) -> Arc<ScreenState> {
        self.store.current()
    }

    /// Observe screen snapshots
    pub fn subscribe(&self) -> ScreenSubscription {
        self.store.subscribe()
    }

    /// Number of snapshots published so far
    pub fn version(&self) -> u64 {
        self.store.version()
    }

    pub fn repository(&self) -> &Arc<dyn TodoRepository> {
        &self.repository
    }

    pub fn is_editing(&self, id: TodoId) -> bool {
        self.edits.is_open(id)
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    // ========== Repository Stream ==========

    /// Project every queued repository emission. Returns how many were applied.
    pub fn sync(&mut self) -> usize {
        let mut applied = 0;
        while let Some(records) = self.subscription.as_mut().and_then(|s| s.try_recv()) {
            self.apply_records(&records);
            applied += 1;
        }
        applied
    }

    /// Wait for the next repository emission and project it.
    ///
    /// Picks up mutations made through other handles to the same repository.
    /// Returns `Ok(false)` once the repository has gone away.
    pub async fn pump(&mut self) -> Result<bool, ServiceError> {
        let subscription = self.subscription.as_mut().ok_or(ServiceError::Detached)?;
        match subscription.recv().await {
            Some(records) => {
                self.apply_records(&records);
                self.sync();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Unsubscribe from the repository. Later commands fail with `Detached`.
    pub fn shutdown(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
            tracing::debug!("Todo service detached from repository");
        }
    }

    fn apply_records(&mut self, records: &[TodoRecord]) {
        let items = projector::project(records, &mut self.edits);
        let current = self.store.current();
        self.store.publish(ScreenState {
            new_item_input_text: current.new_item_input_text.clone(),
            todo_list_items: items,
        });
    }

    fn reproject(&mut self) {
        let records = self.repository.records();
        self.apply_records(&records);
    }

    fn publish(&mut self, next: ScreenState) -> CommandOutcome {
        if self.store.publish(next) {
            CommandOutcome::Applied
        } else {
            CommandOutcome::Ignored
        }
    }

    fn ensure_attached(&self) -> Result<(), ServiceError> {
        if self.subscription.is_some() {
            Ok(())
        } else {
            Err(ServiceError::Detached)
        }
    }

    fn mutation_failed(action: &str, id: TodoId, err: RepositoryError) -> ServiceError {
        tracing::error!(id = %id, "Failed to {} todo: {}", action, err);
        ServiceError::Repository(err)
    }

    // ========== Command Dispatch ==========

    /// Run `command` through the middleware pipeline, then its handler.
    ///
    /// A command blocked by middleware is reported as `Ignored`.
    pub fn handle_command(&mut self, command: Command) -> Result<CommandOutcome, ServiceError> {
        self.ensure_attached()?;

        // Validate against the latest records, not a stale screen
        self.sync();
        let screen = self.store.current();
        let Some(command) = self.pipeline.process(command, &screen) else {
            return Ok(CommandOutcome::Ignored);
        };

        match command {
            Command::UpdateNewItemInputText(text) => self.update_new_item_input_text(text),
            Command::AddNewItem => self.on_add_new_item_button_click(),
            Command::EditItem(item) => self.on_edit_button_click(&item),
            Command::UpdateItemText { id, text } => self.update_item_text(id, text),
            Command::SubmitItemEdit(item) => self.on_update_item_submit(&item),
            Command::ToggleChecked(item) => self.toggle_checked(&item),
            Command::DeleteItem(item) => self.on_delete_button_click(&item),
        }
    }

    // ========== Handlers ==========

    /// Replace the text of the new-item field
    pub fn update_new_item_input_text(
        &mut self,
        text: impl Into<String>,
    ) -> Result<CommandOutcome, ServiceError> {
        self.ensure_attached()?;

        let current = self.store.current();
        Ok(self.publish(ScreenState {
            new_item_input_text: text.into(),
            todo_list_items: current.todo_list_items.clone(),
        }))
    }

    /// Add the new-item field text as a record
    pub fn on_add_new_item_button_click(&mut self) -> Result<CommandOutcome, ServiceError> {
        self.ensure_attached()?;

        let name = self.store.current().new_item_input_text.trim().to_string();
        if name.is_empty() {
            tracing::debug!("Add ignored: input is blank");
            return Ok(CommandOutcome::Ignored);
        }

        let record = TodoRecord::new(self.ids.next_id(), name);
        let id = record.id;
        self.repository
            .add_item(record)
            .map_err(|e| Self::mutation_failed("add", id, e))?;
        tracing::info!(id = %id, "Added todo");

        self.sync();
        if self.clear_input_on_add {
            let current = self.store.current();
            self.store.publish(ScreenState {
                new_item_input_text: String::new(),
                todo_list_items: current.todo_list_items.clone(),
            });
        }
        Ok(CommandOutcome::Applied)
    }

    /// Live-edit an item's name on screen without touching the repository
    pub fn update_item_text(
        &mut self,
        id: TodoId,
        text: impl Into<String>,
    ) -> Result<CommandOutcome, ServiceError> {
        self.ensure_attached()?;

        let text = text.into();
        let current = self.store.current();
        if current.item(id).is_none() {
            tracing::debug!(id = %id, "Item text ignored: unknown item");
            return Ok(CommandOutcome::Ignored);
        }

        self.edits.set_draft(id, text.clone());
        let next = current.with_item(id, |item| item.name = text);
        Ok(self.publish(next))
    }

    /// Submit an item's editor.
    ///
    /// A changed name is written to the repository; an unchanged name just
    /// closes the editor.
    pub fn on_update_item_submit(
        &mut self,
        item: &TodoUiItem,
    ) -> Result<CommandOutcome, ServiceError> {
        self.ensure_attached()?;

        let Some(stored) = self.repository.get(item.id) else {
            tracing::debug!(id = %item.id, "Submit ignored: item no longer exists");
            return Ok(CommandOutcome::Ignored);
        };

        let name = item.name.trim();
        if name.is_empty() {
            tracing::debug!(id = %item.id, "Submit ignored: name is blank");
            return Ok(CommandOutcome::Ignored);
        }

        if stored.name != name {
            let previous = self.edits.take(item.id);
            if let Err(e) = self.repository.update_item(item.id, name) {
                if let Some(entry) = previous {
                    self.edits.restore(item.id, entry);
                }
                return Err(Self::mutation_failed("rename", item.id, e));
            }
            tracing::info!(id = %item.id, "Renamed todo");

            if self.sync() == 0 {
                self.reproject();
            }
            return Ok(CommandOutcome::Applied);
        }

        // Unchanged name: cancel the edit without touching storage
        let was_open = self.edits.take(item.id).is_some();
        let next = self.store.current().with_item(item.id, |ui| {
            ui.is_being_modified = false;
            ui.name = stored.name.clone();
        });
        let published = self.store.publish(next);

        Ok(if was_open || published {
            CommandOutcome::Applied
        } else {
            CommandOutcome::Ignored
        })
    }

    /// Open the inline editor for an item
    pub fn on_edit_button_click(
        &mut self,
        item: &TodoUiItem,
    ) -> Result<CommandOutcome, ServiceError> {
        self.ensure_attached()?;

        let current = self.store.current();
        if current.item(item.id).is_none() || !self.edits.open(item.id) {
            return Ok(CommandOutcome::Ignored);
        }

        let next = current.with_item(item.id, |ui| ui.is_being_modified = true);
        self.store.publish(next);
        Ok(CommandOutcome::Applied)
    }

    /// Flip an item's completed flag
    pub fn toggle_checked(&mut self, item: &TodoUiItem) -> Result<CommandOutcome, ServiceError> {
        self.ensure_attached()?;

        let changed = self
            .repository
            .toggle_completed(item.id)
            .map_err(|e| Self::mutation_failed("toggle", item.id, e))?;
        if !changed {
            tracing::debug!(id = %item.id, "Toggle ignored: item no longer exists");
            return Ok(CommandOutcome::Ignored);
        }

        self.sync();
        Ok(CommandOutcome::Applied)
    }

    /// Delete an item
    pub fn on_delete_button_click(
        &mut self,
        item: &TodoUiItem,
    ) -> Result<CommandOutcome, ServiceError> {
        self.ensure_attached()?;

        let changed = self
            .repository
            .delete_item(item.id)
            .map_err(|e| Self::mutation_failed("delete", item.id, e))?;
        if !changed {
            tracing::debug!(id = %item.id, "Delete ignored: item no longer exists");
            return Ok(CommandOutcome::Ignored);
        }
        tracing::info!(id = %item.id, "Deleted todo");

        self.sync();
        Ok(CommandOutcome::Applied)
    }
}

impl Drop for TodoService {
    fn drop(&mut self) {
        self.shutdown();
    }
}
