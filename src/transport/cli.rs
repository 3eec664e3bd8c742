//! CLI transport for direct terminal interaction

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use super::render::PlainTextRenderer;
use super::shell;
use crate::config::{Config, StorageBackend};
use crate::storage::{InMemoryRepository, JsonFileRepository, TodoRepository};
use crate::ui_backend::{Command, CommandOutcome, TodoService, TodoUiItem};

/// Storage overrides given on the command line
#[derive(Debug, Clone, Default)]
pub struct StorageOverride {
    pub file: Option<PathBuf>,
    pub memory: bool,
}

impl StorageOverride {
    /// Fold the overrides into `config`
    pub fn apply(&self, config: &mut Config) {
        if self.memory {
            config.storage.backend = StorageBackend::Memory;
        } else if let Some(file) = &self.file {
            config.storage.backend = StorageBackend::File;
            config.storage.path = Some(file.clone());
        }
    }
}

/// Open the repository selected by `config`
pub fn build_repository(config: &Config) -> Result<Arc<dyn TodoRepository>> {
    match config.storage.backend {
        StorageBackend::Memory => {
            tracing::debug!("Using in-memory repository");
            Ok(Arc::new(InMemoryRepository::new()))
        }
        StorageBackend::File => {
            let path = config.storage.resolved_path();
            let repo = JsonFileRepository::open(&path)
                .with_context(|| format!("Failed to open todo file {}", path.display()))?;
            tracing::debug!("Using file repository at {}", repo.path().display());
            Ok(Arc::new(repo))
        }
    }
}

pub fn build_service(config: &Config) -> Result<TodoService> {
    let repository = build_repository(config)?;
    Ok(TodoService::new(repository, &config.store))
}

/// Run the interactive shell on stdin/stdout
pub async fn run_shell(config: &Config) -> Result<()> {
    let mut service = build_service(config)?;
    let stdout = io::stdout();
    let styled = stdout.is_terminal();
    let mut renderer = PlainTextRenderer::new(stdout.lock()).styled(styled);
    let input = tokio::io::BufReader::new(tokio::io::stdin());

    shell::run_shell(&mut service, &mut renderer, input).await
}

fn item_at(service: &TodoService, row: usize) -> Result<TodoUiItem> {
    match service.screen().item_at_row(row) {
        Some(item) => Ok(item.clone()),
        None => bail!("No item at row {}", row),
    }
}

fn report(outcome: CommandOutcome, done: &str) {
    match outcome {
        CommandOutcome::Applied => println!("{} {}", "✓".green(), done),
        CommandOutcome::Ignored => println!("{}", "Nothing changed".yellow()),
    }
}

/// Print the effective configuration as TOML, optionally saving it.
///
/// Saves to `target` when given, otherwise to the default config file.
pub fn run_config(config: &Config, save: bool, target: Option<&Path>) -> Result<()> {
    print!("{}", toml::to_string_pretty(config)?);

    if save {
        let saved = match target {
            Some(path) => {
                config.save_to(path)?;
                path.to_path_buf()
            }
            None => {
                config.save()?;
                Config::config_path()?
            }
        };
        println!("{} Saved to {}", "✓".green(), saved.display());
    }
    Ok(())
}

/// Print the list as a table or JSON
pub fn run_list(config: &Config, format: &str) -> Result<()> {
    let service = build_service(config)?;
    let screen = service.screen();

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&screen.todo_list_items)?);
        return Ok(());
    }

    if screen.todo_list_items.is_empty() {
        println!("No items.");
        return Ok(());
    }

    #[derive(Tabled)]
    struct ItemRow {
        #[tabled(rename = "#")]
        row: usize,
        #[tabled(rename = "Done")]
        done: &'static str,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Id")]
        id: String,
    }

    let rows: Vec<ItemRow> = screen
        .todo_list_items
        .iter()
        .enumerate()
        .map(|(index, item)| ItemRow {
            row: index + 1,
            done: if item.completed { "x" } else { "" },
            name: item.name.clone(),
            id: item.id.to_string(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
    println!("{} remaining", screen.remaining());
    Ok(())
}

pub fn run_add(config: &Config, text: &str) -> Result<()> {
    let mut service = build_service(config)?;
    service.handle_command(Command::UpdateNewItemInputText(text.to_string()))?;
    let outcome = service.handle_command(Command::AddNewItem)?;
    report(outcome, &format!("Added '{}'", text.trim()));
    Ok(())
}

pub fn run_toggle(config: &Config, row: usize) -> Result<()> {
    let mut service = build_service(config)?;
    let item = item_at(&service, row)?;
    let outcome = service.handle_command(Command::ToggleChecked(item.clone()))?;
    let state = if item.completed { "unchecked" } else { "checked" };
    report(outcome, &format!("{} '{}'", state, item.name));
    Ok(())
}

pub fn run_remove(config: &Config, row: usize) -> Result<()> {
    let mut service = build_service(config)?;
    let item = item_at(&service, row)?;
    let outcome = service.handle_command(Command::DeleteItem(item.clone()))?;
    report(outcome, &format!("Deleted '{}'", item.name));
    Ok(())
}

/// Rename through the editor flow: open, type, submit
pub fn run_rename(config: &Config, row: usize, text: &str) -> Result<()> {
    let mut service = build_service(config)?;
    let item = item_at(&service, row)?;

    service.handle_command(Command::EditItem(item.clone()))?;
    service.handle_command(Command::UpdateItemText {
        id: item.id,
        text: text.to_string(),
    })?;
    let edited = item_at(&service, row)?;
    let outcome = service.handle_command(Command::SubmitItemEdit(edited))?;
    report(outcome, &format!("Renamed '{}' to '{}'", item.name, text.trim()));
    Ok(())
}
