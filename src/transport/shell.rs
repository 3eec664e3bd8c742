//! Interactive line-oriented shell
//!
//! Each input line maps to one or two service commands; the screen is
//! re-rendered whenever a new snapshot was published.

use std::io::Write;

use anyhow::Result;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use super::render::PlainTextRenderer;
use crate::ui_backend::{Command, CommandOutcome, ServiceError, TodoService, UiRenderer};

pub const HELP: &str = "\
Commands:
  type <text>        set the new-item field
  add [text]         add the new-item field (or <text>) as an item
  edit <n>           open the editor for row n
  text <n> <text>    type into row n's editor
  save <n>           submit row n's editor
  toggle <n>         check or uncheck row n
  rm <n>             delete row n
  list               show the list
  help               show this help
  quit               leave the shell";

/// One parsed shell line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellLine {
    Empty,
    Type(String),
    Add(Option<String>),
    Edit(usize),
    Text(usize, String),
    Save(usize),
    Toggle(usize),
    Remove(usize),
    List,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShellParseError {
    #[error("unknown command '{0}' (try 'help')")]
    UnknownCommand(String),

    #[error("'{0}' needs {1}")]
    MissingArgument(&'static str, &'static str),

    #[error("'{0}' is not a row number")]
    InvalidRow(String),
}

fn parse_row(command: &'static str, arg: &str) -> Result<usize, ShellParseError> {
    if arg.is_empty() {
        return Err(ShellParseError::MissingArgument(command, "a row number"));
    }
    arg.parse::<usize>()
        .ok()
        .filter(|row| *row > 0)
        .ok_or_else(|| ShellParseError::InvalidRow(arg.to_string()))
}

/// Parse one shell line. Leading and trailing whitespace is ignored.
pub fn parse_shell_line(line: &str) -> Result<ShellLine, ShellParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ShellLine::Empty);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_lowercase().as_str() {
        "type" => Ok(ShellLine::Type(rest.to_string())),
        "add" => Ok(ShellLine::Add((!rest.is_empty()).then(|| rest.to_string()))),
        "edit" => parse_row("edit", rest).map(ShellLine::Edit),
        "text" => {
            let (row, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            let row = parse_row("text", row)?;
            Ok(ShellLine::Text(row, text.trim_start().to_string()))
        }
        "save" => parse_row("save", rest).map(ShellLine::Save),
        "toggle" => parse_row("toggle", rest).map(ShellLine::Toggle),
        "rm" | "delete" => parse_row("rm", rest).map(ShellLine::Remove),
        "list" | "ls" => Ok(ShellLine::List),
        "help" | "?" => Ok(ShellLine::Help),
        "quit" | "exit" => Ok(ShellLine::Quit),
        other => Err(ShellParseError::UnknownCommand(other.to_string())),
    }
}

/// Translate a parsed line into the commands it stands for.
///
/// Row numbers are resolved against the current screen; `Err` carries a
/// message for the user when the row does not exist.
pub fn commands_for(line: &ShellLine, service: &TodoService) -> Result<Vec<Command>, String> {
    let screen = service.screen();
    let at = |row: usize| {
        screen
            .item_at_row(row)
            .cloned()
            .ok_or_else(|| format!("No item at row {}", row))
    };

    let commands = match line {
        ShellLine::Type(text) => vec![Command::UpdateNewItemInputText(text.clone())],
        ShellLine::Add(Some(text)) => vec![
            Command::UpdateNewItemInputText(text.clone()),
            Command::AddNewItem,
        ],
        ShellLine::Add(None) => vec![Command::AddNewItem],
        ShellLine::Edit(row) => vec![Command::EditItem(at(*row)?)],
        ShellLine::Text(row, text) => vec![Command::UpdateItemText {
            id: at(*row)?.id,
            text: text.clone(),
        }],
        ShellLine::Save(row) => vec![Command::SubmitItemEdit(at(*row)?)],
        ShellLine::Toggle(row) => vec![Command::ToggleChecked(at(*row)?)],
        ShellLine::Remove(row) => vec![Command::DeleteItem(at(*row)?)],
        ShellLine::Empty | ShellLine::List | ShellLine::Help | ShellLine::Quit => Vec::new(),
    };
    Ok(commands)
}

/// Run the shell until `quit`, end of input or Ctrl-C
pub async fn run_shell<R, W>(
    service: &mut TodoService,
    renderer: &mut PlainTextRenderer<W>,
    input: R,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut screen = service.subscribe();
    let mut lines = input.lines();

    renderer.message("Type 'help' for commands.")?;
    renderer.render(&screen.latest())?;

    while !renderer.should_quit() {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                tracing::debug!("Interrupted");
                None
            }
        };
        let Some(line) = line else {
            break;
        };

        let parsed = match parse_shell_line(&line) {
            Ok(parsed) => parsed,
            Err(e) => {
                renderer.message(&e.to_string())?;
                continue;
            }
        };

        match &parsed {
            ShellLine::Quit => {
                renderer.request_quit();
                continue;
            }
            ShellLine::Help => {
                renderer.message(HELP)?;
                continue;
            }
            ShellLine::List => {
                renderer.render(&screen.latest())?;
                continue;
            }
            _ => {}
        }

        let commands = match commands_for(&parsed, service) {
            Ok(commands) => commands,
            Err(message) => {
                renderer.message(&message)?;
                continue;
            }
        };

        let mut applied = false;
        for command in commands {
            match service.handle_command(command) {
                Ok(CommandOutcome::Applied) => applied = true,
                Ok(CommandOutcome::Ignored) => {}
                Err(ServiceError::Detached) => {
                    renderer.request_quit();
                    break;
                }
                Err(e) => renderer.message(&format!("Error: {}", e))?,
            }
        }

        if screen.has_changed() {
            renderer.render(&screen.latest())?;
        } else if !applied {
            renderer.message("(nothing changed)")?;
        }
    }

    service.shutdown();
    Ok(())
}
