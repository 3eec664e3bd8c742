//! Plain-text screen renderer for the interactive shell

use std::io::Write;

use anyhow::Result;
use colored::Colorize;

use crate::ui_backend::{ScreenState, TodoUiItem, UiRenderer};

/// Writes each screen snapshot as numbered lines
pub struct PlainTextRenderer<W: Write> {
    out: W,
    styled: bool,
    quit: bool,
}

impl<W: Write> PlainTextRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            styled: false,
            quit: false,
        }
    }

    /// Enable terminal colors
    pub fn styled(mut self, styled: bool) -> Self {
        self.styled = styled;
        self
    }

    pub fn request_quit(&mut self) {
        self.quit = true;
    }

    /// Write a free-form message line
    pub fn message(&mut self, text: &str) -> Result<()> {
        if self.styled {
            writeln!(self.out, "{}", text.dimmed())?;
        } else {
            writeln!(self.out, "{}", text)?;
        }
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn item_line(&self, row: usize, item: &TodoUiItem) -> String {
        let check = if item.completed { "[x]" } else { "[ ]" };
        let mut line = format!("{:>3}. {} {}", row, check, item.name);
        if item.is_being_modified {
            line.push_str("  (editing)");
        }
        if !self.styled {
            return line;
        }
        if item.is_being_modified {
            line.yellow().to_string()
        } else if item.completed {
            line.dimmed().strikethrough().to_string()
        } else {
            line
        }
    }
}

impl<W: Write> UiRenderer for PlainTextRenderer<W> {
    fn render(&mut self, state: &ScreenState) -> Result<()> {
        let header = format!("New item: [{}]", state.new_item_input_text);
        if self.styled {
            writeln!(self.out, "{}", header.bold())?;
        } else {
            writeln!(self.out, "{}", header)?;
        }

        if state.todo_list_items.is_empty() {
            writeln!(self.out, "  No items.")?;
        } else {
            for (index, item) in state.todo_list_items.iter().enumerate() {
                let line = self.item_line(index + 1, item);
                writeln!(self.out, "{}", line)?;
            }
        }

        writeln!(self.out, "{} remaining", state.remaining())?;
        self.out.flush()?;
        Ok(())
    }

    fn should_quit(&self) -> bool {
        self.quit
    }
}
