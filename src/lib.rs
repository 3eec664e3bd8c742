//! todo: single-screen to-do list manager
//!
//! This library provides:
//! - A reactive repository of todo records (in-memory or JSON file)
//! - A screen state store with command handlers and inline editing
//! - A line-oriented terminal front end

pub mod config;
pub mod storage;
pub mod transport;
pub mod ui_backend;

pub use config::Config;
pub use storage::{TodoId, TodoRecord, TodoRepository};
pub use ui_backend::{Command, CommandOutcome, ScreenState, TodoService};
