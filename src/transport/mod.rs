//! Transport layer for terminal interaction

pub mod cli;
pub mod render;
pub mod shell;

pub use render::PlainTextRenderer;
