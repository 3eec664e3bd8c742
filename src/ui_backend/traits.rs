//! UI Renderer Trait
//!
//! Defines the interface that all frontends must implement.

use anyhow::Result;

use super::state::ScreenState;

/// Trait that all UI renderers must implement
///
/// Rendering is a pure function of the latest snapshot; renderers never
/// mutate state, they only issue commands.
pub trait UiRenderer {
    /// Render the given screen snapshot
    fn render(&mut self, state: &ScreenState) -> Result<()>;

    /// Check if the UI should quit
    fn should_quit(&self) -> bool;
}
