//! UI Backend - Backend-for-Frontend (BFF) Layer
//!
//! Keeps screen logic apart from rendering so any frontend (the line shell,
//! a one-shot command, a test) drives the same state store.
//!
//! ## Architecture
//!
//! - **TodoService**: Command handlers and repository subscription
//! - **ScreenStore**: Watch channel of immutable `ScreenState` snapshots
//! - **Projector**: Records plus open editors to UI items
//! - **Command**: User actions, run through a middleware pipeline
//! - **UiRenderer**: Trait that frontends implement

mod commands;
mod errors;
pub mod middleware;
pub mod projector;
mod service;
mod state;
mod traits;

pub use commands::{Command, CommandOutcome};
pub use errors::ServiceError;
pub use middleware::{
    logging_middleware, normalization_middleware, validation_middleware, CommandPipeline,
    MiddlewareFn, MiddlewareResult,
};
pub use projector::{EditEntry, EditTable};
pub use service::TodoService;
pub use state::{ScreenState, ScreenStore, ScreenSubscription, TodoUiItem};
pub use traits::UiRenderer;
