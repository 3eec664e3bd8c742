//! Typed errors for the todo service
//!
//! Validation failures are not errors; handlers report them as
//! `CommandOutcome::Ignored`. Only contract violations and storage failures
//! surface here.

use thiserror::Error;

use crate::storage::RepositoryError;

/// Errors from TodoService
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Service is detached from its repository")]
    Detached,
}

impl ServiceError {
    /// Integrity violations should never happen given id generation
    pub fn is_integrity_violation(&self) -> bool {
        matches!(
            self,
            ServiceError::Repository(RepositoryError::DuplicateId(_))
                | ServiceError::Repository(RepositoryError::Corrupt { .. })
        )
    }
}
