//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`KanbanError`]
//! via `#[from]` (adapters box their errors into [`KanbanError::Storage`]).

use crate::automation::ActionType;

/// Top-level error shared by the domain, application and adapter layers.
#[derive(Debug, thiserror::Error)]
pub enum KanbanError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error("storage error: {0}")]
    Storage(Box<dyn std::error::Error + Send + Sync>),
}

/// A domain invariant was violated or a stored value could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("board id must not be empty")]
    EmptyBoardId,

    #[error("card title must not be empty")]
    EmptyTitle,

    #[error("automation rule has no trigger")]
    MissingTrigger,

    #[error("{0} requires a value")]
    MissingActionValue(ActionType),

    #[error("invalid due date {0:?}")]
    InvalidDueDate(String),

    #[error("unknown trigger type {0:?}")]
    UnknownTriggerType(String),

    #[error("unknown action type {0:?}")]
    UnknownActionType(String),

    #[error("unknown automation outcome {0:?}")]
    UnknownOutcome(String),
}

/// A record referenced by id does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}
