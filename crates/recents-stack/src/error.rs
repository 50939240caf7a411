//! Error types for the stack engine

use recents_core::{StackModelError, TaskId};

use crate::pool::HandleId;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, StackError>;

/// Pool invariant violations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PoolError {
    /// Released a handle that is already idle
    #[error("view handle {0:?} is not in use")]
    NotInUse(HandleId),

    /// Handle was never issued by this pool or has been trimmed
    #[error("unknown view handle {0:?}")]
    UnknownHandle(HandleId),
}

/// Errors raised by the synchronizer and gesture controller
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StackError {
    /// View pool bookkeeping failed
    #[error("view pool error: {0}")]
    Pool(#[from] PoolError),

    /// Task model rejected a mutation
    #[error("task stack error: {0}")]
    Model(#[from] StackModelError),

    /// Operation referenced a task that is not in the stack
    #[error("task {0} is not in the stack")]
    UnknownTask(TaskId),
}
