use crate::id::TaskId;

/// Errors raised when mutating a [`crate::TaskStack`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StackModelError {
    /// A task with the same id is already present.
    #[error("task {0} is already in the stack")]
    DuplicateTask(TaskId),
    /// No task with the given id exists.
    #[error("task {0} is not in the stack")]
    UnknownTask(TaskId),
}
