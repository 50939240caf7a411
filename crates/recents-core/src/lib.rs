//! Task model for the recents card stack: identifiers, tasks and the filterable stack.

/// Error types for stack mutations.
pub mod error;
/// Task filtering.
pub mod filter;
/// Identifier types.
pub mod id;
/// Ordered, observable collection of tasks.
pub mod stack;
/// Task records and their asynchronously loaded display data.
pub mod task;
/// Case-insensitive text matching.
pub mod text_matcher;

pub use error::StackModelError;
pub use filter::TaskFilter;
pub use id::TaskId;
pub use stack::{StackEvent, TaskStack};
pub use task::{Bitmap, ContentRef, Task, TaskData};
pub use text_matcher::TextMatcher;
