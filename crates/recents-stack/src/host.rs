//! Collaborators the engine calls out to.

use recents_core::{Task, TaskId};

/// Supplies and evicts task display data.
///
/// Loading is expected to be asynchronous; results come back through
/// [`crate::StackSynchronizer::on_task_data_changed`] on the event thread.
pub trait TaskDataSource {
    /// A card for `task` became visible; start loading its data.
    fn load_data(&mut self, task: &Task);

    /// The card for `task` went back to the pool; its data may be evicted.
    fn unload_data(&mut self, task: &Task);

    /// `task` was dismissed; forget any cached data.
    fn delete_data(&mut self, task: &Task);
}

/// Screen-level owner of the stack.
pub trait RecentsHost {
    /// A task was dismissed by the user and should be removed from the system.
    fn on_task_removed(&mut self, id: TaskId);

    /// The last task was dismissed.
    fn on_stack_empty(&mut self);

    /// The user tapped a card.
    fn on_task_launched(&mut self, _task: &Task) {}

    /// Engine state changed; schedule a frame.
    fn request_redraw(&mut self) {}

    /// Ask ancestors to stop intercepting the current pointer stream.
    fn request_disallow_intercept(&mut self, _disallow: bool) {}

    /// Hardware layers were switched on or off for the whole stack.
    fn set_hw_layers_hint(&mut self, _enabled: bool) {}
}
