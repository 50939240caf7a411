use std::collections::HashMap;
use std::fmt;

use crate::error::StackModelError;
use crate::filter::TaskFilter;
use crate::id::TaskId;
use crate::task::Task;

/// Change notification emitted by a [`TaskStack`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackEvent {
    /// A task was appended to the front of the stack.
    TaskAdded(TaskId),
    /// A task left the stack. Carries the removed record.
    TaskRemoved(Task),
    /// A filter was applied and the visible subset changed.
    Filtered,
    /// The filter was cleared.
    Unfiltered,
}

type Observer = Box<dyn FnMut(&StackEvent)>;

/// Ordered collection of tasks, oldest first.
///
/// The last task is the most recent one and sits at the front of the card
/// stack. An optional [`TaskFilter`] narrows the tasks into a visible subset;
/// visible positions are what the layout works with.
#[derive(Default)]
pub struct TaskStack {
    tasks: Vec<Task>,
    filter: TaskFilter,
    visible: Vec<usize>,
    visible_index: HashMap<TaskId, usize>,
    observers: Vec<Observer>,
}

impl fmt::Debug for TaskStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskStack")
            .field("tasks", &self.tasks)
            .field("filter", &self.filter)
            .field("visible", &self.visible)
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[allow(clippy::missing_const_for_fn)]
impl TaskStack {
    /// Create an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a stack from tasks in recency order (oldest first).
    ///
    /// # Errors
    /// Returns [`StackModelError::DuplicateTask`] when two tasks share an id.
    pub fn from_tasks<I>(tasks: I) -> Result<Self, StackModelError>
    where
        I: IntoIterator<Item = Task>,
    {
        let mut stack = Self::new();
        for task in tasks {
            if stack.contains(task.id) {
                return Err(StackModelError::DuplicateTask(task.id));
            }
            stack.tasks.push(task);
            stack.rebuild_visible();
        }
        Ok(stack)
    }

    /// Register a callback invoked after every change.
    pub fn add_observer<F>(&mut self, observer: F)
    where
        F: FnMut(&StackEvent) + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// Append a task as the most recent one.
    ///
    /// # Errors
    /// Returns [`StackModelError::DuplicateTask`] when the id is already present.
    pub fn add_task(&mut self, task: Task) -> Result<(), StackModelError> {
        if self.contains(task.id) {
            return Err(StackModelError::DuplicateTask(task.id));
        }
        let id = task.id;
        self.tasks.push(task);
        self.rebuild_visible();
        self.notify(&StackEvent::TaskAdded(id));
        Ok(())
    }

    /// Remove a task and return it.
    ///
    /// # Errors
    /// Returns [`StackModelError::UnknownTask`] when no such task exists.
    pub fn remove_task(&mut self, id: TaskId) -> Result<Task, StackModelError> {
        let position = self
            .tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or(StackModelError::UnknownTask(id))?;
        let removed = self.tasks.remove(position);
        self.rebuild_visible();
        self.notify(&StackEvent::TaskRemoved(removed.clone()));
        Ok(removed)
    }

    /// Apply a filter. An empty filter behaves like [`Self::unfilter`].
    ///
    /// Returns whether the stack state changed.
    pub fn filter(&mut self, filter: TaskFilter) -> bool {
        if filter.is_empty() {
            return self.unfilter();
        }
        if self.filter == filter {
            return false;
        }
        self.filter = filter;
        self.rebuild_visible();
        self.notify(&StackEvent::Filtered);
        true
    }

    /// Clear the filter. Returns `false` when none was set.
    pub fn unfilter(&mut self) -> bool {
        if self.filter.is_empty() {
            return false;
        }
        self.filter = TaskFilter::default();
        self.rebuild_visible();
        self.notify(&StackEvent::Unfiltered);
        true
    }

    /// Whether a filter currently hides part of the stack.
    pub fn has_filter(&self) -> bool {
        !self.filter.is_empty()
    }

    /// Active filter.
    pub fn active_filter(&self) -> &TaskFilter {
        &self.filter
    }

    /// All tasks, oldest first, ignoring the filter.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Tasks passing the filter, oldest first.
    pub fn visible_tasks(&self) -> impl Iterator<Item = &Task> + '_ {
        self.visible.iter().filter_map(|&idx| self.tasks.get(idx))
    }

    /// Task at a visible position.
    pub fn visible_task(&self, position: usize) -> Option<&Task> {
        self.visible.get(position).and_then(|&idx| self.tasks.get(idx))
    }

    /// Number of tasks passing the filter.
    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    /// Visible position of a task, `None` when absent or filtered out.
    pub fn visible_index_of(&self, id: TaskId) -> Option<usize> {
        self.visible_index.get(&id).copied()
    }

    /// Look up a task by id, regardless of the filter.
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Mutable lookup by id.
    pub fn task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == id)
    }

    /// Whether the stack holds a task with this id.
    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|task| task.id == id)
    }

    /// Total number of tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the stack holds no tasks at all.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn rebuild_visible(&mut self) {
        self.visible.clear();
        self.visible_index.clear();

        for (idx, task) in self.tasks.iter().enumerate() {
            if self.filter.matches(task) {
                let pos = self.visible.len();
                self.visible.push(idx);
                self.visible_index.insert(task.id, pos);
            }
        }
    }

    fn notify(&mut self, event: &StackEvent) {
        for observer in &mut self.observers {
            observer(event);
        }
    }
}
