use crate::task::Task;

/// Case-insensitive substring matcher over a task's textual fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMatcher {
    needle: String,
}

impl TextMatcher {
    /// Normalize a query string into a matcher. Returns `None` for blank inputs.
    pub fn new(query: &str) -> Option<Self> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            needle: trimmed.to_lowercase(),
        })
    }

    /// Normalized query.
    #[must_use]
    pub fn needle(&self) -> &str {
        &self.needle
    }

    /// Determine whether the title, package or component contains the query.
    pub fn matches(&self, task: &Task) -> bool {
        task.title
            .as_deref()
            .is_some_and(|title| self.matches_field(title))
            || self.matches_field(&task.content.package)
            || self.matches_field(&task.content.component)
    }

    fn matches_field(&self, value: &str) -> bool {
        value.to_lowercase().contains(&self.needle)
    }
}
