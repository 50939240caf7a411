use crate::task::Task;
use crate::text_matcher::TextMatcher;

/// Predicate that narrows a [`crate::TaskStack`] to a visible subset.
///
/// All configured criteria must match. An empty filter accepts every task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Only keep tasks from this package.
    pub package: Option<String>,
    /// Only keep tasks whose text matches.
    pub text: Option<TextMatcher>,
}

impl TaskFilter {
    /// Keep tasks that share `task`'s package.
    #[must_use]
    pub fn same_package_as(task: &Task) -> Self {
        Self {
            package: Some(task.content.package.clone()),
            text: None,
        }
    }

    /// Keep tasks whose text matches `query`. Blank queries produce an empty filter.
    #[must_use]
    pub fn text(query: &str) -> Self {
        Self {
            package: None,
            text: TextMatcher::new(query),
        }
    }

    /// Whether the filter has no criteria.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.package.is_none() && self.text.is_none()
    }

    /// Evaluate the filter against a task.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(package) = &self.package
            && task.content.package != *package
        {
            return false;
        }
        self.text.as_ref().is_none_or(|matcher| matcher.matches(task))
    }
}
