use crate::id::TaskId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Opaque reference to what a task runs: the owning package and its entry component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentRef {
    /// Package the task belongs to.
    pub package: String,
    /// Component inside the package that was launched.
    pub component: String,
}

impl ContentRef {
    /// Build a content reference.
    pub fn new(package: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            component: component.into(),
        }
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.package, self.component)
    }
}

/// Decoded image payload. Pixels are shared so cloning a task stays cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Raw pixel bytes, layout decided by the producer.
    pub pixels: Arc<[u8]>,
}

impl Bitmap {
    /// Wrap raw pixels.
    pub fn new(width: u32, height: u32, pixels: impl Into<Arc<[u8]>>) -> Self {
        Self {
            width,
            height,
            pixels: pixels.into(),
        }
    }
}

/// Display fields delivered by the data source once loading completes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskData {
    /// Label shown on the card header.
    pub title: Option<String>,
    /// Application icon.
    pub icon: Option<Bitmap>,
    /// Last captured screenshot of the task.
    pub thumbnail: Option<Bitmap>,
}

/// A running task shown as one card.
///
/// Equality and hashing only consider `id` and `content`; display fields
/// arrive out of order from the data source and must not affect identity.
#[derive(Debug, Clone)]
pub struct Task {
    /// Stable identifier, unique within a stack.
    pub id: TaskId,
    /// What the task runs.
    pub content: ContentRef,
    /// Loaded title, if any.
    pub title: Option<String>,
    /// Loaded icon, if any.
    pub icon: Option<Bitmap>,
    /// Loaded thumbnail, if any.
    pub thumbnail: Option<Bitmap>,
}

impl Task {
    /// Create a task whose display fields are still unloaded.
    #[must_use]
    pub const fn new(id: TaskId, content: ContentRef) -> Self {
        Self {
            id,
            content,
            title: None,
            icon: None,
            thumbnail: None,
        }
    }

    /// Overwrite display fields with freshly loaded data.
    pub fn apply(&mut self, data: TaskData) {
        self.title = data.title;
        self.icon = data.icon;
        self.thumbnail = data.thumbnail;
    }

    /// Drop loaded display fields, keeping identity.
    pub fn clear_data(&mut self) {
        self.title = None;
        self.icon = None;
        self.thumbnail = None;
    }

    /// Whether any display field has been loaded.
    #[must_use]
    pub const fn has_data(&self) -> bool {
        self.title.is_some() || self.icon.is_some() || self.thumbnail.is_some()
    }

    /// Title to render: the loaded one, or the package name as a fallback.
    #[must_use]
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.content.package)
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.content == other.content
    }
}

impl Eq for Task {}

impl Hash for Task {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.content.hash(state);
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Task {} ({})", self.id, self.content)
    }
}
