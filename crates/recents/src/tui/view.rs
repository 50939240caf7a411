use std::time::{Duration, Instant};

use recents_core::{Task, TaskId};
use recents_stack::{CardAction, CardActions, CardView, Rect, RecentsHost, TaskTransform};

use crate::touch::Tappable;

/// Terminal card. Interpolates between transforms so animated syncs glide.
#[derive(Debug)]
pub struct PreviewView {
    task: Option<TaskId>,
    actions: CardActions,
    from: Rect,
    to: Rect,
    started: Instant,
    duration: Duration,
    has_data: bool,
}

impl Default for PreviewView {
    fn default() -> Self {
        Self {
            task: None,
            actions: CardActions::default(),
            from: Rect::default(),
            to: Rect::default(),
            started: Instant::now(),
            duration: Duration::ZERO,
            has_data: false,
        }
    }
}

impl PreviewView {
    /// Rect to draw at `now`.
    pub fn rect_at(&self, now: Instant) -> Rect {
        let elapsed = now.saturating_duration_since(self.started);
        if self.duration.is_zero() || elapsed >= self.duration {
            return self.to;
        }
        let progress = elapsed.as_secs_f32() / self.duration.as_secs_f32();
        lerp_rect(self.from, self.to, progress)
    }

    pub const fn has_data(&self) -> bool {
        self.has_data
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn lerp_rect(from: Rect, to: Rect, progress: f32) -> Rect {
    let lerp = |a: i32, b: i32| ((b - a) as f32).mul_add(progress, a as f32).round() as i32;
    Rect::new(
        lerp(from.left, to.left),
        lerp(from.top, to.top),
        lerp(from.right, to.right),
        lerp(from.bottom, to.bottom),
    )
}

impl CardView for PreviewView {
    fn bind(&mut self, task: &Task, actions: &CardActions) {
        self.task = Some(task.id);
        self.actions = actions.clone();
        self.has_data = task.has_data();
    }

    fn unbind(&mut self) {
        self.task = None;
        self.has_data = false;
    }

    fn apply_transform(&mut self, transform: &TaskTransform, duration: Duration) {
        let now = Instant::now();
        self.from = if self.to.is_empty() { transform.rect } else { self.rect_at(now) };
        self.to = transform.rect;
        self.started = now;
        self.duration = duration;
    }

    fn set_translation_x(&mut self, _x: f32) {}

    fn set_alpha(&mut self, _alpha: f32) {}

    fn reset_properties(&mut self) {
        self.from = Rect::default();
        self.to = Rect::default();
        self.duration = Duration::ZERO;
    }

    fn on_data_changed(&mut self, task: &Task) {
        self.has_data = task.has_data();
    }
}

impl Tappable for PreviewView {
    fn tap(&self) {
        if let Some(id) = self.task {
            self.actions.send(CardAction::Launch(id));
        }
    }

    fn tap_icon(&self) {
        if let Some(id) = self.task {
            self.actions.send(CardAction::IconClicked(id));
        }
    }
}

/// Preview host: collects notifications for the status line.
#[derive(Debug, Default)]
pub struct PreviewHost {
    pub message: Option<String>,
    pub stack_empty: bool,
    pub hw_layers: bool,
}

impl RecentsHost for PreviewHost {
    fn on_task_removed(&mut self, id: TaskId) {
        self.message = Some(format!("removed task {id}"));
    }

    fn on_stack_empty(&mut self) {
        self.stack_empty = true;
    }

    fn on_task_launched(&mut self, task: &Task) {
        self.message = Some(format!("launch {}", task.content));
    }

    fn set_hw_layers_hint(&mut self, enabled: bool) {
        self.hw_layers = enabled;
    }
}
