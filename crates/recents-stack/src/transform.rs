use crate::config::LayoutConfig;
use crate::geometry::{Rect, StackGeometry};

/// Where and how a card at a given stack index should be drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskTransform {
    /// Uniform scale applied about the card center.
    pub scale: f32,
    /// Vertical offset from the resting card rect.
    pub translation_y: i32,
    /// Final, scaled and translated rect.
    pub rect: Rect,
    /// Whether the card should be attached at all.
    pub visible: bool,
    /// Unclamped stack position: 0 at the scroll anchor, negative inside the peek region.
    pub t: f32,
}

impl Default for TaskTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translation_y: 0,
            rect: Rect::default(),
            visible: false,
            t: 0.0,
        }
    }
}

/// Maps a stack index and scroll offset to a [`TaskTransform`].
///
/// Pure: it holds only layout ratios, so it can be evaluated for indices that
/// are not attached yet.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformCalculator {
    overlap_pct: f32,
    peek_height_pct: f32,
    peek_num_cards: u32,
    min_scale: f32,
}

impl TransformCalculator {
    /// Capture the ratios of a layout configuration.
    #[must_use]
    pub const fn new(layout: &LayoutConfig) -> Self {
        Self {
            overlap_pct: layout.overlap_pct,
            peek_height_pct: layout.peek_height_pct,
            peek_num_cards: layout.peek_num_cards,
            min_scale: layout.min_scale,
        }
    }

    /// Compute the transform for `index` at `scroll`.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::suboptimal_flops
    )]
    pub fn compute(&self, index: usize, scroll: i32, geometry: &StackGeometry) -> TaskTransform {
        let task = geometry.task;
        let peek_cards = self.peek_num_cards.max(1) as f32;
        let overlap = self.overlap_pct * task.height() as f32;
        let peek = self.peek_height_pct * geometry.stack.height() as f32;
        if overlap <= 0.0 {
            return TaskTransform::default();
        }

        let t = (index as f32 * overlap - scroll as f32) / overlap;
        let bounded_t = t.max(-(peek_cards + 1.0));

        let scale_inc = (1.0 - self.min_scale) / peek_cards;
        let scale = (1.0 + bounded_t * scale_inc).clamp(self.min_scale, 1.0);
        let scale_y_offset = (1.0 - scale) * task.height() as f32 / 2.0;

        let translation_y = if bounded_t < 0.0 {
            (bounded_t.max(-peek_cards) / peek_cards * peek - scale_y_offset) as i32
        } else {
            (bounded_t * overlap - scale_y_offset) as i32
        };

        if t < -(peek_cards + 1.0) {
            return TaskTransform {
                scale,
                translation_y,
                rect: task,
                visible: false,
                t,
            };
        }

        let rect = task.offset(0, translation_y).scale_about_center(scale);
        TaskTransform {
            scale,
            translation_y,
            rect,
            visible: geometry.bounds.intersects(&rect),
            t,
        }
    }
}

/// Range the stack scroll may rest in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollBounds {
    /// Smallest resting scroll (back of the stack).
    pub min: i32,
    /// Largest resting scroll (front card fully revealed).
    pub max: i32,
}

impl ScrollBounds {
    /// Derive bounds for `task_count` cards. An empty stack is treated as one card.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn compute(task_count: usize, geometry: &StackGeometry, layout: &LayoutConfig) -> Self {
        let num_tasks = task_count.max(1);
        let task_height = geometry.task.height();
        let stack_height = geometry.stack_sans_peek.height();
        let max_extent = task_height
            + ((num_tasks - 1) as f32 * layout.overlap_pct * task_height as f32) as i32;
        Self {
            min: stack_height.min(max_extent) - stack_height,
            max: max_extent - stack_height,
        }
    }

    /// Nearest in-bounds value.
    #[must_use]
    pub fn clamp(&self, scroll: i32) -> i32 {
        scroll.max(self.min).min(self.max)
    }

    /// Whether `scroll` lies within the bounds.
    #[must_use]
    pub const fn contains(&self, scroll: i32) -> bool {
        scroll >= self.min && scroll <= self.max
    }
}
