use crate::config::{LayoutConfig, StackOrientation};

/// Integer rectangle in surface pixels. `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    /// Left edge.
    pub left: i32,
    /// Top edge.
    pub top: i32,
    /// Right edge (exclusive).
    pub right: i32,
    /// Bottom edge (exclusive).
    pub bottom: i32,
}

#[allow(clippy::missing_const_for_fn)]
impl Rect {
    /// Construct from edges.
    #[must_use]
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Horizontal extent.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.right - self.left
    }

    /// Vertical extent.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Horizontal center, rounded towards negative infinity.
    #[must_use]
    pub const fn center_x(&self) -> i32 {
        (self.left + self.right) >> 1
    }

    /// Vertical center, rounded towards negative infinity.
    #[must_use]
    pub const fn center_y(&self) -> i32 {
        (self.top + self.bottom) >> 1
    }

    /// Whether the rect has no area.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    /// Translate by `(dx, dy)`.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.left + dx, self.top + dy, self.right + dx, self.bottom + dy)
    }

    /// Shrink each side by `dx` horizontally and `dy` vertically.
    #[must_use]
    pub const fn inset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.left + dx, self.top + dy, self.right - dx, self.bottom - dy)
    }

    /// Whether both rects share a non-empty area.
    #[must_use]
    pub const fn intersects(&self, other: &Self) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }

    /// Whether the point lies inside the rect.
    #[must_use]
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        !self.is_empty() && x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }

    /// Scale every edge about the rect's center, rounding half up.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn scale_about_center(self, scale: f32) -> Self {
        if (scale - 1.0).abs() < f32::EPSILON {
            return self;
        }
        let cx = self.center_x();
        let cy = self.center_y();
        let scaled = |edge: i32, center: i32| ((edge - center) as f32).mul_add(scale, 0.5) as i32 + center;
        Self::new(
            scaled(self.left, cx),
            scaled(self.top, cy),
            scaled(self.right, cx),
            scaled(self.bottom, cy),
        )
    }
}

/// Rectangles derived from the surface size. Recomputed whenever the size changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StackGeometry {
    /// Whole surface.
    pub bounds: Rect,
    /// Surface minus bottom inset and padding.
    pub stack: Rect,
    /// Stack rect with the peek region removed from the top.
    pub stack_sans_peek: Rect,
    /// Resting rect of a full-size card.
    pub task: Rect,
}

impl StackGeometry {
    /// Lay out the stack for a `width` x `height` surface.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn compute(width: i32, height: i32, layout: &LayoutConfig) -> Self {
        let bounds = Rect::new(0, 0, width, height);
        let mut stack = bounds;
        stack.bottom -= layout.bottom_inset;

        let smallest = width.min(height);
        let padding = (layout.padding_pct * smallest as f32 / 2.0) as i32;
        let stack = stack.inset(padding, padding);

        let peek = layout.peek_height_pct * stack.height() as f32;
        let mut stack_sans_peek = stack;
        stack_sans_peek.top = (stack_sans_peek.top as f32 + peek) as i32;

        let task = match layout.orientation {
            StackOrientation::Vertical => {
                let min_height = (stack.height() as f32 - peek) as i32;
                let size = min_height.min(stack.width().min(stack.height()));
                let center_x = stack.center_x();
                Rect::new(
                    center_x - size / 2,
                    stack_sans_peek.top,
                    center_x + size / 2,
                    stack_sans_peek.top + size,
                )
            }
            StackOrientation::Horizontal => {
                let size = stack.width().min(stack.height());
                let center_y = stack.center_y();
                Rect::new(
                    stack_sans_peek.top,
                    center_y - size / 2,
                    stack_sans_peek.top + size,
                    center_y + size / 2,
                )
            }
        };

        Self {
            bounds,
            stack,
            stack_sans_peek,
            task,
        }
    }
}
