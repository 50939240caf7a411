use std::collections::VecDeque;
use std::time::Duration;

/// Estimates pointer velocity from the samples of a short trailing window.
#[derive(Debug, Clone)]
pub struct VelocityTracker {
    window: Duration,
    samples: VecDeque<(Duration, f32, f32)>,
}

impl VelocityTracker {
    /// Track samples no older than `window` relative to the newest one.
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            samples: VecDeque::new(),
        }
    }

    /// Record a pointer position. A sample at the same instant as the newest
    /// one replaces it.
    pub fn add(&mut self, time: Duration, x: f32, y: f32) {
        if let Some(last) = self.samples.back_mut()
            && last.0 == time
        {
            *last = (time, x, y);
            return;
        }
        self.samples.push_back((time, x, y));
        while let Some(&(oldest, _, _)) = self.samples.front() {
            if time.saturating_sub(oldest) > self.window {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Forget every sample.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Number of retained samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no samples are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Velocity in px/s along both axes, each clamped to `±max`.
    /// Zero when fewer than two samples span at least a millisecond.
    #[must_use]
    pub fn velocity(&self, max: f32) -> (f32, f32) {
        let (Some(first), Some(last)) = (self.samples.front(), self.samples.back()) else {
            return (0.0, 0.0);
        };
        let dt = last.0.saturating_sub(first.0).as_secs_f32();
        if dt < 0.001 {
            return (0.0, 0.0);
        }
        let vx = ((last.1 - first.1) / dt).clamp(-max, max);
        let vy = ((last.2 - first.2) / dt).clamp(-max, max);
        (vx, vy)
    }
}
