//! Per-frame animation scheduler.
//!
//! Motions are plain data advanced by [`Scheduler::tick`]; the synchronizer
//! applies the resulting [`AnimationEvent`]s. Nothing here touches views, so
//! a motion whose card has gone back to the pool simply produces events the
//! caller ignores.

use std::time::Duration;

use slotmap::SlotMap;
use tracing::trace;

use recents_core::TaskId;

use crate::pool::HandleId;

slotmap::new_key_type! {
    /// Handle of a running motion.
    pub struct AnimationId;
}

/// Property a motion drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationTarget {
    /// The stack scroll offset.
    StackScroll,
    /// A card's horizontal translation.
    CardTranslation(HandleId),
    /// A card flying off-screen: translation plus a matching fade. Applies
    /// only while the card still shows the task.
    CardDismiss(HandleId, TaskId),
}

/// Side effect owed when a motion ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnFinish {
    /// Drop the hardware-layer reference taken when the motion started.
    ReleaseHwLayer,
    /// Remove the task from the stack. Skipped when the motion is cancelled.
    DismissTask(TaskId),
}

/// Output of [`Scheduler::tick`] and [`Scheduler::cancel`].
#[derive(Debug, Clone, PartialEq)]
pub enum AnimationEvent {
    /// A motion produced a new value.
    Update {
        /// Motion handle.
        id: AnimationId,
        /// Driven property.
        target: AnimationTarget,
        /// Current value.
        value: f32,
        /// Eased fraction in `[0, 1]`; flings report elapsed over estimated settle time.
        progress: f32,
    },
    /// A motion ended, either naturally or by cancellation.
    Finished {
        /// Motion handle, no longer active.
        id: AnimationId,
        /// Driven property.
        target: AnimationTarget,
        /// Final value.
        value: f32,
        /// Whether the motion was cut short.
        cancelled: bool,
        /// Side effects to run now.
        on_finish: Vec<OnFinish>,
    },
}

// https://notes.yvt.jp/Graphics/Easing-Functions/
fn ease(t: f32) -> f32 {
    if t < 0.5 {
        (1.0 - (2.0 * t).mul_add(-(2.0 * t), 1.0).sqrt()) / 2.0
    } else {
        let u = (-2.0_f32).mul_add(t, 2.0);
        (u.mul_add(-u, 1.0).sqrt() + 1.0) / 2.0
    }
}

fn blend(a: f32, b: f32, s: f32) -> f32 {
    (1.0 - s).mul_add(a, s * b)
}

/// Eased interpolation between two values.
#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    from: f32,
    to: f32,
    start: Duration,
    duration: Duration,
}

impl Tween {
    /// Tween from `from` to `to` starting at `start`.
    #[must_use]
    pub const fn new(from: f32, to: f32, start: Duration, duration: Duration) -> Self {
        Self {
            from,
            to,
            start,
            duration,
        }
    }

    /// Value and completion at `now`.
    #[must_use]
    pub fn sample(&self, now: Duration) -> (f32, f32, bool) {
        let elapsed = now.saturating_sub(self.start);
        if self.duration.is_zero() || elapsed >= self.duration {
            return (self.to, 1.0, true);
        }
        let s = ease(elapsed.as_secs_f32() / self.duration.as_secs_f32());
        (blend(self.from, self.to, s), s, false)
    }
}

/// Ballistic scroll decelerating exponentially: `x(t) = x0 + v0/k * (1 - e^(-k t))`.
#[derive(Debug, Clone, PartialEq)]
pub struct Fling {
    origin: f32,
    velocity: f32,
    friction: f32,
    min: f32,
    max: f32,
    start: Duration,
}

impl Fling {
    /// Speed below which the fling is considered settled (px/s).
    pub const SETTLE_VELOCITY: f32 = 1.0;

    /// Fling from `origin` at `velocity` px/s, confined to `[min, max]`.
    #[must_use]
    pub fn new(origin: f32, velocity: f32, friction: f32, min: f32, max: f32, start: Duration) -> Self {
        Self {
            origin,
            velocity,
            friction: friction.max(f32::EPSILON),
            min: min.min(max),
            max: max.max(min),
            start,
        }
    }

    /// Position the fling would come to rest at without bounds.
    #[must_use]
    pub fn resting_position(&self) -> f32 {
        self.origin + self.velocity / self.friction
    }

    /// Time until the speed drops below [`Self::SETTLE_VELOCITY`].
    #[must_use]
    pub fn settle_time(&self) -> Duration {
        let ratio = self.velocity.abs() / Self::SETTLE_VELOCITY;
        if ratio <= 1.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f32(ratio.ln() / self.friction)
    }

    /// Value, progress and completion at `now`.
    #[must_use]
    pub fn sample(&self, now: Duration) -> (f32, f32, bool) {
        let t = now.saturating_sub(self.start).as_secs_f32();
        let decay = (-self.friction * t).exp();
        let position = (self.velocity / self.friction).mul_add(1.0 - decay, self.origin);
        let speed = self.velocity * decay;

        let total = self.settle_time().as_secs_f32();
        let progress = if total > 0.0 { (t / total).min(1.0) } else { 1.0 };

        if position <= self.min {
            return (self.min, progress, true);
        }
        if position >= self.max {
            return (self.max, progress, true);
        }
        let remaining = (self.resting_position() - position).abs();
        if speed.abs() < Self::SETTLE_VELOCITY || remaining < 0.5 {
            let rest = self.resting_position().clamp(self.min, self.max);
            return (rest, 1.0, true);
        }
        (position, progress, false)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Motion {
    Tween(Tween),
    Fling(Fling),
}

impl Motion {
    fn sample(&self, now: Duration) -> (f32, f32, bool) {
        match self {
            Self::Tween(tween) => tween.sample(now),
            Self::Fling(fling) => fling.sample(now),
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    target: AnimationTarget,
    motion: Motion,
    last_value: f32,
    on_finish: Vec<OnFinish>,
}

/// Owner of every running motion.
#[derive(Debug, Default)]
pub struct Scheduler {
    entries: SlotMap<AnimationId, Entry>,
}

impl Scheduler {
    /// Create an idle scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an eased tween.
    pub fn start_tween(
        &mut self,
        target: AnimationTarget,
        tween: Tween,
        on_finish: Vec<OnFinish>,
    ) -> AnimationId {
        let last_value = tween.from;
        let id = self.entries.insert(Entry {
            target,
            motion: Motion::Tween(tween),
            last_value,
            on_finish,
        });
        trace!(?id, ?target, "tween started");
        id
    }

    /// Start a fling on the stack scroll.
    pub fn start_fling(&mut self, fling: Fling, on_finish: Vec<OnFinish>) -> AnimationId {
        let last_value = fling.origin;
        let id = self.entries.insert(Entry {
            target: AnimationTarget::StackScroll,
            motion: Motion::Fling(fling),
            last_value,
            on_finish,
        });
        trace!(?id, "fling started");
        id
    }

    /// Whether `id` is still running.
    #[must_use]
    pub fn is_active(&self, id: AnimationId) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of running motions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is running.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Target of a running motion.
    #[must_use]
    pub fn target(&self, id: AnimationId) -> Option<AnimationTarget> {
        self.entries.get(id).map(|entry| entry.target)
    }

    /// Stop a motion. The first call returns its `Finished` event with only the
    /// hardware-layer release kept; later calls return `None`.
    pub fn cancel(&mut self, id: AnimationId) -> Option<AnimationEvent> {
        let entry = self.entries.remove(id)?;
        trace!(?id, target = ?entry.target, "animation cancelled");
        Some(AnimationEvent::Finished {
            id,
            target: entry.target,
            value: entry.last_value,
            cancelled: true,
            on_finish: entry
                .on_finish
                .into_iter()
                .filter(|action| matches!(action, OnFinish::ReleaseHwLayer))
                .collect(),
        })
    }

    /// Cancel every motion whose target satisfies `pred`.
    pub fn cancel_where<P>(&mut self, mut pred: P) -> Vec<AnimationEvent>
    where
        P: FnMut(AnimationTarget) -> bool,
    {
        let ids: Vec<AnimationId> = self
            .entries
            .iter()
            .filter(|(_, entry)| pred(entry.target))
            .map(|(id, _)| id)
            .collect();
        ids.into_iter().filter_map(|id| self.cancel(id)).collect()
    }

    /// Advance every motion to `now`.
    pub fn tick(&mut self, now: Duration) -> Vec<AnimationEvent> {
        let mut events = Vec::with_capacity(self.entries.len());
        let mut finished = Vec::new();

        for (id, entry) in &mut self.entries {
            let (value, progress, done) = entry.motion.sample(now);
            entry.last_value = value;
            events.push(AnimationEvent::Update {
                id,
                target: entry.target,
                value,
                progress,
            });
            if done {
                finished.push(id);
            }
        }

        for id in finished {
            if let Some(entry) = self.entries.remove(id) {
                trace!(?id, target = ?entry.target, "animation finished");
                events.push(AnimationEvent::Finished {
                    id,
                    target: entry.target,
                    value: entry.last_value,
                    cancelled: false,
                    on_finish: entry.on_finish,
                });
            }
        }
        events
    }
}
