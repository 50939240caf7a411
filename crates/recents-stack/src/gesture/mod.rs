//! Pointer handling for the card stack: vertical scrolling, flings and
//! swipe-to-dismiss.
//!
//! Input reaches the controller through two entry points. The interception
//! path only observes the pointer stream and decides whether the stack should
//! take it over; the direct path acts on it.

pub mod velocity;

use std::time::Duration;

use recents_core::TaskId;
use tracing::{debug, trace};

use crate::config::{TouchConfig, VelocityReset};
use crate::error::Result;
use crate::host::{RecentsHost, TaskDataSource};
use crate::pool::HandleId;
use crate::synchronizer::StackSynchronizer;
use crate::view::{CardView, TaskCard};

pub use velocity::VelocityTracker;

/// Pointer phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    /// First contact.
    Down,
    /// Contact moved.
    Move,
    /// Contact lifted.
    Up,
    /// Stream aborted by the platform.
    Cancel,
}

/// One pointer sample in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Phase of the sample.
    pub action: PointerAction,
    /// Identifier of the contact.
    pub pointer_id: u32,
    /// Horizontal position in pixels.
    pub x: f32,
    /// Vertical position in pixels.
    pub y: f32,
    /// Monotonic timestamp.
    pub time: Duration,
}

impl PointerEvent {
    /// Sample for the primary pointer.
    #[must_use]
    pub const fn new(action: PointerAction, x: f32, y: f32, time: Duration) -> Self {
        Self {
            action,
            pointer_id: 0,
            x,
            y,
            time,
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    const fn position(&self) -> (i32, i32) {
        (self.x as i32, self.y as i32)
    }
}

/// What the current pointer stream has been classified as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GestureState {
    /// No pointer down.
    #[default]
    Idle,
    /// Pointer down, slop not yet exceeded.
    Undetermined,
    /// Vertical stack scroll.
    Scrolling,
    /// Horizontal card swipe.
    Swiping,
}

impl GestureState {
    const fn is_classified(self) -> bool {
        matches!(self, Self::Scrolling | Self::Swiping)
    }
}

#[derive(Debug, Clone)]
struct GestureSession {
    pointer_id: u32,
    initial: (i32, i32),
    last: (i32, i32),
    active_card: Option<HandleId>,
    active_task: Option<TaskId>,
    total_scroll_motion: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Path {
    Intercept,
    Touch,
}

/// Turns pointer streams into scroll, fling and swipe operations on a
/// [`StackSynchronizer`].
#[derive(Debug, Clone)]
pub struct GestureController {
    config: TouchConfig,
    state: GestureState,
    session: Option<GestureSession>,
    velocity: Option<VelocityTracker>,
}

impl GestureController {
    /// Controller using `config` thresholds.
    #[must_use]
    pub const fn new(config: TouchConfig) -> Self {
        Self {
            config,
            state: GestureState::Idle,
            session: None,
            velocity: None,
        }
    }

    /// Current classification.
    #[must_use]
    pub const fn state(&self) -> GestureState {
        self.state
    }

    /// Card under the pointer at touch-down, while it still shows the same task.
    #[must_use]
    pub fn active_card(&self) -> Option<HandleId> {
        self.session.as_ref().and_then(|session| session.active_card)
    }

    /// Observe an event on its way to the stack's children.
    ///
    /// Returns `true` once the stack should take over the stream. Nothing is
    /// scrolled or translated on this path.
    ///
    /// # Errors
    /// Propagates synchronizer failures.
    pub fn on_intercept_touch_event<V, D, H>(
        &mut self,
        sync: &mut StackSynchronizer<V, D, H>,
        event: &PointerEvent,
    ) -> Result<bool>
    where
        V: CardView,
        D: TaskDataSource,
        H: RecentsHost,
    {
        if !sync.has_attached_cards() {
            return Ok(false);
        }
        let was_scrolling = sync.is_scroll_animating();

        match event.action {
            PointerAction::Down => self.begin(sync, event)?,
            PointerAction::Move => {
                if !self.is_active_pointer(event) {
                    return Ok(was_scrolling);
                }
                if self.state == GestureState::Undetermined {
                    self.classify(sync, event, Path::Intercept);
                }
                if let Some(session) = self.session.as_mut() {
                    session.last = event.position();
                }
            }
            PointerAction::Up | PointerAction::Cancel => {
                if self.is_active_pointer(event) {
                    sync.animate_bound_scroll(sync.config().animation.snap_scroll_back(), event.time)?;
                    self.end(sync);
                }
            }
        }

        Ok(was_scrolling || self.state.is_classified())
    }

    /// Handle an event the stack owns.
    ///
    /// Returns `false` only when there are no cards to act on.
    ///
    /// # Errors
    /// Propagates synchronizer failures.
    pub fn on_touch_event<V, D, H>(
        &mut self,
        sync: &mut StackSynchronizer<V, D, H>,
        event: &PointerEvent,
    ) -> Result<bool>
    where
        V: CardView,
        D: TaskDataSource,
        H: RecentsHost,
    {
        if !sync.has_attached_cards() {
            return Ok(false);
        }
        if self.session.is_some() && !self.is_active_pointer(event) {
            return Ok(true);
        }
        self.velocity
            .get_or_insert_with(|| VelocityTracker::new(self.config.velocity_window()))
            .add(event.time, event.x, event.y);

        match event.action {
            PointerAction::Down => {
                self.begin(sync, event)?;
                sync.host_mut().request_disallow_intercept(true);
            }
            PointerAction::Move => self.on_touch_move(sync, event),
            PointerAction::Up => {
                self.on_touch_up(sync, event)?;
                self.end(sync);
            }
            PointerAction::Cancel => {
                self.on_touch_cancel(sync, event)?;
                self.end(sync);
            }
        }
        Ok(true)
    }

    fn on_touch_move<V, D, H>(&mut self, sync: &mut StackSynchronizer<V, D, H>, event: &PointerEvent)
    where
        V: CardView,
        D: TaskDataSource,
        H: RecentsHost,
    {
        if self.session.is_none() {
            return;
        }
        if self.state == GestureState::Undetermined {
            self.classify(sync, event, Path::Touch);
        }

        let swiped = if self.state == GestureState::Swiping {
            self.bound_active_card(sync)
        } else {
            None
        };
        let (x, y) = event.position();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let delta_x = x - session.last.0;
        let delta_y = session.last.1 - y;

        match self.state {
            GestureState::Scrolling => {
                sync.set_stack_scroll(sync.stack_scroll() + delta_y);
                if sync.is_scroll_out_of_bounds()
                    && let Some(tracker) = self.velocity.as_mut()
                {
                    tracker.clear();
                }
            }
            GestureState::Swiping => {
                if let Some(card) = swiped {
                    let current = sync.card(card).map_or(0.0, |card| card.translation_x());
                    #[allow(clippy::cast_precision_loss)]
                    let offset = delta_x as f32;
                    sync.set_card_translation_x(card, current + offset);
                }
            }
            GestureState::Idle | GestureState::Undetermined => {}
        }

        session.last = (x, y);
        session.total_scroll_motion += delta_y.abs();
    }

    fn on_touch_up<V, D, H>(&mut self, sync: &mut StackSynchronizer<V, D, H>, event: &PointerEvent) -> Result<()>
    where
        V: CardView,
        D: TaskDataSource,
        H: RecentsHost,
    {
        let (velocity_x, velocity_y) = self
            .velocity
            .as_ref()
            .map_or((0.0, 0.0), |tracker| tracker.velocity(self.config.max_fling_velocity));
        let min_fling = self.config.min_fling_velocity;

        match self.state {
            GestureState::Swiping => {
                if let Some(card) = self.bound_active_card(sync) {
                    if velocity_x.abs() > min_fling {
                        sync.animate_card_dismiss(card, velocity_x, event.time)?;
                    } else {
                        sync.animate_card_snap_back(card, event.time, true)?;
                    }
                }
            }
            GestureState::Scrolling => {
                if velocity_y.abs() > min_fling {
                    sync.start_fling(-velocity_y, event.time)?;
                } else if sync.is_scroll_out_of_bounds() {
                    sync.animate_bound_scroll(sync.config().animation.snap_scroll_back(), event.time)?;
                }
            }
            GestureState::Idle | GestureState::Undetermined => {}
        }
        Ok(())
    }

    fn on_touch_cancel<V, D, H>(
        &mut self,
        sync: &mut StackSynchronizer<V, D, H>,
        event: &PointerEvent,
    ) -> Result<()>
    where
        V: CardView,
        D: TaskDataSource,
        H: RecentsHost,
    {
        match self.state {
            GestureState::Swiping => {
                if let Some(card) = self.bound_active_card(sync) {
                    sync.animate_card_snap_back(card, event.time, false)?;
                }
            }
            GestureState::Scrolling => {
                sync.animate_bound_scroll(sync.config().animation.snap_scroll_back(), event.time)?;
            }
            GestureState::Idle | GestureState::Undetermined => {}
        }
        Ok(())
    }

    fn begin<V, D, H>(&mut self, sync: &mut StackSynchronizer<V, D, H>, event: &PointerEvent) -> Result<()>
    where
        V: CardView,
        D: TaskDataSource,
        H: RecentsHost,
    {
        if self.session.is_some() {
            if !self.is_active_pointer(event) {
                return Ok(());
            }
            self.end(sync);
        }

        sync.abort_scroll_animations()?;
        sync.cancel_card_snap_backs(|_| true)?;

        let position = event.position();
        let active_card = sync.find_card_at(position.0, position.1);
        let active_task = active_card.and_then(|card| sync.card(card)).and_then(TaskCard::task_id);
        self.session = Some(GestureSession {
            pointer_id: event.pointer_id,
            initial: position,
            last: position,
            active_card,
            active_task,
            total_scroll_motion: 0,
        });
        self.state = GestureState::Undetermined;

        let tracker = self
            .velocity
            .get_or_insert_with(|| VelocityTracker::new(self.config.velocity_window()));
        tracker.clear();
        tracker.add(event.time, event.x, event.y);
        trace!(x = position.0, y = position.1, card = ?active_card, "pointer down");
        Ok(())
    }

    fn classify<V, D, H>(&mut self, sync: &mut StackSynchronizer<V, D, H>, event: &PointerEvent, path: Path)
    where
        V: CardView,
        D: TaskDataSource,
        H: RecentsHost,
    {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let (x, y) = event.position();
        #[allow(clippy::cast_precision_loss)]
        let (dx, dy, total) = (
            (x - session.initial.0).abs() as f32,
            (y - session.initial.1).abs() as f32,
            session.total_scroll_motion as f32,
        );

        let reset = if session.active_card.is_some()
            && total < self.config.reject_swipe_motion()
            && dx > dy
            && dx > self.config.swipe_slop()
        {
            self.state = GestureState::Swiping;
            VelocityReset::Reset
        } else if dy > self.config.scroll_slop() {
            self.state = GestureState::Scrolling;
            match path {
                Path::Intercept => self.config.intercept_velocity,
                Path::Touch => self.config.touch_velocity,
            }
        } else {
            return;
        };

        let tracker = self
            .velocity
            .get_or_insert_with(|| VelocityTracker::new(self.config.velocity_window()));
        if reset == VelocityReset::Reset {
            tracker.clear();
        }
        tracker.add(event.time, event.x, event.y);

        sync.host_mut().request_disallow_intercept(true);
        sync.acquire_hw_layer();
        debug!(state = ?self.state, ?path, dx, dy, "gesture classified");
    }

    fn end<V, D, H>(&mut self, sync: &mut StackSynchronizer<V, D, H>)
    where
        V: CardView,
        D: TaskDataSource,
        H: RecentsHost,
    {
        if self.state.is_classified() {
            sync.release_hw_layer();
        }
        self.state = GestureState::Idle;
        self.session = None;
        self.velocity = None;
    }

    /// The swiped card, as long as it still shows the task it was pressed on.
    /// A card whose task left the stack is dropped from the session.
    fn bound_active_card<V, D, H>(&mut self, sync: &StackSynchronizer<V, D, H>) -> Option<HandleId>
    where
        V: CardView,
        D: TaskDataSource,
        H: RecentsHost,
    {
        let session = self.session.as_mut()?;
        let (card, task) = (session.active_card?, session.active_task?);
        if sync.card(card).is_some_and(|view| view.is_bound_to(task)) {
            return Some(card);
        }
        debug!(%task, "swiped card lost its task");
        session.active_card = None;
        session.active_task = None;
        None
    }

    fn is_active_pointer(&self, event: &PointerEvent) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.pointer_id == event.pointer_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TestSync, recording_stack};
    use recents_core::{ContentRef, Task};

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn event(action: PointerAction, x: f32, y: f32, time: u64) -> PointerEvent {
        PointerEvent::new(action, x, y, ms(time))
    }

    fn touch(controller: &mut GestureController, sync: &mut TestSync, ev: PointerEvent) -> bool {
        controller
            .on_touch_event(sync, &ev)
            .unwrap_or_else(|err| panic!("touch event failed: {err}"))
    }

    fn intercept(controller: &mut GestureController, sync: &mut TestSync, ev: PointerEvent) -> bool {
        controller
            .on_intercept_touch_event(sync, &ev)
            .unwrap_or_else(|err| panic!("intercept event failed: {err}"))
    }

    #[test]
    fn vertical_drag_scrolls_the_stack() {
        let (mut sync, recorder) = recording_stack(5);
        let mut controller = GestureController::new(TouchConfig::default());

        touch(&mut controller, &mut sync, event(PointerAction::Down, 240.0, 400.0, 0));
        assert_eq!(controller.state(), GestureState::Undetermined);
        touch(&mut controller, &mut sync, event(PointerAction::Move, 240.0, 410.0, 16));
        assert_eq!(controller.state(), GestureState::Undetermined);
        assert_eq!(sync.stack_scroll(), 812);

        touch(&mut controller, &mut sync, event(PointerAction::Move, 240.0, 440.0, 32));
        assert_eq!(controller.state(), GestureState::Scrolling);
        assert_eq!(sync.stack_scroll(), 782);
        assert_eq!(sync.hw_layer_count(), 1);
        assert!(recorder.count("disallow_intercept") >= 2);
    }

    #[test]
    fn horizontal_drag_on_a_card_swipes_it() {
        let (mut sync, _) = recording_stack(5);
        let mut controller = GestureController::new(TouchConfig::default());

        touch(&mut controller, &mut sync, event(PointerAction::Down, 100.0, 100.0, 0));
        let Some(card) = controller.active_card() else {
            panic!("pointer should land on a card");
        };
        assert_eq!(sync.card(card).and_then(|card| card.task_id()), Some(TaskId(3)));

        touch(&mut controller, &mut sync, event(PointerAction::Move, 160.0, 105.0, 16));
        assert_eq!(controller.state(), GestureState::Swiping);
        assert_eq!(sync.card(card).map(|card| card.translation_x()), Some(60.0));
        assert_eq!(sync.stack_scroll(), 812);
    }

    #[test]
    fn fast_release_dismisses_the_swiped_card() {
        let (mut sync, recorder) = recording_stack(5);
        let mut controller = GestureController::new(TouchConfig::default());

        touch(&mut controller, &mut sync, event(PointerAction::Down, 100.0, 100.0, 0));
        touch(&mut controller, &mut sync, event(PointerAction::Move, 160.0, 105.0, 16));
        touch(&mut controller, &mut sync, event(PointerAction::Move, 184.0, 105.0, 32));
        touch(&mut controller, &mut sync, event(PointerAction::Move, 208.0, 105.0, 48));
        touch(&mut controller, &mut sync, event(PointerAction::Up, 208.0, 105.0, 48));

        assert_eq!(controller.state(), GestureState::Idle);
        assert_eq!(sync.hw_layer_count(), 1, "dismiss animation holds a layer");

        sync.on_frame(ms(260)).unwrap_or_else(|err| panic!("frame: {err}"));
        assert_eq!(sync.stack().len(), 4);
        assert!(!sync.stack().contains(TaskId(3)));
        assert_eq!(recorder.count("removed"), 1);
        assert_eq!(sync.hw_layer_count(), 0);
    }

    #[test]
    fn slow_release_snaps_the_card_back() {
        let (mut sync, recorder) = recording_stack(5);
        let mut controller = GestureController::new(TouchConfig::default());

        touch(&mut controller, &mut sync, event(PointerAction::Down, 100.0, 100.0, 0));
        touch(&mut controller, &mut sync, event(PointerAction::Move, 160.0, 105.0, 16));
        touch(&mut controller, &mut sync, event(PointerAction::Up, 160.0, 105.0, 600));
        let Some(card) = sync.card_for_task(TaskId(3)) else {
            panic!("card must stay attached");
        };
        assert_eq!(sync.hw_layer_count(), 1);

        sync.on_frame(ms(1000)).unwrap_or_else(|err| panic!("frame: {err}"));
        assert_eq!(sync.card(card).map(|card| card.translation_x()), Some(0.0));
        assert_eq!(sync.hw_layer_count(), 0);
        assert_eq!(sync.stack().len(), 5);
        assert_eq!(recorder.count("removed"), 0);
    }

    #[test]
    fn quick_vertical_release_flings_and_settles_in_bounds() {
        let (mut sync, _) = recording_stack(10);
        sync.set_stack_scroll(600);
        let mut controller = GestureController::new(TouchConfig::default());

        touch(&mut controller, &mut sync, event(PointerAction::Down, 240.0, 600.0, 0));
        touch(&mut controller, &mut sync, event(PointerAction::Move, 240.0, 560.0, 16));
        touch(&mut controller, &mut sync, event(PointerAction::Move, 240.0, 520.0, 32));
        touch(&mut controller, &mut sync, event(PointerAction::Up, 240.0, 480.0, 48));
        assert!(sync.is_flinging());
        assert_eq!(sync.hw_layer_count(), 1);

        let before = sync.stack_scroll();
        sync.on_frame(ms(100)).unwrap_or_else(|err| panic!("frame: {err}"));
        assert!(sync.stack_scroll() > before, "upward drag flings towards the front");

        sync.on_frame(ms(10_000)).unwrap_or_else(|err| panic!("frame: {err}"));
        assert!(!sync.is_flinging());
        assert!(!sync.is_scroll_out_of_bounds());
        assert_eq!(sync.hw_layer_count(), 0);
    }

    #[test]
    fn overscroll_release_snaps_back() {
        let (mut sync, _) = recording_stack(5);
        let mut controller = GestureController::new(TouchConfig::default());

        touch(&mut controller, &mut sync, event(PointerAction::Down, 240.0, 600.0, 0));
        touch(&mut controller, &mut sync, event(PointerAction::Move, 240.0, 500.0, 16));
        assert_eq!(sync.stack_scroll(), 912);
        assert!(sync.is_scroll_out_of_bounds());
        touch(&mut controller, &mut sync, event(PointerAction::Up, 240.0, 500.0, 500));

        assert!(sync.is_scroll_animating());
        sync.on_frame(ms(2000)).unwrap_or_else(|err| panic!("frame: {err}"));
        assert_eq!(sync.stack_scroll(), 812);
        assert_eq!(sync.hw_layer_count(), 0);
    }

    #[test]
    fn cancel_returns_swiped_card_without_holding_layers() {
        let (mut sync, _) = recording_stack(5);
        let mut controller = GestureController::new(TouchConfig::default());

        touch(&mut controller, &mut sync, event(PointerAction::Down, 100.0, 100.0, 0));
        touch(&mut controller, &mut sync, event(PointerAction::Move, 160.0, 105.0, 16));
        touch(&mut controller, &mut sync, event(PointerAction::Cancel, 160.0, 105.0, 32));
        assert_eq!(controller.state(), GestureState::Idle);
        assert_eq!(sync.hw_layer_count(), 0);
        assert!(sync.is_animating());
    }

    #[test]
    fn intercept_claims_stream_once_classified() {
        let (mut sync, _) = recording_stack(5);
        let mut controller = GestureController::new(TouchConfig::default());

        assert!(!intercept(&mut controller, &mut sync, event(PointerAction::Down, 240.0, 400.0, 0)));
        assert!(!intercept(&mut controller, &mut sync, event(PointerAction::Move, 240.0, 405.0, 16)));
        assert!(intercept(&mut controller, &mut sync, event(PointerAction::Move, 240.0, 440.0, 32)));
        assert_eq!(sync.stack_scroll(), 812, "interception never scrolls");

        touch(&mut controller, &mut sync, event(PointerAction::Move, 240.0, 460.0, 48));
        assert_eq!(sync.stack_scroll(), 792);
        touch(&mut controller, &mut sync, event(PointerAction::Up, 240.0, 460.0, 500));
        assert_eq!(sync.hw_layer_count(), 0);
    }

    #[test]
    fn intercept_up_after_classification_balances_layers() {
        let (mut sync, _) = recording_stack(5);
        let mut controller = GestureController::new(TouchConfig::default());

        intercept(&mut controller, &mut sync, event(PointerAction::Down, 240.0, 400.0, 0));
        intercept(&mut controller, &mut sync, event(PointerAction::Move, 240.0, 440.0, 16));
        assert_eq!(sync.hw_layer_count(), 1);
        assert!(!intercept(&mut controller, &mut sync, event(PointerAction::Up, 240.0, 440.0, 32)));
        assert_eq!(sync.hw_layer_count(), 0);
    }

    #[test]
    fn touch_down_stops_a_running_fling() {
        let (mut sync, _) = recording_stack(10);
        sync.set_stack_scroll(600);
        sync.start_fling(3000.0, Duration::ZERO)
            .unwrap_or_else(|err| panic!("fling: {err}"));
        let mut controller = GestureController::new(TouchConfig::default());

        assert!(intercept(&mut controller, &mut sync, event(PointerAction::Down, 240.0, 400.0, 16)));
        assert!(!sync.is_scroll_animating());
        assert_eq!(sync.hw_layer_count(), 0);
    }

    #[test]
    fn second_pointer_is_ignored() {
        let (mut sync, _) = recording_stack(5);
        let mut controller = GestureController::new(TouchConfig::default());

        touch(&mut controller, &mut sync, event(PointerAction::Down, 240.0, 400.0, 0));
        let mut other = event(PointerAction::Move, 240.0, 200.0, 16);
        other.pointer_id = 1;
        touch(&mut controller, &mut sync, other);
        assert_eq!(controller.state(), GestureState::Undetermined);
        assert_eq!(sync.stack_scroll(), 812);
    }

    #[test]
    fn empty_stack_declines_events() {
        let (mut sync, _) = recording_stack(1);
        sync.dismiss_task(TaskId(1)).unwrap_or_else(|err| panic!("dismiss: {err}"));
        sync.synchronize().unwrap_or_else(|err| panic!("sync: {err}"));
        let mut controller = GestureController::new(TouchConfig::default());

        assert!(!touch(&mut controller, &mut sync, event(PointerAction::Down, 10.0, 10.0, 0)));
        assert!(!intercept(&mut controller, &mut sync, event(PointerAction::Down, 10.0, 10.0, 0)));
    }

    #[test]
    fn swipe_stops_when_its_task_is_removed_mid_gesture() {
        let (mut sync, recorder) = recording_stack(12);
        let mut controller = GestureController::new(TouchConfig::default());

        touch(&mut controller, &mut sync, event(PointerAction::Down, 240.0, 600.0, 0));
        let Some(card) = controller.active_card() else {
            panic!("pointer should land on the front card");
        };
        assert_eq!(sync.card(card).and_then(|card| card.task_id()), Some(TaskId(12)));
        touch(&mut controller, &mut sync, event(PointerAction::Move, 300.0, 605.0, 16));
        assert_eq!(controller.state(), GestureState::Swiping);

        sync.remove_task(TaskId(12)).unwrap_or_else(|err| panic!("remove: {err}"));
        sync.add_task(Task::new(TaskId(99), ContentRef::new("org.odd.app", "Activity99")))
            .unwrap_or_else(|err| panic!("add: {err}"));
        sync.synchronize().unwrap_or_else(|err| panic!("sync: {err}"));

        touch(&mut controller, &mut sync, event(PointerAction::Move, 330.0, 605.0, 32));
        assert!(controller.active_card().is_none());
        touch(&mut controller, &mut sync, event(PointerAction::Move, 360.0, 605.0, 48));
        touch(&mut controller, &mut sync, event(PointerAction::Up, 360.0, 605.0, 48));
        sync.on_frame(ms(400)).unwrap_or_else(|err| panic!("frame: {err}"));

        assert_eq!(sync.stack().len(), 12);
        assert!(sync.stack().contains(TaskId(7)));
        assert_eq!(recorder.count("removed"), 0);
        assert_eq!(recorder.count("delete"), 0);
        assert!(sync.attached_cards().all(|(_, card)| card.translation_x().abs() < f32::EPSILON));
        assert_eq!(sync.hw_layer_count(), 0);
    }

    fn flings_after_late_classification(touch_velocity: VelocityReset) -> bool {
        let (mut sync, _) = recording_stack(10);
        sync.set_stack_scroll(600);
        let config = TouchConfig {
            touch_velocity,
            ..TouchConfig::default()
        };
        let mut controller = GestureController::new(config);

        touch(&mut controller, &mut sync, event(PointerAction::Down, 240.0, 600.0, 0));
        touch(&mut controller, &mut sync, event(PointerAction::Move, 240.0, 590.0, 40));
        assert_eq!(controller.state(), GestureState::Undetermined);
        touch(&mut controller, &mut sync, event(PointerAction::Move, 240.0, 560.0, 50));
        assert_eq!(controller.state(), GestureState::Scrolling);
        assert_eq!(sync.stack_scroll(), 630);
        touch(&mut controller, &mut sync, event(PointerAction::Up, 240.0, 558.0, 80));
        sync.is_flinging()
    }

    #[test]
    fn velocity_reset_setting_decides_whether_early_samples_count() {
        assert!(flings_after_late_classification(VelocityReset::Keep));
        assert!(!flings_after_late_classification(VelocityReset::Reset));
    }

    #[test]
    fn cancel_while_scrolling_snaps_back_without_flinging() {
        let (mut sync, _) = recording_stack(5);
        let mut controller = GestureController::new(TouchConfig::default());

        touch(&mut controller, &mut sync, event(PointerAction::Down, 240.0, 600.0, 0));
        touch(&mut controller, &mut sync, event(PointerAction::Move, 240.0, 500.0, 16));
        touch(&mut controller, &mut sync, event(PointerAction::Move, 240.0, 300.0, 32));
        assert_eq!(sync.stack_scroll(), 1112);
        touch(&mut controller, &mut sync, event(PointerAction::Cancel, 240.0, 300.0, 40));

        assert_eq!(controller.state(), GestureState::Idle);
        assert!(!sync.is_flinging());
        assert!(sync.is_scroll_animating());
        sync.on_frame(ms(2000)).unwrap_or_else(|err| panic!("frame: {err}"));
        assert_eq!(sync.stack_scroll(), 812);
        assert_eq!(sync.hw_layer_count(), 0);
    }

    #[test]
    fn intercept_cancel_snaps_back_and_balances_layers() {
        let (mut sync, _) = recording_stack(5);
        sync.set_stack_scroll(900);
        let mut controller = GestureController::new(TouchConfig::default());

        intercept(&mut controller, &mut sync, event(PointerAction::Down, 240.0, 400.0, 0));
        assert!(intercept(&mut controller, &mut sync, event(PointerAction::Move, 240.0, 440.0, 16)));
        assert_eq!(sync.hw_layer_count(), 1);

        intercept(&mut controller, &mut sync, event(PointerAction::Cancel, 240.0, 440.0, 32));
        assert_eq!(controller.state(), GestureState::Idle);
        assert!(!sync.is_flinging());
        sync.on_frame(ms(2000)).unwrap_or_else(|err| panic!("frame: {err}"));
        assert_eq!(sync.stack_scroll(), 812);
        assert_eq!(sync.hw_layer_count(), 0);
    }
}
