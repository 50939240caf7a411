//! Reconciles the task stack with the set of attached card views.
//!
//! The synchronizer owns the stack model, the view pool and the animation
//! scheduler. Everything runs on one event thread: hosts call
//! [`StackSynchronizer::on_frame`] once per frame and forward pointer input
//! through a [`crate::GestureController`].

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, info, trace};

use recents_core::{StackEvent, Task, TaskData, TaskFilter, TaskId, TaskStack};

use crate::animation::{
    AnimationEvent, AnimationId, AnimationTarget, Fling, OnFinish, Scheduler, Tween,
};
use crate::config::StackConfig;
use crate::error::{Result, StackError};
use crate::geometry::StackGeometry;
use crate::host::{RecentsHost, TaskDataSource};
use crate::hw_layers::{HwLayerTransition, HwLayers};
use crate::pool::{HandleId, ViewPool};
use crate::transform::{ScrollBounds, TaskTransform, TransformCalculator};
use crate::view::{ActionQueue, CardAction, CardActions, CardView, TaskCard};

/// Counts of pool operations performed by one [`StackSynchronizer::synchronize`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Cards taken from the pool.
    pub acquired: usize,
    /// Cards returned to the pool.
    pub released: usize,
    /// Attached cards that received a transform.
    pub updated: usize,
}

type StackEvents = Rc<RefCell<VecDeque<StackEvent>>>;

/// Orchestrates layout, recycling, scrolling and card animations.
pub struct StackSynchronizer<V, D, H> {
    stack: TaskStack,
    stack_events: StackEvents,
    config: StackConfig,
    calculator: TransformCalculator,
    geometry: StackGeometry,
    bounds: ScrollBounds,
    scroll: i32,
    pool: ViewPool<TaskCard<V>>,
    attached: Vec<HandleId>,
    factory: Box<dyn FnMut() -> V>,
    data_source: D,
    host: H,
    hw_layers: HwLayers,
    scheduler: Scheduler,
    scroll_animation: Option<AnimationId>,
    fling: Option<AnimationId>,
    actions: ActionQueue,
    dirty: bool,
    pending_duration: Duration,
    awaiting_first_layout: bool,
}

impl<V, D, H> std::fmt::Debug for StackSynchronizer<V, D, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StackSynchronizer")
            .field("tasks", &self.stack.len())
            .field("visible", &self.stack.visible_len())
            .field("scroll", &self.scroll)
            .field("bounds", &self.bounds)
            .field("attached", &self.attached.len())
            .field("hw_layers", &self.hw_layers.count())
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

#[allow(clippy::missing_const_for_fn)]
impl<V, D, H> StackSynchronizer<V, D, H>
where
    V: CardView,
    D: TaskDataSource,
    H: RecentsHost,
{
    /// Create a synchronizer over `stack`. `factory` builds renderer views on demand.
    pub fn new<F>(mut stack: TaskStack, config: StackConfig, data_source: D, host: H, factory: F) -> Self
    where
        F: FnMut() -> V + 'static,
    {
        let stack_events: StackEvents = Rc::default();
        let sink = Rc::clone(&stack_events);
        stack.add_observer(move |event| sink.borrow_mut().push_back(event.clone()));

        Self {
            stack,
            stack_events,
            calculator: TransformCalculator::new(&config.layout),
            config,
            geometry: StackGeometry::default(),
            bounds: ScrollBounds::default(),
            scroll: 0,
            pool: ViewPool::new(),
            attached: Vec::new(),
            factory: Box::new(factory),
            data_source,
            host,
            hw_layers: HwLayers::default(),
            scheduler: Scheduler::new(),
            scroll_animation: None,
            fling: None,
            actions: Rc::default(),
            dirty: true,
            pending_duration: Duration::ZERO,
            awaiting_first_layout: true,
        }
    }

    // ---- accessors ----

    /// Task model.
    pub fn stack(&self) -> &TaskStack {
        &self.stack
    }

    /// Mutable task model. Changes made here are picked up on the next
    /// [`Self::synchronize`] or [`Self::on_frame`].
    pub fn stack_mut(&mut self) -> &mut TaskStack {
        &mut self.stack
    }

    /// Active configuration.
    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    /// Current layout rectangles.
    pub fn geometry(&self) -> &StackGeometry {
        &self.geometry
    }

    /// Current scroll range.
    pub fn scroll_bounds(&self) -> ScrollBounds {
        self.bounds
    }

    /// Current stack scroll.
    pub fn stack_scroll(&self) -> i32 {
        self.scroll
    }

    /// Hardware-layer reference count.
    pub fn hw_layer_count(&self) -> u32 {
        self.hw_layers.count()
    }

    /// Whether a sync pass is pending.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Animation duration the next sync pass will use.
    pub fn pending_duration(&self) -> Duration {
        self.pending_duration
    }

    /// Whether any card is attached.
    pub fn has_attached_cards(&self) -> bool {
        !self.attached.is_empty()
    }

    /// Attached cards, back to front.
    pub fn attached_cards(&self) -> impl Iterator<Item = (HandleId, &TaskCard<V>)> + '_ {
        self.attached
            .iter()
            .filter_map(|&id| self.pool.get(id).map(|card| (id, card)))
    }

    /// Attached card by handle.
    pub fn card(&self, id: HandleId) -> Option<&TaskCard<V>> {
        self.attached_card(id)
    }

    /// Handle of the attached card showing `task`.
    pub fn card_for_task(&self, task: TaskId) -> Option<HandleId> {
        self.attached
            .iter()
            .copied()
            .find(|&id| self.pool.get(id).is_some_and(|card| card.is_bound_to(task)))
    }

    /// Number of views held by the pool, idle or not.
    pub fn pooled_views(&self) -> usize {
        self.pool.idle_len() + self.pool.in_use_len()
    }

    /// Host collaborator.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable host collaborator.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Data source collaborator.
    pub fn data_source(&self) -> &D {
        &self.data_source
    }

    /// Mutable data source collaborator.
    pub fn data_source_mut(&mut self) -> &mut D {
        &mut self.data_source
    }

    /// Whether a fling or scroll snap-back is running.
    pub fn is_scroll_animating(&self) -> bool {
        self.fling.is_some_and(|id| self.scheduler.is_active(id))
            || self.scroll_animation.is_some_and(|id| self.scheduler.is_active(id))
    }

    /// Whether a fling is running.
    pub fn is_flinging(&self) -> bool {
        self.fling.is_some_and(|id| self.scheduler.is_active(id))
    }

    /// Whether any motion is running.
    pub fn is_animating(&self) -> bool {
        !self.scheduler.is_empty()
    }

    /// Transform for the visible position `index` at the current scroll.
    pub fn transform_at(&self, index: usize) -> TaskTransform {
        self.calculator.compute(index, self.scroll, &self.geometry)
    }

    // ---- layout ----

    /// Lay the stack out for a new surface size.
    ///
    /// The first call scrolls to the front of the stack and synchronizes
    /// immediately without animation.
    ///
    /// # Errors
    /// Propagates pool invariant violations from the initial sync.
    pub fn set_size(&mut self, width: i32, height: i32) -> Result<()> {
        self.geometry = StackGeometry::compute(width, height, &self.config.layout);
        debug!(width, height, task = ?self.geometry.task, "stack measured");
        self.update_min_max_scroll(false);

        if self.awaiting_first_layout {
            self.set_stack_scroll(self.bounds.max);
            self.request_sync(Duration::ZERO);
            self.awaiting_first_layout = false;
            self.synchronize()?;
        } else {
            self.request_sync(Duration::ZERO);
        }
        Ok(())
    }

    /// Mark the views stale. The next pass animates for at least `duration`,
    /// except before the first layout where it never animates.
    pub fn request_sync(&mut self, duration: Duration) {
        if !self.dirty {
            self.host.request_redraw();
        }
        self.pending_duration = if self.awaiting_first_layout {
            Duration::ZERO
        } else {
            self.pending_duration.max(duration)
        };
        self.dirty = true;
    }

    /// Reconcile attached cards with the stack. A no-op unless dirty.
    ///
    /// # Errors
    /// Propagates pool invariant violations.
    pub fn synchronize(&mut self) -> Result<SyncReport> {
        self.handle_stack_events()?;
        if !self.dirty || self.awaiting_first_layout {
            return Ok(SyncReport::default());
        }

        let duration = self.pending_duration;
        let mut report = SyncReport::default();

        for index in 0..self.stack.visible_len() {
            let Some(task) = self.stack.visible_task(index).cloned() else {
                continue;
            };
            let transform = self.transform_at(index);
            let existing = self.card_for_task(task.id);

            if transform.visible {
                if existing.is_none() {
                    let id = self.acquire_card(&task, index);
                    report.acquired += 1;
                    if !duration.is_zero() && index != 0 {
                        let from = if transform.t < 0.0 { index - 1 } else { index + 1 };
                        let seed = self.transform_at(from);
                        if let Some(card) = self.pool.get_mut(id) {
                            card.apply_transform(&seed, Duration::ZERO);
                        }
                    }
                }
            } else if let Some(id) = existing {
                self.release_card(id)?;
                report.released += 1;
            }
        }

        for pos in (0..self.attached.len()).rev() {
            let Some(&id) = self.attached.get(pos) else {
                continue;
            };
            let transform = self
                .pool
                .get(id)
                .and_then(TaskCard::task_id)
                .and_then(|task| self.stack.visible_index_of(task))
                .map(|index| self.transform_at(index))
                .filter(|transform| transform.visible);

            match transform {
                Some(transform) => {
                    if let Some(card) = self.pool.get_mut(id) {
                        card.apply_transform(&transform, duration);
                        report.updated += 1;
                    }
                }
                None => {
                    self.release_card(id)?;
                    report.released += 1;
                }
            }
        }

        self.pending_duration = Duration::ZERO;
        self.dirty = false;
        self.pool.trim_idle(self.attached.len());
        trace!(
            acquired = report.acquired,
            released = report.released,
            updated = report.updated,
            attached = self.attached.len(),
            "stack synchronized"
        );
        Ok(report)
    }

    /// Advance animations to `now`, drain card actions and synchronize.
    ///
    /// # Errors
    /// Propagates pool invariant violations.
    pub fn on_frame(&mut self, now: Duration) -> Result<SyncReport> {
        let events = self.scheduler.tick(now);
        self.apply_animation_events(events)?;
        self.process_card_actions()?;
        self.synchronize()
    }

    // ---- scrolling ----

    /// Jump the scroll to `value`.
    pub fn set_stack_scroll(&mut self, value: i32) {
        self.scroll = value;
        self.request_sync(Duration::ZERO);
    }

    /// Clamp the scroll into bounds. Returns whether it moved.
    pub fn bound_scroll(&mut self) -> bool {
        let bounded = self.bounds.clamp(self.scroll);
        if bounded == self.scroll {
            return false;
        }
        self.set_stack_scroll(bounded);
        true
    }

    /// Whether the scroll lies outside `[min, max]`.
    pub fn is_scroll_out_of_bounds(&self) -> bool {
        !self.bounds.contains(self.scroll)
    }

    fn update_min_max_scroll(&mut self, bound_scroll: bool) {
        self.bounds =
            ScrollBounds::compute(self.stack.visible_len(), &self.geometry, &self.config.layout);
        trace!(min = self.bounds.min, max = self.bounds.max, "scroll bounds updated");
        if bound_scroll {
            self.bound_scroll();
        }
    }

    /// Animate an out-of-bounds scroll back to the nearest bound.
    ///
    /// Returns the new animation, or `None` when already in bounds.
    ///
    /// # Errors
    /// Propagates pool invariant violations from cancelled animations.
    pub fn animate_bound_scroll(&mut self, duration: Duration, now: Duration) -> Result<Option<AnimationId>> {
        let target = self.bounds.clamp(self.scroll);
        if target == self.scroll {
            return Ok(None);
        }
        self.acquire_hw_layer();
        self.abort_scroll_animations()?;

        #[allow(clippy::cast_precision_loss)]
        let tween = Tween::new(self.scroll as f32, target as f32, now, duration);
        let id = self.scheduler.start_tween(
            AnimationTarget::StackScroll,
            tween,
            vec![OnFinish::ReleaseHwLayer],
        );
        self.scroll_animation = Some(id);
        debug!(from = self.scroll, to = target, "scroll snapping back");
        Ok(Some(id))
    }

    /// Stop any fling or scroll snap-back.
    ///
    /// # Errors
    /// Propagates pool invariant violations.
    pub fn abort_scroll_animations(&mut self) -> Result<()> {
        let mut events = Vec::new();
        if let Some(id) = self.fling.take() {
            events.extend(self.scheduler.cancel(id));
        }
        if let Some(id) = self.scroll_animation.take() {
            events.extend(self.scheduler.cancel(id));
        }
        self.apply_animation_events(events)
    }

    /// Fling the scroll at `velocity` px/s (positive moves towards the front).
    ///
    /// Starting out of bounds snaps back instead.
    ///
    /// # Errors
    /// Propagates pool invariant violations.
    pub fn start_fling(&mut self, velocity: f32, now: Duration) -> Result<Option<AnimationId>> {
        if self.is_scroll_out_of_bounds() {
            return self.animate_bound_scroll(self.config.animation.snap_scroll_back(), now);
        }
        self.abort_scroll_animations()?;
        self.acquire_hw_layer();

        #[allow(clippy::cast_precision_loss)]
        let fling = Fling::new(
            self.scroll as f32,
            velocity,
            self.config.touch.fling_friction,
            self.bounds.min as f32,
            self.bounds.max as f32,
            now,
        );
        let id = self.scheduler.start_fling(fling, vec![OnFinish::ReleaseHwLayer]);
        self.fling = Some(id);
        debug!(scroll = self.scroll, velocity, "fling started");
        Ok(Some(id))
    }

    // ---- card motion ----

    /// Set a card's horizontal translation.
    pub fn set_card_translation_x(&mut self, id: HandleId, x: f32) {
        if let Some(card) = self.attached_card_mut(id) {
            card.set_translation_x(x);
        }
    }

    /// Fly a card off-screen in the direction of `velocity` and dismiss its
    /// task once the animation completes.
    ///
    /// # Errors
    /// Propagates pool invariant violations from cancelled animations.
    pub fn animate_card_dismiss(
        &mut self,
        id: HandleId,
        velocity: f32,
        now: Duration,
    ) -> Result<Option<AnimationId>> {
        let Some((task, from)) = self
            .attached_card(id)
            .and_then(|card| card.task_id().map(|task| (task, card.translation_x())))
        else {
            return Ok(None);
        };
        self.cancel_card_snap_backs(|card| card == id)?;

        #[allow(clippy::cast_precision_loss)]
        let to = velocity.signum() * self.geometry.task.width() as f32;
        let cap = self.config.animation.swipe_dismiss();
        let duration = if velocity.abs() > 0.0 {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let millis = ((to - from).abs() * 1000.0 / velocity.abs()) as u64;
            Duration::from_millis(millis).min(cap)
        } else {
            cap
        };

        if let Some(card) = self.pool.get_mut(id) {
            card.set_dismissing(true);
        }
        self.acquire_hw_layer();
        let anim = self.scheduler.start_tween(
            AnimationTarget::CardDismiss(id, task),
            Tween::new(from, to, now, duration),
            vec![OnFinish::DismissTask(task), OnFinish::ReleaseHwLayer],
        );
        debug!(%task, velocity, ?duration, "card dismissing");
        Ok(Some(anim))
    }

    /// Return a swiped card to translation zero. `hold_hw_layer` keeps hardware
    /// layers on for the duration of the motion.
    ///
    /// # Errors
    /// Propagates pool invariant violations from cancelled animations.
    pub fn animate_card_snap_back(
        &mut self,
        id: HandleId,
        now: Duration,
        hold_hw_layer: bool,
    ) -> Result<Option<AnimationId>> {
        let Some(from) = self.attached_card(id).map(TaskCard::translation_x) else {
            return Ok(None);
        };
        self.cancel_card_snap_backs(|card| card == id)?;

        let mut on_finish = Vec::new();
        if hold_hw_layer {
            self.acquire_hw_layer();
            on_finish.push(OnFinish::ReleaseHwLayer);
        }
        let anim = self.scheduler.start_tween(
            AnimationTarget::CardTranslation(id),
            Tween::new(from, 0.0, now, self.config.animation.swipe_snap_back()),
            on_finish,
        );
        Ok(Some(anim))
    }

    /// Cancel snap-back motions of cards matching `pred`. Dismissals keep running.
    ///
    /// # Errors
    /// Propagates pool invariant violations.
    pub fn cancel_card_snap_backs<P>(&mut self, mut pred: P) -> Result<()>
    where
        P: FnMut(HandleId) -> bool,
    {
        let events = self.scheduler.cancel_where(|target| match target {
            AnimationTarget::CardTranslation(card) => pred(card),
            _ => false,
        });
        self.apply_animation_events(events)
    }

    /// Front-most card under `(x, y)`, ignoring cards that are being dismissed.
    pub fn find_card_at(&self, x: i32, y: i32) -> Option<HandleId> {
        self.attached.iter().rev().copied().find(|&id| {
            self.pool
                .get(id)
                .is_some_and(|card| !card.is_dismissing() && card.hit_test(x, y))
        })
    }

    // ---- hardware layers ----

    /// Take a hardware-layer reference, enabling layers on every attached card on 0 -> 1.
    pub fn acquire_hw_layer(&mut self) {
        if self.hw_layers.acquire() == HwLayerTransition::Enabled {
            self.fan_out_hw_layers(true);
        }
    }

    /// Drop a hardware-layer reference, disabling layers on 1 -> 0.
    ///
    /// # Panics
    /// When no reference is held.
    pub fn release_hw_layer(&mut self) {
        if self.hw_layers.release() == HwLayerTransition::Disabled {
            self.fan_out_hw_layers(false);
        }
    }

    fn fan_out_hw_layers(&mut self, enabled: bool) {
        trace!(enabled, cards = self.attached.len(), "hw layers toggled");
        for &id in &self.attached {
            if let Some(card) = self.pool.get_mut(id) {
                card.set_hw_layers(enabled);
            }
        }
        self.host.set_hw_layers_hint(enabled);
    }

    // ---- model changes ----

    /// Add a task at the front of the stack.
    ///
    /// # Errors
    /// [`StackError::Model`] when the id is already present.
    pub fn add_task(&mut self, task: Task) -> Result<()> {
        self.stack.add_task(task)?;
        self.handle_stack_events()
    }

    /// Remove a task without the dismiss side effects.
    ///
    /// # Errors
    /// [`StackError::Model`] when the task is unknown.
    pub fn remove_task(&mut self, id: TaskId) -> Result<Task> {
        let task = self.stack.remove_task(id)?;
        self.handle_stack_events()?;
        Ok(task)
    }

    /// Apply a filter to the stack.
    ///
    /// # Errors
    /// Propagates pool invariant violations.
    pub fn filter(&mut self, filter: TaskFilter) -> Result<bool> {
        let changed = self.stack.filter(filter);
        self.handle_stack_events()?;
        Ok(changed)
    }

    /// Clear the stack filter.
    ///
    /// # Errors
    /// Propagates pool invariant violations.
    pub fn unfilter(&mut self) -> Result<bool> {
        let changed = self.stack.unfilter();
        self.handle_stack_events()?;
        Ok(changed)
    }

    /// Remove a task the user dismissed and notify the collaborators.
    ///
    /// Returns `false` when the task was already gone.
    ///
    /// # Errors
    /// Propagates pool invariant violations.
    pub fn dismiss_task(&mut self, id: TaskId) -> Result<bool> {
        if !self.stack.contains(id) {
            return Ok(false);
        }
        let task = self.remove_task(id)?;
        self.data_source.delete_data(&task);
        self.host.on_task_removed(task.id);
        info!(task = %task.id, remaining = self.stack.len(), "task dismissed");
        if self.stack.is_empty() {
            info!("stack empty");
            self.host.on_stack_empty();
        }
        Ok(true)
    }

    /// Store freshly loaded data and refresh the card showing the task.
    ///
    /// Returns `false` for tasks no longer in the stack.
    pub fn on_task_data_changed(&mut self, id: TaskId, data: TaskData) -> bool {
        let Some(task) = self.stack.task_mut(id) else {
            trace!(task = %id, "data for unknown task ignored");
            return false;
        };
        task.apply(data);
        let snapshot = task.clone();
        if let Some(card) = self.card_for_task(id).and_then(|card| self.pool.get_mut(card)) {
            card.on_data_changed(&snapshot);
        }
        true
    }

    /// Hand a task to the host for launching.
    ///
    /// # Errors
    /// [`StackError::UnknownTask`] when the task is not in the stack.
    pub fn launch_task(&mut self, id: TaskId) -> Result<()> {
        let task = self.stack.task(id).ok_or(StackError::UnknownTask(id))?;
        info!(task = %id, "task launched");
        self.host.on_task_launched(task);
        Ok(())
    }

    /// Handle clicks queued by cards.
    ///
    /// # Errors
    /// Propagates pool invariant violations from filter changes.
    pub fn process_card_actions(&mut self) -> Result<usize> {
        let mut handled = 0;
        loop {
            let next = self.actions.borrow_mut().pop_front();
            let Some(action) = next else {
                break;
            };
            handled += 1;
            match action {
                CardAction::Launch(id) => {
                    if self.stack.contains(id) {
                        self.launch_task(id)?;
                    }
                }
                CardAction::IconClicked(id) => {
                    if self.stack.has_filter() {
                        self.unfilter()?;
                    } else if let Some(filter) = self.stack.task(id).map(TaskFilter::same_package_as) {
                        self.filter(filter)?;
                    }
                }
            }
        }
        Ok(handled)
    }

    // ---- internals ----

    fn attached_card(&self, id: HandleId) -> Option<&TaskCard<V>> {
        self.pool.get(id).filter(|_| self.pool.is_in_use(id))
    }

    fn attached_card_mut(&mut self, id: HandleId) -> Option<&mut TaskCard<V>> {
        if !self.pool.is_in_use(id) {
            return None;
        }
        self.pool.get_mut(id)
    }

    fn acquire_card(&mut self, task: &Task, index: usize) -> HandleId {
        let actions = CardActions::new(&self.actions);
        let id = self
            .pool
            .acquire(task, || TaskCard::new((self.factory)(), actions));
        self.data_source.load_data(task);

        let hw_enabled = self.hw_layers.is_enabled();
        if let Some(card) = self.pool.get_mut(id) {
            card.set_hw_layers(hw_enabled);
        }

        if !self.attached.contains(&id) {
            let insert_at = self
                .attached
                .iter()
                .position(|&other| {
                    self.pool
                        .get(other)
                        .and_then(TaskCard::task_id)
                        .and_then(|task| self.stack.visible_index_of(task))
                        .is_some_and(|other_index| index < other_index)
                })
                .unwrap_or(self.attached.len());
            self.attached.insert(insert_at, id);
        }
        trace!(task = %task.id, index, "card acquired");
        id
    }

    fn release_card(&mut self, id: HandleId) -> Result<()> {
        let task = self.pool.get(id).and_then(TaskCard::task).cloned();
        self.cancel_card_snap_backs(|card| card == id)?;

        if let Some(task) = &task {
            self.data_source.unload_data(task);
            if let Some(stored) = self.stack.task_mut(task.id) {
                stored.clear_data();
            }
        }
        self.pool.release(id)?;
        self.attached.retain(|&other| other != id);
        trace!(task = ?task.map(|task| task.id), "card released");
        Ok(())
    }

    fn handle_stack_events(&mut self) -> Result<()> {
        loop {
            let next = self.stack_events.borrow_mut().pop_front();
            let Some(event) = next else {
                break;
            };
            match event {
                StackEvent::TaskAdded(id) => {
                    debug!(task = %id, "task added");
                    self.update_min_max_scroll(false);
                    self.request_sync(Duration::ZERO);
                }
                StackEvent::TaskRemoved(task) => {
                    debug!(task = %task.id, "task removed");
                    if let Some(card) = self.card_for_task(task.id) {
                        self.release_card(card)?;
                    }
                    self.update_min_max_scroll(true);
                    self.request_sync(self.config.animation.task_removed_reshuffle());
                }
                StackEvent::Filtered | StackEvent::Unfiltered => {
                    debug!(visible = self.stack.visible_len(), "stack filter changed");
                    self.update_min_max_scroll(true);
                    self.request_sync(Duration::ZERO);
                }
            }
        }
        Ok(())
    }

    fn apply_animation_events(&mut self, events: Vec<AnimationEvent>) -> Result<()> {
        for event in events {
            match event {
                AnimationEvent::Update {
                    target,
                    value,
                    progress,
                    ..
                } => self.apply_animation_value(target, value, progress),
                AnimationEvent::Finished { id, on_finish, .. } => {
                    if self.scroll_animation == Some(id) {
                        self.scroll_animation = None;
                    }
                    if self.fling == Some(id) {
                        self.fling = None;
                        debug!(scroll = self.scroll, "fling finished");
                    }
                    for action in on_finish {
                        match action {
                            OnFinish::ReleaseHwLayer => self.release_hw_layer(),
                            OnFinish::DismissTask(task) => {
                                self.dismiss_task(task)?;
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn apply_animation_value(&mut self, target: AnimationTarget, value: f32, progress: f32) {
        match target {
            AnimationTarget::StackScroll => self.set_stack_scroll(value.round() as i32),
            AnimationTarget::CardTranslation(id) => {
                if let Some(card) = self.attached_card_mut(id)
                    && !card.is_dismissing()
                {
                    card.set_translation_x(value);
                }
            }
            AnimationTarget::CardDismiss(id, task) => {
                if let Some(card) = self.attached_card_mut(id)
                    && card.is_dismissing()
                    && card.is_bound_to(task)
                {
                    card.set_translation_x(value);
                    card.set_alpha(1.0 - progress);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TestSync, recording_stack as synchronizer};
    use recents_core::ContentRef;

    fn attached_ids(sync: &TestSync) -> Vec<TaskId> {
        sync.attached_cards().filter_map(|(_, card)| card.task_id()).collect()
    }

    #[test]
    fn first_layout_scrolls_to_front_and_syncs_without_animation() {
        let (sync, recorder) = synchronizer(5);
        assert_eq!(sync.stack_scroll(), 812);
        assert!(!sync.is_dirty());
        assert_eq!(attached_ids(&sync), vec![TaskId(1), TaskId(2), TaskId(3), TaskId(4), TaskId(5)]);
        assert!(recorder.count("load") == 5);
        assert!(recorder.transforms().iter().all(|(_, duration)| duration.is_zero()));
    }

    #[test]
    fn second_sync_without_changes_is_a_no_op() {
        let (mut sync, recorder) = synchronizer(5);
        let before = recorder.calls();
        let report = sync.synchronize().unwrap_or_else(|err| panic!("sync: {err}"));
        assert_eq!(report, SyncReport::default());
        assert_eq!(recorder.calls(), before);
    }

    #[test]
    fn request_sync_keeps_the_longest_duration() {
        let (mut sync, recorder) = synchronizer(3);
        sync.request_sync(Duration::from_millis(200));
        sync.request_sync(Duration::from_millis(50));
        assert_eq!(sync.pending_duration(), Duration::from_millis(200));
        assert_eq!(recorder.count("redraw"), 1);

        sync.synchronize().unwrap_or_else(|err| panic!("sync: {err}"));
        assert_eq!(sync.pending_duration(), Duration::ZERO);
        assert!(!sync.is_dirty());
    }

    #[test]
    fn scrolling_to_the_back_releases_front_cards() {
        let (mut sync, _) = synchronizer(12);
        let attached_front = attached_ids(&sync);
        assert!(attached_front.contains(&TaskId(12)));
        assert!(!attached_front.contains(&TaskId(1)));

        sync.set_stack_scroll(sync.scroll_bounds().min);
        let report = sync.synchronize().unwrap_or_else(|err| panic!("sync: {err}"));
        assert!(report.acquired > 0);
        assert!(report.released > 0);

        let attached_back = attached_ids(&sync);
        assert!(attached_back.contains(&TaskId(1)));
        assert!(!attached_back.contains(&TaskId(12)));
        let mut sorted = attached_back.clone();
        sorted.sort();
        assert_eq!(attached_back, sorted, "attached cards stay ordered back to front");
    }

    #[test]
    fn removing_a_task_releases_its_card_and_reshuffles() {
        let (mut sync, recorder) = synchronizer(5);
        sync.remove_task(TaskId(5)).unwrap_or_else(|err| panic!("remove: {err}"));

        assert!(sync.card_for_task(TaskId(5)).is_none());
        assert_eq!(recorder.count("unload"), 1);
        assert_eq!(sync.pending_duration(), Duration::from_millis(200));
        assert_eq!(sync.scroll_bounds().max, 547);
        assert_eq!(sync.stack_scroll(), 547);
    }

    #[test]
    fn filter_recomputes_bounds_and_reattaches() {
        let (mut sync, _) = synchronizer(6);
        assert!(sync.filter(TaskFilter::text("even")).unwrap_or_else(|err| panic!("filter: {err}")));
        sync.synchronize().unwrap_or_else(|err| panic!("sync: {err}"));
        assert_eq!(attached_ids(&sync), vec![TaskId(2), TaskId(4), TaskId(6)]);
        assert!(!sync.is_scroll_out_of_bounds());

        assert!(sync.unfilter().unwrap_or_else(|err| panic!("unfilter: {err}")));
        sync.synchronize().unwrap_or_else(|err| panic!("sync: {err}"));
        assert!(attached_ids(&sync).len() >= 3);
    }

    #[test]
    fn data_changes_reach_the_bound_card_only() {
        let (mut sync, recorder) = synchronizer(3);
        let data = TaskData {
            title: Some("Inbox".into()),
            ..TaskData::default()
        };
        assert!(sync.on_task_data_changed(TaskId(2), data.clone()));
        assert_eq!(recorder.count("data_changed"), 1);
        assert_eq!(
            sync.stack().task(TaskId(2)).and_then(|task| task.title.as_deref()),
            Some("Inbox")
        );
        assert!(!sync.on_task_data_changed(TaskId(99), data));
    }

    #[test]
    fn icon_click_toggles_package_filter_and_launch_reaches_host() {
        let (mut sync, recorder) = synchronizer(4);
        let Some(card) = sync.card_for_task(TaskId(1)) else {
            panic!("task 1 must be attached");
        };
        let Some(view) = sync.card(card).map(TaskCard::view) else {
            panic!("card must exist");
        };
        view.click_icon();
        view.click();
        assert_eq!(sync.process_card_actions().unwrap_or_else(|err| panic!("{err}")), 2);
        assert!(sync.stack().has_filter());
        assert_eq!(sync.stack().visible_len(), 2);
        assert_eq!(recorder.count("launched"), 1);

        if let Some(card) = sync.card_for_task(TaskId(1)).and_then(|card| sync.card(card)) {
            card.view().click_icon();
        }
        sync.process_card_actions().unwrap_or_else(|err| panic!("{err}"));
        assert!(!sync.stack().has_filter());
    }

    #[test]
    fn bound_scroll_animation_returns_to_range_and_balances_hw_layers() {
        let (mut sync, _) = synchronizer(5);
        sync.set_stack_scroll(1000);
        assert!(sync.is_scroll_out_of_bounds());

        let started = sync
            .animate_bound_scroll(Duration::from_millis(650), Duration::ZERO)
            .unwrap_or_else(|err| panic!("animate: {err}"));
        assert!(started.is_some());
        assert_eq!(sync.hw_layer_count(), 1);
        assert!(sync.attached_cards().all(|(_, card)| card.hw_layers_enabled()));

        sync.on_frame(Duration::from_millis(700))
            .unwrap_or_else(|err| panic!("frame: {err}"));
        assert_eq!(sync.stack_scroll(), 812);
        assert_eq!(sync.hw_layer_count(), 0);
        assert!(sync.attached_cards().all(|(_, card)| !card.hw_layers_enabled()));
    }

    #[test]
    fn aborting_a_fling_releases_its_hw_layer_once() {
        let (mut sync, _) = synchronizer(8);
        sync.set_stack_scroll(400);
        let fling = sync
            .start_fling(-2000.0, Duration::ZERO)
            .unwrap_or_else(|err| panic!("fling: {err}"));
        assert!(fling.is_some());
        assert!(sync.is_flinging());
        assert_eq!(sync.hw_layer_count(), 1);

        sync.abort_scroll_animations().unwrap_or_else(|err| panic!("abort: {err}"));
        sync.abort_scroll_animations().unwrap_or_else(|err| panic!("abort: {err}"));
        assert!(!sync.is_flinging());
        assert_eq!(sync.hw_layer_count(), 0);
    }

    #[test]
    fn dismiss_completion_is_guarded_after_release() {
        let (mut sync, recorder) = synchronizer(5);
        let Some(card) = sync.card_for_task(TaskId(5)) else {
            panic!("front card must be attached");
        };
        sync.set_card_translation_x(card, 100.0);
        sync.animate_card_dismiss(card, 1500.0, Duration::ZERO)
            .unwrap_or_else(|err| panic!("dismiss: {err}"));

        sync.remove_task(TaskId(5)).unwrap_or_else(|err| panic!("remove: {err}"));
        sync.on_frame(Duration::from_millis(400))
            .unwrap_or_else(|err| panic!("frame: {err}"));

        assert_eq!(sync.stack().len(), 4);
        assert_eq!(recorder.count("removed"), 0);
        assert_eq!(sync.hw_layer_count(), 0);
    }

    #[test]
    fn stale_dismiss_motion_leaves_a_reused_card_alone() {
        let (mut sync, _) = synchronizer(5);
        let Some(card) = sync.card_for_task(TaskId(5)) else {
            panic!("front card must be attached");
        };
        sync.set_card_translation_x(card, 100.0);
        sync.animate_card_dismiss(card, 1500.0, Duration::ZERO)
            .unwrap_or_else(|err| panic!("dismiss: {err}"));

        sync.remove_task(TaskId(5)).unwrap_or_else(|err| panic!("remove: {err}"));
        sync.add_task(Task::new(TaskId(6), ContentRef::new("org.even.app", "Activity6")))
            .unwrap_or_else(|err| panic!("add: {err}"));
        sync.set_stack_scroll(sync.scroll_bounds().max);
        sync.synchronize().unwrap_or_else(|err| panic!("sync: {err}"));
        assert_eq!(sync.card_for_task(TaskId(6)), Some(card), "released view is reused");

        sync.set_card_translation_x(card, -50.0);
        sync.animate_card_dismiss(card, -1500.0, Duration::from_millis(100))
            .unwrap_or_else(|err| panic!("dismiss: {err}"));
        sync.on_frame(Duration::from_millis(150))
            .unwrap_or_else(|err| panic!("frame: {err}"));

        let translation = sync.card(card).map_or(0.0, TaskCard::translation_x);
        assert!(translation < -50.0, "only the second dismissal moves the card, got {translation}");
    }

    #[test]
    fn dismissing_the_last_task_empties_the_stack() {
        let (mut sync, recorder) = synchronizer(1);
        assert!(sync.dismiss_task(TaskId(1)).unwrap_or_else(|err| panic!("dismiss: {err}")));
        assert!(!sync.dismiss_task(TaskId(1)).unwrap_or_else(|err| panic!("dismiss: {err}")));
        assert_eq!(recorder.count("delete"), 1);
        assert_eq!(recorder.count("removed"), 1);
        assert_eq!(recorder.count("empty"), 1);
    }

    #[test]
    fn launching_an_unknown_task_fails() {
        let (mut sync, recorder) = synchronizer(2);
        sync.launch_task(TaskId(2)).unwrap_or_else(|err| panic!("launch: {err}"));
        assert_eq!(recorder.count("launched"), 1);
        assert_eq!(sync.launch_task(TaskId(9)), Err(StackError::UnknownTask(TaskId(9))));
    }

    #[test]
    fn duplicate_add_is_reported() {
        let (mut sync, _) = synchronizer(2);
        let Some(task) = sync.stack().task(TaskId(1)).cloned() else {
            panic!("task 1");
        };
        let Err(err) = sync.add_task(task) else {
            panic!("duplicate must fail");
        };
        assert!(matches!(err, StackError::Model(_)));
    }
}
