//! Card views and their pool adapter.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use std::time::Duration;

use recents_core::{Task, TaskId};

use crate::pool::PoolableView;
use crate::transform::TaskTransform;

/// Renderer-side card. The engine never draws; it only pushes state here.
pub trait CardView {
    /// Show `task`. `actions` routes clicks back to the synchronizer.
    fn bind(&mut self, task: &Task, actions: &CardActions);

    /// Forget the bound task.
    fn unbind(&mut self);

    /// Move towards `transform` over `duration` (zero means jump).
    fn apply_transform(&mut self, transform: &TaskTransform, duration: Duration);

    /// Horizontal swipe offset.
    fn set_translation_x(&mut self, x: f32);

    /// Opacity in `[0, 1]`.
    fn set_alpha(&mut self, alpha: f32);

    /// Clear translation, alpha and any transform state.
    fn reset_properties(&mut self);

    /// Display data of the bound task changed.
    fn on_data_changed(&mut self, _task: &Task) {}

    /// Toggle hardware layers for this card.
    fn set_hw_layers_enabled(&mut self, _enabled: bool) {}

    /// The card joined or left the set of drawn children.
    fn set_attached(&mut self, _attached: bool) {}
}

/// User interaction reported by a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardAction {
    /// Thumbnail was tapped.
    Launch(TaskId),
    /// Application icon was tapped.
    IconClicked(TaskId),
}

pub(crate) type ActionQueue = Rc<RefCell<VecDeque<CardAction>>>;

/// Non-owning sender into the synchronizer's action queue.
#[derive(Debug, Clone, Default)]
pub struct CardActions {
    queue: Weak<RefCell<VecDeque<CardAction>>>,
}

impl CardActions {
    pub(crate) fn new(queue: &ActionQueue) -> Self {
        Self {
            queue: Rc::downgrade(queue),
        }
    }

    /// Queue an action. Returns `false` once the synchronizer is gone.
    pub fn send(&self, action: CardAction) -> bool {
        self.queue.upgrade().is_some_and(|queue| {
            queue.borrow_mut().push_back(action);
            true
        })
    }
}

/// Pool element pairing a renderer view with the engine-side card state.
#[derive(Debug)]
pub struct TaskCard<V> {
    view: V,
    actions: CardActions,
    task: Option<Task>,
    bound: bool,
    transform: TaskTransform,
    translation_x: f32,
    alpha: f32,
    dismissing: bool,
    hw_layers: bool,
}

#[allow(clippy::missing_const_for_fn)]
impl<V: CardView> TaskCard<V> {
    /// Wrap a freshly created view.
    pub fn new(view: V, actions: CardActions) -> Self {
        Self {
            view,
            actions,
            task: None,
            bound: false,
            transform: TaskTransform::default(),
            translation_x: 0.0,
            alpha: 1.0,
            dismissing: false,
            hw_layers: false,
        }
    }

    /// Bound task, `None` while idle.
    pub fn task(&self) -> Option<&Task> {
        self.task.as_ref().filter(|_| self.bound)
    }

    /// Id of the bound task.
    pub fn task_id(&self) -> Option<TaskId> {
        self.task().map(|task| task.id)
    }

    /// Whether the card is bound to the task with `id`.
    pub fn is_bound_to(&self, id: TaskId) -> bool {
        self.task_id() == Some(id)
    }

    /// Renderer view.
    pub fn view(&self) -> &V {
        &self.view
    }

    /// Mutable renderer view.
    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// Last transform pushed to the view.
    pub fn transform(&self) -> &TaskTransform {
        &self.transform
    }

    /// Current swipe offset.
    pub fn translation_x(&self) -> f32 {
        self.translation_x
    }

    /// Current opacity.
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Whether a dismiss animation owns this card.
    pub fn is_dismissing(&self) -> bool {
        self.dismissing
    }

    /// Whether hardware layers are on.
    pub fn hw_layers_enabled(&self) -> bool {
        self.hw_layers
    }

    pub(crate) fn apply_transform(&mut self, transform: &TaskTransform, duration: Duration) {
        self.transform = *transform;
        self.view.apply_transform(transform, duration);
    }

    pub(crate) fn set_translation_x(&mut self, x: f32) {
        self.translation_x = x;
        self.view.set_translation_x(x);
    }

    pub(crate) fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha;
        self.view.set_alpha(alpha);
    }

    pub(crate) fn set_dismissing(&mut self, dismissing: bool) {
        self.dismissing = dismissing;
    }

    pub(crate) fn set_hw_layers(&mut self, enabled: bool) {
        if self.hw_layers != enabled {
            self.hw_layers = enabled;
            self.view.set_hw_layers_enabled(enabled);
        }
    }

    pub(crate) fn on_data_changed(&mut self, task: &Task) {
        if let Some(current) = self.task.as_mut().filter(|_| self.bound) {
            current.clone_from(task);
            self.view.on_data_changed(task);
        }
    }

    /// Whether `(x, y)` falls inside the card as currently drawn.
    pub fn hit_test(&self, x: i32, y: i32) -> bool {
        #[allow(clippy::cast_possible_truncation)]
        let dx = self.translation_x as i32;
        self.bound && self.transform.visible && self.transform.rect.offset(dx, 0).contains(x, y)
    }

    fn reset_state(&mut self) {
        self.translation_x = 0.0;
        self.alpha = 1.0;
        self.dismissing = false;
        self.view.reset_properties();
    }
}

impl<V: CardView> PoolableView for TaskCard<V> {
    type Key = Task;

    fn matches(&self, key: &Task) -> bool {
        self.task.as_ref() == Some(key)
    }

    fn prepare_leave(&mut self, _key: &Task, _is_new: bool) {
        self.reset_state();
        self.view.set_attached(true);
    }

    fn bind(&mut self, key: &Task) {
        self.task = Some(key.clone());
        self.bound = true;
        self.view.bind(key, &self.actions);
    }

    fn prepare_enter(&mut self) {
        self.reset_state();
        self.transform = TaskTransform::default();
        self.set_hw_layers(false);
        self.view.set_attached(false);
    }

    fn unbind(&mut self) {
        self.bound = false;
        if let Some(task) = self.task.as_mut() {
            task.clear_data();
        }
        self.view.unbind();
    }
}
