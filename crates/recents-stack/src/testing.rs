//! Recording collaborators shared by unit tests.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use recents_core::{ContentRef, Task, TaskId, TaskStack};

use crate::config::StackConfig;
use crate::host::{RecentsHost, TaskDataSource};
use crate::synchronizer::StackSynchronizer;
use crate::transform::TaskTransform;
use crate::view::{CardAction, CardActions, CardView};

#[derive(Debug, Default)]
struct Log {
    calls: Vec<(&'static str, Option<TaskId>)>,
    transforms: Vec<(TaskTransform, Duration)>,
}

/// Shared call log written by every recording collaborator.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    log: Rc<RefCell<Log>>,
}

impl Recorder {
    fn push(&self, call: &'static str, task: Option<TaskId>) {
        self.log.borrow_mut().calls.push((call, task));
    }

    pub fn count(&self, call: &str) -> usize {
        self.log
            .borrow()
            .calls
            .iter()
            .filter(|(name, _)| *name == call)
            .count()
    }

    pub fn calls(&self) -> usize {
        self.log.borrow().calls.len()
    }

    pub fn transforms(&self) -> Vec<(TaskTransform, Duration)> {
        self.log.borrow().transforms.clone()
    }
}

/// Stack of `count` tasks. Even ids share one package, odd ids another.
pub fn sample_stack(count: u32) -> TaskStack {
    let tasks = (1..=count).map(|id| {
        let package = if id % 2 == 0 { "org.even.app" } else { "org.odd.app" };
        Task::new(TaskId(id), ContentRef::new(package, format!("Activity{id}")))
    });
    TaskStack::from_tasks(tasks).unwrap_or_else(|err| panic!("sample stack: {err}"))
}

pub type TestSync = StackSynchronizer<RecordingView, RecordingSource, RecordingHost>;

/// Synchronizer over `count` sample tasks laid out on a 480x800 surface.
pub fn recording_stack(count: u32) -> (TestSync, Recorder) {
    let recorder = Recorder::default();
    let views = recorder.clone();
    let mut sync = StackSynchronizer::new(
        sample_stack(count),
        StackConfig::default(),
        RecordingSource::new(&recorder),
        RecordingHost::new(&recorder),
        move || RecordingView::new(&views),
    );
    sync.set_size(480, 800)
        .unwrap_or_else(|err| panic!("initial layout failed: {err}"));
    (sync, recorder)
}

#[derive(Debug)]
pub struct RecordingView {
    recorder: Recorder,
    task: Option<TaskId>,
    actions: CardActions,
}

impl RecordingView {
    pub fn new(recorder: &Recorder) -> Self {
        Self {
            recorder: recorder.clone(),
            task: None,
            actions: CardActions::default(),
        }
    }

    pub fn click(&self) {
        if let Some(id) = self.task {
            self.actions.send(CardAction::Launch(id));
        }
    }

    pub fn click_icon(&self) {
        if let Some(id) = self.task {
            self.actions.send(CardAction::IconClicked(id));
        }
    }
}

impl CardView for RecordingView {
    fn bind(&mut self, task: &Task, actions: &CardActions) {
        self.task = Some(task.id);
        self.actions = actions.clone();
        self.recorder.push("bind", Some(task.id));
    }

    fn unbind(&mut self) {
        self.recorder.push("unbind", self.task.take());
    }

    fn apply_transform(&mut self, transform: &TaskTransform, duration: Duration) {
        self.recorder
            .log
            .borrow_mut()
            .transforms
            .push((*transform, duration));
    }

    fn set_translation_x(&mut self, _x: f32) {}

    fn set_alpha(&mut self, _alpha: f32) {}

    fn reset_properties(&mut self) {}

    fn on_data_changed(&mut self, task: &Task) {
        self.recorder.push("data_changed", Some(task.id));
    }
}

#[derive(Debug)]
pub struct RecordingSource {
    recorder: Recorder,
}

impl RecordingSource {
    pub fn new(recorder: &Recorder) -> Self {
        Self {
            recorder: recorder.clone(),
        }
    }
}

impl TaskDataSource for RecordingSource {
    fn load_data(&mut self, task: &Task) {
        self.recorder.push("load", Some(task.id));
    }

    fn unload_data(&mut self, task: &Task) {
        self.recorder.push("unload", Some(task.id));
    }

    fn delete_data(&mut self, task: &Task) {
        self.recorder.push("delete", Some(task.id));
    }
}

#[derive(Debug)]
pub struct RecordingHost {
    recorder: Recorder,
}

impl RecordingHost {
    pub fn new(recorder: &Recorder) -> Self {
        Self {
            recorder: recorder.clone(),
        }
    }
}

impl RecentsHost for RecordingHost {
    fn on_task_removed(&mut self, id: TaskId) {
        self.recorder.push("removed", Some(id));
    }

    fn on_stack_empty(&mut self) {
        self.recorder.push("empty", None);
    }

    fn on_task_launched(&mut self, task: &Task) {
        self.recorder.push("launched", Some(task.id));
    }

    fn request_redraw(&mut self) {
        self.recorder.push("redraw", None);
    }

    fn request_disallow_intercept(&mut self, disallow: bool) {
        if disallow {
            self.recorder.push("disallow_intercept", None);
        }
    }
}
