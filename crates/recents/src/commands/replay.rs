//! Headless replay of recorded pointer traces.

use std::cell::RefCell;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use recents_core::{ContentRef, Task, TaskData, TaskId, TaskStack};
use recents_stack::{
    CardAction, CardActions, CardView, PointerAction, PointerEvent, RecentsHost, StackConfig,
    StackSynchronizer, TaskDataSource, TaskTransform,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::touch::{Tappable, TouchDispatcher};

#[derive(Debug, Deserialize)]
pub struct Trace {
    width: i32,
    height: i32,
    tasks: Vec<TraceTask>,
    #[serde(default)]
    events: Vec<TraceEvent>,
}

#[derive(Debug, Deserialize)]
struct TraceTask {
    id: u32,
    package: String,
    #[serde(default = "default_component")]
    component: String,
    #[serde(default)]
    title: Option<String>,
}

fn default_component() -> String {
    "main".to_owned()
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum TraceEvent {
    Down(PointerSample),
    Move(PointerSample),
    Up(PointerSample),
    Cancel(PointerSample),
    Frame { t_ms: u64 },
}

#[derive(Debug, Deserialize)]
struct PointerSample {
    #[serde(default)]
    pointer: u32,
    x: f32,
    y: f32,
    t_ms: u64,
}

impl PointerSample {
    const fn to_event(&self, action: PointerAction) -> PointerEvent {
        PointerEvent {
            action,
            pointer_id: self.pointer,
            x: self.x,
            y: self.y,
            time: Duration::from_millis(self.t_ms),
        }
    }
}

/// Collaborator call observed during a replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum Call {
    LoadData { task: TaskId },
    UnloadData { task: TaskId },
    DeleteData { task: TaskId },
    TaskRemoved { task: TaskId },
    StackEmpty,
    TaskLaunched { task: TaskId },
    HwLayers { enabled: bool },
}

type CallLog = Rc<RefCell<Vec<Call>>>;

struct ReplayHost {
    calls: CallLog,
}

impl RecentsHost for ReplayHost {
    fn on_task_removed(&mut self, id: TaskId) {
        self.calls.borrow_mut().push(Call::TaskRemoved { task: id });
    }

    fn on_stack_empty(&mut self) {
        self.calls.borrow_mut().push(Call::StackEmpty);
    }

    fn on_task_launched(&mut self, task: &Task) {
        self.calls.borrow_mut().push(Call::TaskLaunched { task: task.id });
    }

    fn set_hw_layers_hint(&mut self, enabled: bool) {
        self.calls.borrow_mut().push(Call::HwLayers { enabled });
    }
}

/// Answers loads on the next event boundary, like an asynchronous loader would.
struct ReplaySource {
    calls: CallLog,
    pending: Rc<RefCell<Vec<TaskId>>>,
}

impl TaskDataSource for ReplaySource {
    fn load_data(&mut self, task: &Task) {
        self.calls.borrow_mut().push(Call::LoadData { task: task.id });
        self.pending.borrow_mut().push(task.id);
    }

    fn unload_data(&mut self, task: &Task) {
        self.calls.borrow_mut().push(Call::UnloadData { task: task.id });
        self.pending.borrow_mut().retain(|id| *id != task.id);
    }

    fn delete_data(&mut self, task: &Task) {
        self.calls.borrow_mut().push(Call::DeleteData { task: task.id });
    }
}

#[derive(Default)]
struct ReplayView {
    task: Option<TaskId>,
    actions: CardActions,
}

impl CardView for ReplayView {
    fn bind(&mut self, task: &Task, actions: &CardActions) {
        self.task = Some(task.id);
        self.actions = actions.clone();
    }

    fn unbind(&mut self) {
        self.task = None;
    }

    fn apply_transform(&mut self, _transform: &TaskTransform, _duration: Duration) {}

    fn set_translation_x(&mut self, _x: f32) {}

    fn set_alpha(&mut self, _alpha: f32) {}

    fn reset_properties(&mut self) {}
}

impl Tappable for ReplayView {
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

/// Outcome of a replay.
#[derive(Debug, Serialize)]
pub struct ReplayReport {
    pub calls: Vec<Call>,
    pub remaining: Vec<TaskId>,
    pub scroll: i32,
    pub hw_layers: u32,
    pub attached: Vec<AttachedCard>,
}

#[derive(Debug, Serialize)]
pub struct AttachedCard {
    pub task: TaskId,
    pub rect: [i32; 4],
    pub translation_x: f32,
}

pub fn replay_file(path: &Path, config: StackConfig) -> Result<ReplayReport> {
    let contents = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let trace: Trace =
        serde_json::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))?;
    replay(&trace, config)
}

pub fn replay(trace: &Trace, config: StackConfig) -> Result<ReplayReport> {
    let calls = CallLog::default();
    let pending = Rc::new(RefCell::new(Vec::new()));
    let titles: Vec<(TaskId, Option<String>)> =
        trace.tasks.iter().map(|task| (TaskId(task.id), task.title.clone())).collect();

    let stack = TaskStack::from_tasks(trace.tasks.iter().map(|task| {
        Task::new(TaskId(task.id), ContentRef::new(task.package.clone(), task.component.clone()))
    }))?;

    let mut dispatcher = TouchDispatcher::new(config.touch.clone());
    let mut sync = StackSynchronizer::new(
        stack,
        config,
        ReplaySource {
            calls: Rc::clone(&calls),
            pending: Rc::clone(&pending),
        },
        ReplayHost {
            calls: Rc::clone(&calls),
        },
        ReplayView::default,
    );
    sync.set_size(trace.width, trace.height)?;
    deliver_loads(&mut sync, &pending, &titles);

    info!(tasks = trace.tasks.len(), events = trace.events.len(), "replaying trace");
    for event in &trace.events {
        match event {
            TraceEvent::Down(sample) => dispatcher.dispatch(&mut sync, &sample.to_event(PointerAction::Down))?,
            TraceEvent::Move(sample) => dispatcher.dispatch(&mut sync, &sample.to_event(PointerAction::Move))?,
            TraceEvent::Up(sample) => dispatcher.dispatch(&mut sync, &sample.to_event(PointerAction::Up))?,
            TraceEvent::Cancel(sample) => {
                dispatcher.dispatch(&mut sync, &sample.to_event(PointerAction::Cancel))?;
            }
            TraceEvent::Frame { t_ms } => {
                let report = sync.on_frame(Duration::from_millis(*t_ms))?;
                debug!(t_ms, ?report, "frame");
            }
        }
        deliver_loads(&mut sync, &pending, &titles);
    }

    let attached = sync
        .attached_cards()
        .filter_map(|(_, card)| {
            let rect = card.transform().rect;
            card.task_id().map(|task| AttachedCard {
                task,
                rect: [rect.left, rect.top, rect.right, rect.bottom],
                translation_x: card.translation_x(),
            })
        })
        .collect();

    let report = ReplayReport {
        calls: calls.borrow().clone(),
        remaining: sync.stack().tasks().iter().map(|task| task.id).collect(),
        scroll: sync.stack_scroll(),
        hw_layers: sync.hw_layer_count(),
        attached,
    };
    Ok(report)
}

fn deliver_loads<V, D, H>(
    sync: &mut StackSynchronizer<V, D, H>,
    pending: &RefCell<Vec<TaskId>>,
    titles: &[(TaskId, Option<String>)],
) where
    V: CardView,
    D: TaskDataSource,
    H: RecentsHost,
{
    let ready: Vec<TaskId> = pending.borrow_mut().drain(..).collect();
    for id in ready {
        let title = titles
            .iter()
            .find(|(task, _)| *task == id)
            .and_then(|(_, title)| title.clone());
        sync.on_task_data_changed(id, TaskData {
            title,
            ..TaskData::default()
        });
    }
}

impl ReplayReport {
    pub fn render(&self) -> String {
        let mut out = String::new();
        for call in &self.calls {
            let line = match call {
                Call::LoadData { task } => format!("load_data {task}"),
                Call::UnloadData { task } => format!("unload_data {task}"),
                Call::DeleteData { task } => format!("delete_data {task}"),
                Call::TaskRemoved { task } => format!("task_removed {task}"),
                Call::StackEmpty => "stack_empty".to_owned(),
                Call::TaskLaunched { task } => format!("task_launched {task}"),
                Call::HwLayers { enabled } => format!("hw_layers {}", if *enabled { "on" } else { "off" }),
            };
            let _ = writeln!(out, "{line}");
        }
        let remaining: Vec<String> = self.remaining.iter().map(ToString::to_string).collect();
        let _ = writeln!(
            out,
            "-- scroll {} hw_layers {} remaining [{}]",
            self.scroll,
            self.hw_layers,
            remaining.join(", ")
        );
        out
    }
}
