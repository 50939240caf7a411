use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use recents_core::{ContentRef, Task, TaskId, TaskStack};
use recents_stack::{PointerAction, PointerEvent, StackConfig, StackSynchronizer};

use super::loader::DataLoader;
use super::view::{PreviewHost, PreviewView};
use crate::touch::{Tappable, TouchDispatcher};

/// Pixels per terminal cell. Layout runs in pixels; the screen is a grid.
pub const CELL_WIDTH: i32 = 8;
pub const CELL_HEIGHT: i32 = 16;

const PACKAGES: [&str; 6] = [
    "org.example.mail",
    "org.example.maps",
    "org.example.notes",
    "org.example.browser",
    "org.example.camera",
    "org.example.music",
];

pub type PreviewSync = StackSynchronizer<PreviewView, DataLoader, PreviewHost>;

pub struct App {
    pub sync: PreviewSync,
    dispatcher: TouchDispatcher,
    started: Instant,
    next_id: u32,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: StackConfig, tasks: u32, loader: DataLoader) -> Result<Self> {
        let stack = TaskStack::from_tasks((1..=tasks).map(synthetic_task))?;
        let dispatcher = TouchDispatcher::new(config.touch.clone());
        let sync = StackSynchronizer::new(stack, config, loader, PreviewHost::default(), PreviewView::default);
        Ok(Self {
            sync,
            dispatcher,
            started: Instant::now(),
            next_id: tasks + 1,
            should_quit: false,
        })
    }

    /// Resize the surface to a `columns` x `rows` card area.
    pub fn resize(&mut self, columns: u16, rows: u16) -> Result<()> {
        self.sync
            .set_size(i32::from(columns) * CELL_WIDTH, i32::from(rows) * CELL_HEIGHT)?;
        Ok(())
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Advance animations and pick up loaded data.
    pub fn tick(&mut self) -> Result<()> {
        for (id, data) in self.sync.data_source_mut().poll() {
            self.sync.on_task_data_changed(id, data);
        }
        self.sync.on_frame(self.elapsed())?;
        if self.sync.host().stack_empty {
            self.should_quit = true;
        }
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('a') => {
                let task = synthetic_task(self.next_id);
                self.next_id += 1;
                self.sync.add_task(task)?;
            }
            KeyCode::Char('f') => {
                if let Some((_, card)) = self.sync.attached_cards().last() {
                    card.view().tap_icon();
                }
            }
            KeyCode::Enter => {
                if let Some(id) = self.sync.attached_cards().last().and_then(|(_, card)| card.task_id()) {
                    self.sync.launch_task(id)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Feed a mouse event, given in cells relative to the card area.
    pub fn handle_mouse(&mut self, mouse: MouseEvent) -> Result<()> {
        let action = match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => PointerAction::Down,
            MouseEventKind::Drag(MouseButton::Left) => PointerAction::Move,
            MouseEventKind::Up(MouseButton::Left) => PointerAction::Up,
            _ => return Ok(()),
        };
        let event = pointer_event(action, mouse.column, mouse.row, self.elapsed());
        self.dispatcher.dispatch(&mut self.sync, &event)
    }

    pub fn status(&self) -> String {
        let bounds = self.sync.scroll_bounds();
        let filter = if self.sync.stack().has_filter() {
            format!(" filtered {}/{}", self.sync.stack().visible_len(), self.sync.stack().len())
        } else {
            String::new()
        };
        let message = self.sync.host().message.as_deref().unwrap_or("");
        format!(
            "scroll {} [{}..{}] {:?} hw {}{} loading {} {}",
            self.sync.stack_scroll(),
            bounds.min,
            bounds.max,
            self.dispatcher.state(),
            self.sync.hw_layer_count(),
            filter,
            self.sync.data_source().pending(),
            message,
        )
    }
}

fn synthetic_task(id: u32) -> Task {
    let package = PACKAGES[id as usize % PACKAGES.len()];
    let component = if id % 3 == 0 { "settings" } else { "main" };
    Task::new(TaskId(id), ContentRef::new(package, component))
}

/// Pointer event at the centre of cell (`column`, `row`).
#[allow(clippy::cast_precision_loss)]
pub fn pointer_event(action: PointerAction, column: u16, row: u16, time: Duration) -> PointerEvent {
    let x = (i32::from(column) * CELL_WIDTH + CELL_WIDTH / 2) as f32;
    let y = (i32::from(row) * CELL_HEIGHT + CELL_HEIGHT / 2) as f32;
    PointerEvent::new(action, x, y, time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState, KeyModifiers};

    fn app(tasks: u32) -> App {
        let loader = DataLoader::spawn(Duration::ZERO);
        let mut app = App::new(StackConfig::default(), tasks, loader).unwrap_or_else(|err| panic!("app: {err}"));
        app.resize(60, 50).unwrap_or_else(|err| panic!("resize: {err}"));
        app
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn pointer_events_land_on_cell_centres() {
        let event = pointer_event(PointerAction::Down, 2, 3, Duration::ZERO);
        assert!((event.x - 20.0).abs() < f32::EPSILON);
        assert!((event.y - 56.0).abs() < f32::EPSILON);
    }

    #[test]
    fn add_key_appends_a_front_task() {
        let mut app = app(3);
        app.handle_key(key(KeyCode::Char('a'))).unwrap_or_else(|err| panic!("key: {err}"));
        assert_eq!(app.sync.stack().len(), 4);
        assert_eq!(app.sync.stack().tasks().last().map(|task| task.id), Some(TaskId(4)));
    }

    #[test]
    fn filter_key_toggles_package_filter() {
        let mut app = app(12);
        app.handle_key(key(KeyCode::Char('f'))).unwrap_or_else(|err| panic!("key: {err}"));
        app.tick().unwrap_or_else(|err| panic!("tick: {err}"));
        assert!(app.sync.stack().has_filter());
        assert_eq!(app.sync.stack().visible_len(), 2);

        app.handle_key(key(KeyCode::Char('f'))).unwrap_or_else(|err| panic!("key: {err}"));
        app.tick().unwrap_or_else(|err| panic!("tick: {err}"));
        assert!(!app.sync.stack().has_filter());
    }

    #[test]
    fn vertical_mouse_drag_scrolls() {
        let mut app = app(12);
        let start = app.sync.stack_scroll();
        for event in [
            mouse(MouseEventKind::Down(MouseButton::Left), 30, 20),
            mouse(MouseEventKind::Drag(MouseButton::Left), 30, 22),
            mouse(MouseEventKind::Drag(MouseButton::Left), 30, 25),
        ] {
            app.handle_mouse(event).unwrap_or_else(|err| panic!("mouse: {err}"));
        }
        assert!(app.sync.stack_scroll() < start);
        assert_eq!(app.dispatcher.state(), recents_stack::GestureState::Scrolling);
        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 30, 25))
            .unwrap_or_else(|err| panic!("mouse: {err}"));
    }

    #[test]
    fn quit_keys_stop_the_loop() {
        let mut app = app(2);
        app.handle_key(key(KeyCode::Char('q'))).unwrap_or_else(|err| panic!("key: {err}"));
        assert!(app.should_quit);
    }
}
