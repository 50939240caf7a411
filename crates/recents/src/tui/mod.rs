use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event as CrosstermEvent, KeyEventKind, MouseEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend, layout::Rect as Area};
use recents_stack::StackConfig;
use tracing::subscriber::NoSubscriber;

mod app;
mod loader;
mod ui;
mod view;

use self::app::App;
use self::loader::DataLoader;

const TICK_RATE: Duration = Duration::from_millis(16);
const LOAD_LATENCY: Duration = Duration::from_millis(120);

/// Launch the interactive preview.
pub fn run(config: StackConfig, tasks: u32) -> Result<()> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.hide_cursor()?;

    let result = tracing::subscriber::with_default(NoSubscriber::default(), || {
        run_event_loop(&mut terminal, config, tasks)
    });

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();

    result
}

fn run_event_loop(terminal: &mut Terminal<CrosstermBackend<Stdout>>, config: StackConfig, tasks: u32) -> Result<()> {
    let mut app = App::new(config, tasks, DataLoader::spawn(LOAD_LATENCY))?;
    let size = terminal.size()?;
    let mut cards = card_area(size.width, size.height);
    app.resize(cards.width, cards.height)?;

    let mut last_tick = Instant::now();
    loop {
        terminal.draw(|f| ui::draw(f, &app))?;
        if app.should_quit {
            break;
        }

        let timeout = TICK_RATE.checked_sub(last_tick.elapsed()).unwrap_or_default();
        if event::poll(timeout)? {
            match event::read()? {
                CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => app.handle_key(key)?,
                CrosstermEvent::Mouse(mouse) => {
                    if let Some(local) = to_card_area(mouse, cards) {
                        app.handle_mouse(local)?;
                    }
                }
                CrosstermEvent::Resize(width, height) => {
                    cards = card_area(width, height);
                    app.resize(cards.width, cards.height)?;
                }
                _ => {}
            }
        }

        if last_tick.elapsed() >= TICK_RATE {
            app.tick()?;
            last_tick = Instant::now();
        }
    }

    Ok(())
}

fn card_area(width: u16, height: u16) -> Area {
    ui::split(Area::new(0, 0, width, height)).0
}

/// Translate a mouse event into card-area coordinates, clamping drags that leave it.
fn to_card_area(mut mouse: MouseEvent, cards: Area) -> Option<MouseEvent> {
    if cards.width == 0 || cards.height == 0 {
        return None;
    }
    mouse.column = mouse.column.clamp(cards.x, cards.right() - 1) - cards.x;
    mouse.row = mouse.row.clamp(cards.y, cards.bottom() - 1) - cards.y;
    Some(mouse)
}
