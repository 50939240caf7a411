use std::borrow::Cow;
use std::time::Instant;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect as Area},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use recents_core::Task;
use recents_stack::Rect;
use unicode_segmentation::UnicodeSegmentation;

use super::app::{App, CELL_HEIGHT, CELL_WIDTH};

const HELP: &str = "drag: scroll/swipe  click: launch  f: filter  a: add  enter: launch front  q: quit";

/// Split the screen into the card area and a two-line footer.
pub fn split(area: Area) -> (Area, Area) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(2)])
        .split(area);
    (chunks[0], chunks[1])
}

pub fn draw(f: &mut Frame<'_>, app: &App) {
    let (cards, footer) = split(f.area());
    let now = Instant::now();

    for (_, card) in app.sync.attached_cards() {
        let Some(task) = card.task() else {
            continue;
        };
        let rect = card.view().rect_at(now);
        let Some(cell) = to_cells(rect, card.translation_x(), cards) else {
            continue;
        };
        f.render_widget(Clear, cell);
        f.render_widget(card_block(task, card.alpha(), card.view().has_data(), cell.width), cell);
    }

    let footer_lines = vec![
        Line::from(Span::raw(app.status())),
        Line::from(Span::styled(HELP, Style::default().fg(Color::DarkGray))),
    ];
    f.render_widget(Paragraph::new(footer_lines), footer);
}

fn card_block(task: &Task, alpha: f32, has_data: bool, width: u16) -> Block<'_> {
    let accent = task
        .thumbnail
        .as_ref()
        .and_then(|bitmap| match *bitmap.pixels {
            [r, g, b, ..] => Some(Color::Rgb(r, g, b)),
            _ => None,
        })
        .unwrap_or(Color::Gray);
    let mut style = Style::default().fg(accent);
    if alpha < 0.5 {
        style = style.add_modifier(Modifier::DIM);
    }
    if !has_data {
        style = style.add_modifier(Modifier::ITALIC);
    }

    let title = truncate_with_ellipsis(task.display_title(), usize::from(width.saturating_sub(2)));
    Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(Span::styled(title.into_owned(), style.add_modifier(Modifier::BOLD)))
}

/// Map a pixel rect shifted by `translation_x` onto terminal cells inside `area`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn to_cells(rect: Rect, translation_x: f32, area: Area) -> Option<Area> {
    if rect.is_empty() {
        return None;
    }
    let rect = rect.offset(translation_x.round() as i32, 0);
    let left = (rect.left.div_euclid(CELL_WIDTH) + i32::from(area.x)).max(i32::from(area.x));
    let top = (rect.top.div_euclid(CELL_HEIGHT) + i32::from(area.y)).max(i32::from(area.y));
    let right = (rect.right.div_euclid(CELL_WIDTH) + i32::from(area.x)).min(i32::from(area.right()));
    let bottom = (rect.bottom.div_euclid(CELL_HEIGHT) + i32::from(area.y)).min(i32::from(area.bottom()));
    if right - left < 2 || bottom - top < 2 {
        return None;
    }
    Some(Area::new(left as u16, top as u16, (right - left) as u16, (bottom - top) as u16))
}

pub fn truncate_with_ellipsis(input: &str, max_graphemes: usize) -> Cow<'_, str> {
    const ELLIPSIS: &str = "...";
    const ELLIPSIS_GRAPHEMES: usize = 3;

    if max_graphemes == 0 {
        return Cow::Owned(String::new());
    }

    let grapheme_count = UnicodeSegmentation::graphemes(input, true).count();
    if grapheme_count <= max_graphemes {
        return Cow::Borrowed(input);
    }

    if max_graphemes <= ELLIPSIS_GRAPHEMES {
        let truncated: String = UnicodeSegmentation::graphemes(input, true)
            .take(max_graphemes)
            .collect();
        return Cow::Owned(truncated);
    }

    let keep = max_graphemes - ELLIPSIS_GRAPHEMES;
    let mut truncated: String = UnicodeSegmentation::graphemes(input, true).take(keep).collect();
    truncated.push_str(ELLIPSIS);
    Cow::Owned(truncated)
}
