//! Headless subcommands.

use anyhow::{Context, Result};
use recents_core::TaskId;
use recents_stack::{ScrollBounds, StackConfig, StackGeometry, TaskTransform, TransformCalculator};
use serde::Serialize;

use crate::Command;

mod replay;

use replay::replay_file;

pub fn run(command: Command, config: StackConfig) -> Result<()> {
    match command {
        Command::Layout {
            width,
            height,
            tasks,
            scroll,
            json,
        } => {
            let report = layout(&config, width, height, tasks, scroll);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report.render());
            }
            Ok(())
        }
        Command::Replay { path, json } => {
            let report = replay_file(&path, config)
                .with_context(|| format!("failed to replay {}", path.display()))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report.render());
            }
            Ok(())
        }
        Command::Preview { .. } => unreachable!("Unhandled command routed to headless runner"),
    }
}

#[derive(Debug, Serialize)]
pub struct LayoutReport {
    width: i32,
    height: i32,
    scroll: i32,
    min_scroll: i32,
    max_scroll: i32,
    cards: Vec<CardLayout>,
}

#[derive(Debug, Serialize)]
struct CardLayout {
    index: usize,
    task: TaskId,
    t: f32,
    scale: f32,
    translation_y: i32,
    rect: [i32; 4],
    visible: bool,
}

impl CardLayout {
    fn new(index: usize, task: TaskId, transform: &TaskTransform) -> Self {
        let rect = transform.rect;
        Self {
            index,
            task,
            t: transform.t,
            scale: transform.scale,
            translation_y: transform.translation_y,
            rect: [rect.left, rect.top, rect.right, rect.bottom],
            visible: transform.visible,
        }
    }
}

/// Transforms for a stack of `tasks` synthetic cards.
pub fn layout(config: &StackConfig, width: i32, height: i32, tasks: u32, scroll: Option<i32>) -> LayoutReport {
    let geometry = StackGeometry::compute(width, height, &config.layout);
    let calculator = TransformCalculator::new(&config.layout);
    let bounds = ScrollBounds::compute(tasks as usize, &geometry, &config.layout);
    let scroll = scroll.unwrap_or(bounds.max);

    let cards = (1..=tasks)
        .enumerate()
        .map(|(index, id)| CardLayout::new(index, TaskId(id), &calculator.compute(index, scroll, &geometry)))
        .collect();

    LayoutReport {
        width,
        height,
        scroll,
        min_scroll: bounds.min,
        max_scroll: bounds.max,
        cards,
    }
}

impl LayoutReport {
    fn render(&self) -> String {
        use std::fmt::Write as _;

        let mut out = format!(
            "{}x{} scroll {} (bounds {}..={})\n",
            self.width, self.height, self.scroll, self.min_scroll, self.max_scroll
        );
        let _ = writeln!(out, "{:>5} {:>5} {:>7} {:>6} {:>6}  rect", "index", "task", "t", "scale", "ty");
        for card in &self.cards {
            let [left, top, right, bottom] = card.rect;
            let _ = writeln!(
                out,
                "{:>5} {:>5} {:>7.2} {:>6.3} {:>6}  ({left}, {top}, {right}, {bottom}){}",
                card.index,
                card.task.to_string(),
                card.t,
                card.scale,
                card.translation_y,
                if card.visible { "" } else { "  hidden" },
            );
        }
        out
    }
}
