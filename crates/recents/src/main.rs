//! CLI entry point for the recents card stack.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod commands;
mod config;
mod touch;
mod tui;

/// Card-stack recents switcher driven from the terminal.
#[derive(Parser, Debug)]
#[command(
    name = "recents",
    version,
    about = "recents: stacked task cards with scrolling, flings and swipe-to-dismiss"
)]
struct Cli {
    /// Configuration file (defaults to .recents/config.toml, then the user config dir).
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print card transforms for a synthetic stack.
    Layout {
        #[arg(long, default_value_t = 1080)]
        width: i32,
        #[arg(long, default_value_t = 1920)]
        height: i32,
        #[arg(short = 'n', long, default_value_t = 8)]
        tasks: u32,
        /// Stack scroll to lay out at (defaults to the front of the stack).
        #[arg(long, allow_negative_numbers = true)]
        scroll: Option<i32>,
        #[arg(long)]
        json: bool,
    },

    /// Replay a JSON pointer trace headlessly and print the resulting calls.
    Replay {
        /// Trace file.
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },

    /// Interactive terminal preview; drag with the mouse to scroll and swipe.
    Preview {
        #[arg(short = 'n', long, default_value_t = 12)]
        tasks: u32,
    },
}

fn main() -> Result<()> {
    let Cli { config, cmd } = Cli::parse();

    if should_install_tracing(&cmd) {
        install_tracing();
    }

    let stack_config = config::resolve(config.as_deref())?;
    match cmd {
        Command::Preview { tasks } => tui::run(stack_config, tasks),
        other => commands::run(other, stack_config),
    }
}

const fn should_install_tracing(cmd: &Command) -> bool {
    !matches!(cmd, Command::Preview { .. })
}

fn install_tracing() {
    // RUST_LOG overrides the INFO default.
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .compact()
        .try_init();
}
