//! Configuration discovery for the CLI.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use recents_stack::StackConfig;
use tracing::debug;

/// User-level configuration file, e.g. `~/.config/recents/config.toml`.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("recents").join("config.toml"))
}

/// Load the stack configuration.
///
/// An explicit path must exist. Otherwise `./.recents/config.toml` wins over
/// the user config file, and defaults apply when neither exists.
pub fn resolve(explicit: Option<&Path>) -> Result<StackConfig> {
    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    resolve_from(explicit, &cwd, user_config_path().as_deref())
}

fn resolve_from(explicit: Option<&Path>, cwd: &Path, user: Option<&Path>) -> Result<StackConfig> {
    if let Some(path) = explicit {
        debug!(path = %path.display(), "loading explicit config");
        return StackConfig::from_file(path);
    }

    let project = StackConfig::path_in(cwd);
    if project.exists() {
        debug!(path = %project.display(), "loading project config");
        return StackConfig::from_file(&project);
    }

    match user {
        Some(path) if path.exists() => {
            debug!(path = %path.display(), "loading user config");
            StackConfig::from_file(path)
        }
        _ => Ok(StackConfig::default()),
    }
}
