use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

/// Directory holding per-project configuration.
pub const CONFIG_DIR: &str = ".recents";
/// File name of the configuration inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

/// Tuning for layout, animation and touch handling, loaded from `.recents/config.toml`.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct StackConfig {
    /// Card geometry.
    #[serde(default)]
    pub layout: LayoutConfig,
    /// Animation durations.
    #[serde(default)]
    pub animation: AnimationConfig,
    /// Touch slop and fling thresholds.
    #[serde(default)]
    pub touch: TouchConfig,
}

impl StackConfig {
    /// Path of the configuration file below `dir`.
    pub fn path_in(dir: impl AsRef<Path>) -> PathBuf {
        dir.as_ref().join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Load configuration from `<dir>/.recents/config.toml`, falling back to defaults
    /// when the file does not exist.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let config_path = Self::path_in(dir);
        if !config_path.exists() {
            return Ok(Self::default());
        }
        Self::from_file(&config_path)
    }

    /// Load configuration from an explicit file path. The file must exist.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        self.layout.validate()?;
        self.touch.validate()
    }
}

/// Axis along which cards are stacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackOrientation {
    /// Cards stack top to bottom (portrait).
    #[default]
    Vertical,
    /// Cards are laid out for a landscape surface.
    Horizontal,
}

/// Card geometry, mostly expressed as ratios of the surface.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    /// Portion of a card's height covered by the next card.
    pub overlap_pct: f32,
    /// Height of the peek region as a ratio of the stack height.
    pub peek_height_pct: f32,
    /// Number of cards compressed into the peek region.
    pub peek_num_cards: u32,
    /// Scale of the deepest peeking card.
    pub min_scale: f32,
    /// Padding around the stack as a ratio of the smaller surface dimension.
    pub padding_pct: f32,
    /// Stacking axis.
    pub orientation: StackOrientation,
    /// Pixels reserved at the bottom of the surface (system bars).
    pub bottom_inset: i32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            overlap_pct: 0.65,
            peek_height_pct: 0.1,
            peek_num_cards: 3,
            min_scale: 0.6,
            padding_pct: 0.15,
            orientation: StackOrientation::Vertical,
            bottom_inset: 0,
        }
    }
}

impl LayoutConfig {
    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("overlap_pct", self.overlap_pct),
            ("peek_height_pct", self.peek_height_pct),
            ("min_scale", self.min_scale),
            ("padding_pct", self.padding_pct),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                bail!("layout.{name} must be in (0, 1], got {value}");
            }
        }
        if self.peek_num_cards == 0 {
            bail!("layout.peek_num_cards must be at least 1");
        }
        if self.bottom_inset < 0 {
            bail!("layout.bottom_inset must not be negative");
        }
        Ok(())
    }
}

/// Animation durations in milliseconds.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AnimationConfig {
    /// Reshuffle of remaining cards after a task is removed.
    pub task_removed_reshuffle_ms: u64,
    /// Snap of an out-of-bounds scroll back to the nearest bound.
    pub snap_scroll_back_ms: u64,
    /// Upper bound for a card flying off-screen after a dismiss fling.
    pub swipe_dismiss_ms: u64,
    /// Return of a swiped card to its resting position.
    pub swipe_snap_back_ms: u64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            task_removed_reshuffle_ms: 200,
            snap_scroll_back_ms: 650,
            swipe_dismiss_ms: 350,
            swipe_snap_back_ms: 350,
        }
    }
}

impl AnimationConfig {
    /// Reshuffle duration.
    pub const fn task_removed_reshuffle(&self) -> Duration {
        Duration::from_millis(self.task_removed_reshuffle_ms)
    }

    /// Scroll snap-back duration.
    pub const fn snap_scroll_back(&self) -> Duration {
        Duration::from_millis(self.snap_scroll_back_ms)
    }

    /// Maximum dismiss duration.
    pub const fn swipe_dismiss(&self) -> Duration {
        Duration::from_millis(self.swipe_dismiss_ms)
    }

    /// Card snap-back duration.
    pub const fn swipe_snap_back(&self) -> Duration {
        Duration::from_millis(self.swipe_snap_back_ms)
    }
}

/// Whether velocity samples gathered before a scroll is classified survive the
/// classification. Swipes always start a fresh sample window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VelocityReset {
    /// Keep the samples collected since pointer-down.
    Keep,
    /// Start a fresh sample window at the classifying sample.
    Reset,
}

/// Touch thresholds.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TouchConfig {
    /// Base touch slop in pixels.
    pub touch_slop: f32,
    /// Minimum release speed (px/s) that counts as a fling.
    pub min_fling_velocity: f32,
    /// Release speeds are clamped to this value (px/s).
    pub max_fling_velocity: f32,
    /// Exponential decay rate of a scroll fling, per second.
    pub fling_friction: f32,
    /// Span of recent samples used for velocity estimation.
    pub velocity_window_ms: u64,
    /// Velocity handling when the interception path classifies a scroll.
    pub intercept_velocity: VelocityReset,
    /// Velocity handling when the direct handling path classifies a scroll.
    pub touch_velocity: VelocityReset,
}

impl Default for TouchConfig {
    fn default() -> Self {
        Self {
            touch_slop: 16.0,
            min_fling_velocity: 315.0,
            max_fling_velocity: 8000.0,
            fling_friction: 2.5,
            velocity_window_ms: 100,
            intercept_velocity: VelocityReset::Keep,
            touch_velocity: VelocityReset::Reset,
        }
    }
}

impl TouchConfig {
    /// Vertical distance that commits a scroll.
    pub const fn scroll_slop(&self) -> f32 {
        self.touch_slop
    }

    /// Horizontal distance that commits a swipe.
    pub fn swipe_slop(&self) -> f32 {
        self.touch_slop * 2.0
    }

    /// Accumulated vertical motion past which a swipe can no longer start.
    pub fn reject_swipe_motion(&self) -> f32 {
        self.touch_slop * 4.0
    }

    /// Sample window as a [`Duration`].
    pub const fn velocity_window(&self) -> Duration {
        Duration::from_millis(self.velocity_window_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.touch_slop <= 0.0 {
            bail!("touch.touch_slop must be positive");
        }
        if self.min_fling_velocity < 0.0 || self.min_fling_velocity >= self.max_fling_velocity {
            bail!(
                "touch.min_fling_velocity ({}) must be below touch.max_fling_velocity ({})",
                self.min_fling_velocity,
                self.max_fling_velocity
            );
        }
        if self.fling_friction <= 0.0 {
            bail!("touch.fling_friction must be positive");
        }
        if self.velocity_window_ms == 0 {
            bail!("touch.velocity_window_ms must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_config(dir: &Path, contents: &str) -> Result<()> {
        let cfg_dir = dir.join(CONFIG_DIR);
        fs::create_dir_all(&cfg_dir)?;
        let mut file = fs::File::create(cfg_dir.join(CONFIG_FILE))?;
        writeln!(file, "{contents}")?;
        Ok(())
    }

    #[test]
    fn missing_config_returns_defaults() -> Result<()> {
        let dir = tempdir()?;
        let cfg = StackConfig::from_dir(dir.path())?;
        assert_eq!(cfg, StackConfig::default());
        assert_eq!(cfg.layout.peek_num_cards, 3);
        assert!((cfg.touch.swipe_slop() - 32.0).abs() < f32::EPSILON);
        assert!((cfg.touch.reject_swipe_motion() - 64.0).abs() < f32::EPSILON);
        assert_eq!(cfg.animation.swipe_dismiss(), Duration::from_millis(350));
        Ok(())
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() -> Result<()> {
        let dir = tempdir()?;
        write_config(
            dir.path(),
            "[layout]\noverlap_pct = 0.5\norientation = \"horizontal\"\n\n[touch]\ntouch_slop = 8.0\ntouch_velocity = \"keep\"",
        )?;

        let cfg = StackConfig::from_dir(dir.path())?;
        assert!((cfg.layout.overlap_pct - 0.5).abs() < f32::EPSILON);
        assert_eq!(cfg.layout.orientation, StackOrientation::Horizontal);
        assert!((cfg.layout.min_scale - 0.6).abs() < f32::EPSILON);
        assert!((cfg.touch.scroll_slop() - 8.0).abs() < f32::EPSILON);
        assert_eq!(cfg.touch.touch_velocity, VelocityReset::Keep);
        assert_eq!(cfg.animation, AnimationConfig::default());
        Ok(())
    }

    #[test]
    fn out_of_range_ratio_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        write_config(dir.path(), "[layout]\nmin_scale = 1.5")?;

        let Err(err) = StackConfig::from_dir(dir.path()) else {
            panic!("min_scale above 1 should error");
        };
        assert!(format!("{err:#}").contains("layout.min_scale must be in (0, 1]"));
        Ok(())
    }

    #[test]
    fn fling_thresholds_must_be_ordered() {
        let Err(err) = StackConfig::from_toml_str(
            "[touch]\nmin_fling_velocity = 9000.0\nmax_fling_velocity = 8000.0",
        ) else {
            panic!("inverted fling thresholds should error");
        };
        assert!(err.to_string().contains("must be below touch.max_fling_velocity"));
    }

    #[test]
    fn zero_peek_cards_is_rejected() {
        let Err(err) = StackConfig::from_toml_str("[layout]\npeek_num_cards = 0") else {
            panic!("zero peek cards should error");
        };
        assert!(err.to_string().contains("peek_num_cards"));
    }

    #[test]
    fn explicit_file_must_exist() -> Result<()> {
        let dir = tempdir()?;
        let missing = dir.path().join("nope.toml");
        let Err(err) = StackConfig::from_file(&missing) else {
            panic!("missing explicit config should error");
        };
        assert!(err.to_string().contains("failed to read"));
        Ok(())
    }
}
