//! Configuration system: TOML file + env var overrides + defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bridge::model::BridgeSettings;
use crate::core::errors::{AtlError, Result};
use crate::logger::jsonl::JsonlConfig;
use crate::timeline::layout::LayoutSettings;
use crate::timeline::render::Theme;
use crate::timeline::scale::{Coord, ZoomTier};

/// Upper bound on the hover delay; longer values make hover feel broken.
const MAX_HOVER_DEBOUNCE_MS: u64 = 10_000;

/// Full timeline configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub layout: LayoutConfig,
    pub input: InputConfig,
    pub theme: Theme,
    pub terminal: TerminalConfig,
    pub logging: LoggingConfig,
    pub paths: PathsConfig,
}

/// Vertical placement and the named layout constants, in whole pixels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LayoutConfig {
    pub baseline_y_px: u32,
    pub node_height_offset_px: u32,
    pub label_offset_px: u32,
    pub cull_buffer_px: u32,
    pub label_dash_px: u32,
}

/// Keyboard and pointer behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    pub hover_debounce_ms: u64,
    pub scroll_fraction: f64,
    pub keep_center_on_zoom: bool,
}

/// Terminal host geometry and pacing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TerminalConfig {
    /// Pixel width of one terminal cell. Row height follows the zoom tier.
    pub cell_width_px: u32,
    /// Upper bound on one input wait.
    pub frame_poll_ms: u64,
}

/// Activity log behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub max_size_bytes: u64,
    pub max_rotated_files: u32,
    pub fsync_interval_secs: u64,
}

/// Filesystem paths used by atl.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    pub activity_log: PathBuf,
    pub fallback_activity_log: PathBuf,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            baseline_y_px: 120,
            node_height_offset_px: 40,
            label_offset_px: 16,
            cull_buffer_px: 200,
            label_dash_px: 30,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            hover_debounce_ms: 100,
            scroll_fraction: 0.5,
            keep_center_on_zoom: false,
        }
    }
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            cell_width_px: 8,
            frame_poll_ms: 250,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_size_bytes: 10 * 1024 * 1024, // 10 MiB
            max_rotated_files: 3,
            fsync_interval_secs: 10,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home_dir = env::var_os("HOME").map_or_else(
            || {
                eprintln!(
                    "[ATL-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths"
                );
                PathBuf::from("/tmp")
            },
            PathBuf::from,
        );
        let cfg = home_dir.join(".config").join("atl").join("config.toml");
        let data = home_dir.join(".local").join("share").join("atl");
        Self {
            config_file: cfg,
            activity_log: data.join("activity.jsonl"),
            fallback_activity_log: env::temp_dir().join("atl-activity.jsonl"),
        }
    }
}

impl LayoutConfig {
    #[must_use]
    pub fn to_settings(&self) -> LayoutSettings {
        LayoutSettings {
            baseline_y: Coord::from_px(i64::from(self.baseline_y_px)),
            node_height_offset: Coord::from_px(i64::from(self.node_height_offset_px)),
            label_offset: Coord::from_px(i64::from(self.label_offset_px)),
            cull_buffer: Coord::from_px(i64::from(self.cull_buffer_px)),
            label_dash: Coord::from_px(i64::from(self.label_dash_px)),
        }
    }
}

impl InputConfig {
    #[must_use]
    pub fn to_bridge_settings(&self) -> BridgeSettings {
        BridgeSettings {
            scroll_fraction: self.scroll_fraction,
            hover_debounce: Duration::from_millis(self.hover_debounce_ms),
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| AtlError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(AtlError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(env_var)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for logging.
    ///
    /// FNV-1a over the canonical JSON form, stable across processes.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    /// Writer settings for the activity log.
    #[must_use]
    pub fn jsonl_config(&self) -> JsonlConfig {
        JsonlConfig {
            path: self.paths.activity_log.clone(),
            fallback_path: Some(self.paths.fallback_activity_log.clone()),
            max_size_bytes: self.logging.max_size_bytes,
            max_rotated_files: self.logging.max_rotated_files,
            fsync_interval_secs: self.logging.fsync_interval_secs,
        }
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        // layout
        set_from(&mut lookup, "ATL_LAYOUT_BASELINE_Y_PX", &mut self.layout.baseline_y_px)?;
        set_from(
            &mut lookup,
            "ATL_LAYOUT_NODE_HEIGHT_OFFSET_PX",
            &mut self.layout.node_height_offset_px,
        )?;
        set_from(&mut lookup, "ATL_LAYOUT_LABEL_OFFSET_PX", &mut self.layout.label_offset_px)?;
        set_from(&mut lookup, "ATL_LAYOUT_CULL_BUFFER_PX", &mut self.layout.cull_buffer_px)?;
        set_from(&mut lookup, "ATL_LAYOUT_LABEL_DASH_PX", &mut self.layout.label_dash_px)?;

        // input
        set_from(&mut lookup, "ATL_INPUT_HOVER_DEBOUNCE_MS", &mut self.input.hover_debounce_ms)?;
        set_from(&mut lookup, "ATL_INPUT_SCROLL_FRACTION", &mut self.input.scroll_fraction)?;
        set_from(
            &mut lookup,
            "ATL_INPUT_KEEP_CENTER_ON_ZOOM",
            &mut self.input.keep_center_on_zoom,
        )?;

        // theme
        set_from(&mut lookup, "ATL_THEME_DEFAULT_COLOR", &mut self.theme.default_color)?;
        set_from(&mut lookup, "ATL_THEME_HIGHLIGHT_COLOR", &mut self.theme.highlight_color)?;
        set_from(&mut lookup, "ATL_THEME_DETAIL_COLOR", &mut self.theme.detail_color)?;
        set_from(&mut lookup, "ATL_THEME_BACKGROUND_COLOR", &mut self.theme.background_color)?;
        if let Some(raw) = lookup("ATL_THEME_FONT_FAMILY") {
            self.theme.font_family = raw;
        }

        // terminal
        set_from(&mut lookup, "ATL_TERMINAL_CELL_WIDTH_PX", &mut self.terminal.cell_width_px)?;
        set_from(&mut lookup, "ATL_TERMINAL_FRAME_POLL_MS", &mut self.terminal.frame_poll_ms)?;

        // logging
        set_from(&mut lookup, "ATL_LOGGING_ENABLED", &mut self.logging.enabled)?;
        set_from(&mut lookup, "ATL_LOGGING_MAX_SIZE_BYTES", &mut self.logging.max_size_bytes)?;
        set_from(
            &mut lookup,
            "ATL_LOGGING_MAX_ROTATED_FILES",
            &mut self.logging.max_rotated_files,
        )?;
        set_from(
            &mut lookup,
            "ATL_LOGGING_FSYNC_INTERVAL_SECS",
            &mut self.logging.fsync_interval_secs,
        )?;

        // paths
        if let Some(raw) = lookup("ATL_PATHS_ACTIVITY_LOG") {
            self.paths.activity_log = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("ATL_PATHS_FALLBACK_ACTIVITY_LOG") {
            self.paths.fallback_activity_log = PathBuf::from(raw);
        }

        Ok(())
    }

    /// Reject values the timeline cannot render sensibly.
    pub fn validate(&self) -> Result<()> {
        let layout = &self.layout;
        let tallest_box = 3 * ZoomTier::Month.font_size_px();
        if layout.baseline_y_px < layout.node_height_offset_px + tallest_box {
            return Err(AtlError::InvalidConfig {
                details: format!(
                    "layout.baseline_y_px ({}) must be >= node_height_offset_px + {tallest_box} \
                     so month-tier boxes stay on the surface",
                    layout.baseline_y_px
                ),
            });
        }
        if layout.label_dash_px == 0 {
            return Err(AtlError::InvalidConfig {
                details: "layout.label_dash_px must be > 0".to_string(),
            });
        }

        let input = &self.input;
        if !(input.scroll_fraction > 0.0 && input.scroll_fraction <= 1.0) {
            return Err(AtlError::InvalidConfig {
                details: format!(
                    "input.scroll_fraction must be in (0,1], got {}",
                    input.scroll_fraction
                ),
            });
        }
        if input.hover_debounce_ms > MAX_HOVER_DEBOUNCE_MS {
            return Err(AtlError::InvalidConfig {
                details: format!(
                    "input.hover_debounce_ms must be <= {MAX_HOVER_DEBOUNCE_MS}, got {}",
                    input.hover_debounce_ms
                ),
            });
        }

        if self.theme.font_family.trim().is_empty() {
            return Err(AtlError::InvalidConfig {
                details: "theme.font_family must not be empty".to_string(),
            });
        }

        if self.terminal.cell_width_px == 0 || self.terminal.frame_poll_ms == 0 {
            return Err(AtlError::InvalidConfig {
                details: "terminal.cell_width_px and terminal.frame_poll_ms must be > 0"
                    .to_string(),
            });
        }

        if self.logging.enabled && self.logging.max_size_bytes == 0 {
            return Err(AtlError::InvalidConfig {
                details: "logging.max_size_bytes must be > 0 when logging is enabled".to_string(),
            });
        }

        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn set_from<F, T>(lookup: &mut F, name: &str, slot: &mut T) -> Result<()>
where
    F: FnMut(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(raw) = lookup(name) {
        *slot = parse_env(name, &raw)?;
    }
    Ok(())
}

fn parse_env<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|error| AtlError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}
