//! Configuration system for spotwm
//!
//! Loads configuration from TOML file at `~/.config/spotwm/config.toml`
//! Auto-generates default config file on first run if missing.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::wm::screen::SpotAlign;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub layout: LayoutConfig,
    pub border: BorderConfig,
    pub placement: PlacementConfig,
    pub bindings: Vec<BindingConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            border: BorderConfig::default(),
            placement: PlacementConfig::default(),
            bindings: default_bindings(),
        }
    }
}

impl Config {
    /// Load configuration from file, or use defaults if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            info!("Config file not found at {:?}, using defaults", config_path);
            // Auto-generate default config file
            if let Err(e) = Self::save_default(&config_path) {
                warn!("Failed to create default config file: {}", e);
            }
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;

        info!("Configuration loaded from {:?}", path);
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Get the path to the config file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("spotwm");

        Ok(config_dir.join("config.toml"))
    }

    /// Save default configuration to file
    pub fn save_default(path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let default_config = Self::default();
        let toml_string = toml::to_string_pretty(&default_config)
            .context("Failed to serialize default config")?;

        fs::write(path, toml_string).context("Failed to write default config file")?;

        info!("Created default config file at {:?}", path);
        Ok(())
    }
}

/// Spot layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Edge SPOT1 sits on: "left" or "right"
    pub spot1_align: SpotAlign,
    /// Width of SPOT1 as a percentage of the monitor (clamped to 10..=90)
    pub spot1_width_pct: u32,
    /// Height of SPOT2 as a percentage of the monitor (clamped to 10..=90)
    pub spot2_height_pct: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            spot1_align: SpotAlign::Left,
            spot1_width_pct: 67,
            spot2_height_pct: 67,
        }
    }
}

/// Border width and colors (hex: 0xRRGGBB)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BorderConfig {
    pub width: u32,
    pub blur: u32,
    pub focus: u32,
    pub urgent: u32,
    pub above: u32,
}

impl Default for BorderConfig {
    fn default() -> Self {
        Self {
            width: 2,
            blur: 0xa9a9a9,   // Dark Gray
            focus: 0x4169e1,  // Royal Blue
            urgent: 0xff0000, // Red
            above: 0x006400,  // Dark Green
        }
    }
}

/// Where newly mapped windows go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpotStart {
    /// Smallest spot the window fits in
    #[default]
    Smart,
    /// Spot of the current window
    Current,
    Spot1,
    Spot2,
    Spot3,
}

/// Whether newly mapped windows take focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusStart {
    Steal,
    /// Only when opened in the current spot, or nothing is focused
    #[default]
    Ignore,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub spot_start: SpotStart,
    /// 0-based monitor index; unset follows the current window
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monitor_start: Option<usize>,
    pub focus_start: FocusStart,
}

/// One key binding as written in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingConfig {
    /// shift, lock, control, mod1..mod5, or any
    #[serde(default)]
    pub modifiers: Vec<String>,
    /// Key name, e.g. "Left", "Return", "x", "F1"
    pub key: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

fn bind(modifiers: &[&str], key: &str, action: &str, num: Option<i32>, data: Option<&str>) -> BindingConfig {
    BindingConfig {
        modifiers: modifiers.iter().map(|m| m.to_string()).collect(),
        key: key.to_string(),
        action: action.to_string(),
        num,
        data: data.map(str::to_string),
    }
}

/// Stock bindings. AnyModifier bindings go last so they never shadow others.
pub fn default_bindings() -> Vec<BindingConfig> {
    const SUPER: &[&str] = &["mod4"];
    const SHIFT_SUPER: &[&str] = &["shift", "mod4"];
    const ANY: &[&str] = &["any"];

    let mut bindings = Vec::new();
    for dir in ["Left", "Up", "Right", "Down"] {
        let name = dir.to_ascii_lowercase();
        bindings.push(bind(SUPER, dir, "focus_direction", None, Some(&name)));
        bindings.push(bind(SHIFT_SUPER, dir, "move_direction", None, Some(&name)));
    }
    bindings.extend([
        bind(SUPER, "Tab", "other", None, None),
        bind(SUPER, "grave", "cycle", None, None),
        bind(SUPER, "Escape", "close", None, None),
        bind(SUPER, "f", "fullscreen_toggle", None, None),
        bind(SUPER, "a", "above_toggle", None, None),
        bind(SUPER, "Next", "focus_monitor", Some(1), None),
        bind(SUPER, "Prior", "focus_monitor", Some(-1), None),
        bind(SHIFT_SUPER, "Next", "move_monitor", Some(1), None),
        bind(SHIFT_SUPER, "Prior", "move_monitor", Some(-1), None),
        bind(SUPER, "x", "command", None, Some("dmenu_run")),
        bind(SUPER, "s", "snapshot", None, None),
        bind(SUPER, "r", "rollback", None, None),
        bind(SUPER, "Return", "find_or_start", None, Some("xterm")),
        bind(SUPER, "w", "find_or_start", None, Some("firefox")),
        bind(&["shift", "control", "mod4"], "q", "command", None, Some("spotwm exit")),
        bind(&["control", "mod4"], "r", "command", None, Some("spotwm restart")),
        bind(ANY, "XF86AudioLowerVolume", "command", None, Some("amixer -q sset Master 3dB-")),
        bind(ANY, "XF86AudioRaiseVolume", "command", None, Some("amixer -q sset Master 3dB+")),
        bind(ANY, "XF86AudioMute", "command", None, Some("amixer -q sset Master toggle")),
    ]);
    bindings
}
