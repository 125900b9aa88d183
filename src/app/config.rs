//! Configuration for the headless harness
//!
//! Precedence, lowest to highest: built-in defaults, the JSON config file,
//! `FXHOST_*` environment variables, then command-line arguments.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::canvas::{CanvasContent, CellSize};
use crate::demo::{self, DemoSetup};
use crate::engine::EngineOptions;

/// Command line arguments for `fxhost-headless`
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "fxhost-headless")]
#[command(version)]
#[command(about = "Drive the two-canvas effect demo without a browser", long_about = None)]
pub struct CliArgs {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// ANSI file shown on the first canvas
    #[arg(long, value_name = "FILE")]
    pub canvas1: Option<PathBuf>,

    /// ANSI file shown on the second canvas
    #[arg(long, value_name = "FILE")]
    pub canvas2: Option<PathBuf>,

    /// Engine tick interval in milliseconds
    #[arg(long, value_name = "MS")]
    pub tick_ms: Option<u64>,

    /// Ticks to run after each trigger
    #[arg(long, value_name = "N", default_value_t = 30)]
    pub ticks: u32,

    /// Print final frames as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Trigger ids to activate, in order
    #[arg(value_name = "TRIGGER")]
    pub triggers: Vec<String>,
}

/// Harness configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HarnessConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub canvases: CanvasConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

/// Headless engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Tick interval in milliseconds
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Glyph cell width in pixels
    #[serde(default = "default_cell_width")]
    pub cell_width: u16,
    /// Glyph cell height in pixels
    #[serde(default = "default_cell_height")]
    pub cell_height: u16,
}

fn default_tick_ms() -> u64 {
    33
}
fn default_cell_width() -> u16 {
    CellSize::default().width
}
fn default_cell_height() -> u16 {
    CellSize::default().height
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            cell_width: default_cell_width(),
            cell_height: default_cell_height(),
        }
    }
}

/// Canvas files; unset paths fall back to the bundled canvases
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CanvasConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canvas1: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canvas2: Option<PathBuf>,
}

/// Surface layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Trigger ids present on the surface
    #[serde(default = "default_triggers")]
    pub triggers: Vec<String>,
    /// Trigger left enabled after destroy-all
    #[serde(default = "default_rearm_trigger")]
    pub rearm_trigger: String,
}

fn default_triggers() -> Vec<String> {
    demo::TRIGGERS.iter().map(|t| t.to_string()).collect()
}
fn default_rearm_trigger() -> String {
    demo::BTN_DESTROY_ALL.to_string()
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            triggers: default_triggers(),
            rearm_trigger: default_rearm_trigger(),
        }
    }
}

impl HarnessConfig {
    /// Load configuration with full precedence.
    ///
    /// A broken file at the default location is skipped with a warning; a
    /// broken file named with `--config` is an error.
    pub fn load_with_args(args: &CliArgs) -> Result<Self, ConfigError> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::load_or_default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.apply_cli_args(args);
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: HarnessConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from `~/.config/fxhost/config.json`, or fall back to defaults
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config");
                Self::default()
            }
        }
    }

    pub fn default_config_path() -> Option<PathBuf> {
        std::env::var("HOME").ok().map(|home| {
            PathBuf::from(home)
                .join(".config")
                .join("fxhost")
                .join("config.json")
        })
    }

    /// Apply `FXHOST_*` overrides read through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("FXHOST_TICK_MS") {
            match val.parse() {
                Ok(ms) => self.engine.tick_ms = ms,
                Err(_) => tracing::warn!(value = %val, "FXHOST_TICK_MS is not a number"),
            }
        }
        if let Some(val) = lookup("FXHOST_CANVAS1") {
            self.canvases.canvas1 = Some(PathBuf::from(val));
        }
        if let Some(val) = lookup("FXHOST_CANVAS2") {
            self.canvases.canvas2 = Some(PathBuf::from(val));
        }
    }

    fn apply_cli_args(&mut self, args: &CliArgs) {
        if let Some(ms) = args.tick_ms {
            self.engine.tick_ms = ms;
        }
        if let Some(path) = &args.canvas1 {
            self.canvases.canvas1 = Some(path.clone());
        }
        if let Some(path) = &args.canvas2 {
            self.canvases.canvas2 = Some(path.clone());
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.tick_ms == 0 || self.engine.tick_ms > 1000 {
            return Err(ConfigError::invalid(
                "engine.tick_ms",
                "tick interval must be between 1 and 1000 ms",
            ));
        }
        if self.engine.cell_width <= 2 {
            return Err(ConfigError::invalid("engine.cell_width", "must be at least 3 pixels"));
        }
        if self.engine.cell_height <= 2 {
            return Err(ConfigError::invalid("engine.cell_height", "must be at least 3 pixels"));
        }

        for (i, trigger) in self.ui.triggers.iter().enumerate() {
            if trigger.trim().is_empty() {
                return Err(ConfigError::invalid(
                    format!("ui.triggers[{}]", i),
                    "trigger id must not be empty",
                ));
            }
        }
        if !self.ui.triggers.contains(&self.ui.rearm_trigger) {
            return Err(ConfigError::invalid(
                "ui.rearm_trigger",
                format!("'{}' is not one of ui.triggers", self.ui.rearm_trigger),
            ));
        }

        Ok(())
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            tick: Duration::from_millis(self.engine.tick_ms),
            cell_size: CellSize::new(self.engine.cell_width, self.engine.cell_height),
        }
    }

    /// Read both canvas files (or take the bundled ones) for the demo
    pub fn demo_setup(&self) -> Result<DemoSetup, ConfigError> {
        let defaults = DemoSetup::default();
        Ok(DemoSetup {
            canvas1: read_canvas(self.canvases.canvas1.as_deref(), defaults.canvas1)?,
            canvas2: read_canvas(self.canvases.canvas2.as_deref(), defaults.canvas2)?,
            rearm_trigger: self.ui.rearm_trigger.clone(),
        })
    }
}

fn read_canvas(path: Option<&Path>, bundled: CanvasContent) -> Result<CanvasContent, ConfigError> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            tracing::debug!(path = %path.display(), bytes = text.len(), "canvas loaded");
            Ok(CanvasContent::new(text))
        }
        None => Ok(bundled),
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config error in '{field}': {message}")]
    Invalid { field: String, message: String },
}

impl ConfigError {
    fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_default() {
        let config = HarnessConfig::default();
        assert_eq!(config.engine.tick_ms, 33);
        assert_eq!(config.ui.triggers.len(), 12);
        assert_eq!(config.ui.rearm_trigger, "btn-destroy-all");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: HarnessConfig = serde_json::from_str(r#"{"engine": {"tick_ms": 16}}"#).unwrap();
        assert_eq!(config.engine.tick_ms, 16);
        assert_eq!(config.engine.cell_width, 10);
        assert_eq!(config.ui, UiConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = HarnessConfig::default();
        config.engine.tick_ms = 50;
        config.canvases.canvas1 = Some(PathBuf::from("/tmp/one.ansi"));
        config.save(&path).unwrap();

        let loaded = HarnessConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_reports_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(HarnessConfig::load(&path), Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> =
            HashMap::from([("FXHOST_TICK_MS", "20"), ("FXHOST_CANVAS2", "/srv/two.ansi")]);
        let mut config = HarnessConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.engine.tick_ms, 20);
        assert_eq!(config.canvases.canvas1, None);
        assert_eq!(config.canvases.canvas2, Some(PathBuf::from("/srv/two.ansi")));
    }

    #[test]
    fn test_bad_env_value_is_ignored() {
        let mut config = HarnessConfig::default();
        config.apply_env(|key| (key == "FXHOST_TICK_MS").then(|| "fast".to_string()));
        assert_eq!(config.engine.tick_ms, 33);
    }

    #[test]
    fn test_cli_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"engine": {"tick_ms": 16}}"#).unwrap();

        let args = CliArgs {
            config: Some(path),
            tick_ms: Some(40),
            ..Default::default()
        };
        let config = HarnessConfig::load_with_args(&args).unwrap();
        assert_eq!(config.engine.tick_ms, 40);
    }

    #[test]
    fn test_validation() {
        let mut config = HarnessConfig::default();
        config.engine.tick_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { ref field, .. }) if field == "engine.tick_ms"
        ));

        let mut config = HarnessConfig::default();
        config.ui.rearm_trigger = "btn-missing".to_string();
        assert!(config.validate().is_err());

        let mut config = HarnessConfig::default();
        config.engine.cell_height = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_demo_setup_reads_canvas_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.ansi");
        std::fs::write(&path, "\x1b[32mgreen\x1b[0m").unwrap();

        let mut config = HarnessConfig::default();
        config.canvases.canvas1 = Some(path);
        let setup = config.demo_setup().unwrap();
        assert_eq!(setup.canvas1.as_str(), "\x1b[32mgreen\x1b[0m");
        assert_eq!(setup.canvas2.as_str(), demo::KEY_PRESS_CANVAS);

        config.canvases.canvas2 = Some(dir.path().join("missing.ansi"));
        assert!(matches!(config.demo_setup(), Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_cli_args_parse() {
        let args = CliArgs::parse_from([
            "fxhost-headless",
            "--ticks",
            "5",
            "--json",
            "btn-canvas1-stop",
            "btn-stop-all",
        ]);
        assert_eq!(args.ticks, 5);
        assert!(args.json);
        assert_eq!(args.triggers, vec!["btn-canvas1-stop", "btn-stop-all"]);
    }
}
