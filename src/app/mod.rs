//! Application glue module
//!
//! Configuration and CLI arguments for the headless harness.

mod config;

pub use config::{CanvasConfig, CliArgs, ConfigError, EngineConfig, HarnessConfig, UiConfig};
