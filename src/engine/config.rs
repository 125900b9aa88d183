//! Renderer configuration

use serde::{Deserialize, Serialize};

use crate::canvas::CanvasContent;
use crate::effect::EffectScript;

/// Configuration for one renderer instance.
///
/// Built with chained setters and handed to the engine once; the engine
/// never sees later changes to the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RendererConfig {
    target_id: String,
    #[serde(default)]
    dsl: EffectScript,
    #[serde(default)]
    canvas: CanvasContent,
    #[serde(default)]
    replay_delay_ms: Option<u32>,
    #[serde(default)]
    padding_color: Option<u32>,
    #[serde(default)]
    auto_resize_canvas_css: Option<bool>,
}

impl RendererConfig {
    /// Start a configuration for the given target surface
    pub fn new(target_id: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            dsl: EffectScript::default(),
            canvas: CanvasContent::default(),
            replay_delay_ms: None,
            padding_color: None,
            auto_resize_canvas_css: None,
        }
    }

    pub fn with_dsl(mut self, dsl: impl Into<EffectScript>) -> Self {
        self.dsl = dsl.into();
        self
    }

    pub fn with_canvas(mut self, canvas: impl Into<CanvasContent>) -> Self {
        self.canvas = canvas.into();
        self
    }

    /// Replay the effect automatically, pausing `sleep_ms` after each run
    pub fn with_sleep_between_replay(mut self, sleep_ms: u32) -> Self {
        self.replay_delay_ms = Some(sleep_ms);
        self
    }

    /// Color around the grid, packed as `0xRRGGBB`
    pub fn with_canvas_padding_color(mut self, color: u32) -> Self {
        self.padding_color = Some(color);
        self
    }

    pub fn with_auto_resize_canvas_css(mut self, enable: bool) -> Self {
        self.auto_resize_canvas_css = Some(enable);
        self
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn dsl(&self) -> &EffectScript {
        &self.dsl
    }

    pub fn canvas(&self) -> &CanvasContent {
        &self.canvas
    }

    pub fn replay_delay_ms(&self) -> Option<u32> {
        self.replay_delay_ms
    }

    pub fn padding_color(&self) -> Option<u32> {
        self.padding_color
    }

    pub fn auto_resize_canvas_css(&self) -> Option<bool> {
        self.auto_resize_canvas_css
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        let config = RendererConfig::new("canvas1")
            .with_dsl("fx::coalesce(500)")
            .with_canvas("hello")
            .with_sleep_between_replay(1500)
            .with_canvas_padding_color(0x000000);

        assert_eq!(config.target_id(), "canvas1");
        assert_eq!(config.dsl().as_str(), "fx::coalesce(500)");
        assert_eq!(config.canvas().as_str(), "hello");
        assert_eq!(config.replay_delay_ms(), Some(1500));
        assert_eq!(config.padding_color(), Some(0));
        assert_eq!(config.auto_resize_canvas_css(), None);
    }

    #[test]
    fn test_defaults_are_empty() {
        let config = RendererConfig::new("canvas2");
        assert!(config.dsl().is_blank());
        assert!(config.canvas().is_empty());
        assert_eq!(config.replay_delay_ms(), None);
    }

    #[test]
    fn test_config_deserializes_with_missing_fields() {
        let config: RendererConfig =
            serde_json::from_str(r#"{"target_id": "canvas1", "replay_delay_ms": 250}"#).unwrap();
        assert_eq!(config, RendererConfig::new("canvas1").with_sleep_between_replay(250));
    }
}
