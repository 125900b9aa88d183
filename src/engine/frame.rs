//! Composited frames
//!
//! A frame captures what one instance showed at the end of a tick: the
//! canvas it drew over and where its effect stood. Frames serialize to JSON
//! for the headless runner and for tests.

use serde::{Deserialize, Serialize};

use crate::canvas::{CanvasGeometry, CanvasGrid};

/// Output of one render-loop tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Target surface the frame was drawn into
    pub target: String,
    /// Monotonic frame counter for this instance
    pub number: u64,
    /// Surface size and presentation
    pub geometry: CanvasGeometry,
    /// Canvas content underneath the effect
    pub grid: CanvasGrid,
    /// Active effect, if any
    pub effect: Option<EffectSnapshot>,
}

/// State of the active effect when the frame was composed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSnapshot {
    /// Root effect constructor
    pub name: String,
    /// Script the effect was compiled from
    pub script: String,
    /// Time since the effect (re)started
    pub elapsed_ms: u64,
    /// Fraction completed, 0.0 for effects that never finish
    pub progress: f32,
    pub done: bool,
}

impl Frame {
    /// Convert frame to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse frame from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Plain text of the canvas (for debugging)
    pub fn to_text(&self) -> String {
        self.grid.to_text()
    }

    /// Compare what two frames show, ignoring timing
    pub fn content_equals(&self, other: &Frame) -> bool {
        let same_effect = match (&self.effect, &other.effect) {
            (Some(a), Some(b)) => a.name == b.name && a.script == b.script,
            (None, None) => true,
            _ => false,
        };
        self.target == other.target && self.grid == other.grid && same_effect
    }
}
