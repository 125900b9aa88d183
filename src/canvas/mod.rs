//! Canvas Module
//!
//! Canvas content is the backdrop an effect animates over. The host passes it
//! through as opaque text; the headless engine parses it into a cell grid
//! and derives the surface geometry from it.

mod cell;
mod geometry;
mod grid;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use cell::{Cell, Color, Style};
pub use geometry::{CanvasGeometry, CellSize};
pub use grid::{CanvasError, CanvasGrid};

/// Opaque canvas snapshot text (usually ANSI-styled)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanvasContent(String);

impl CanvasContent {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for CanvasContent {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for CanvasContent {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

impl fmt::Display for CanvasContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
