//! Canvas cells and their attributes

use serde::{Deserialize, Serialize};

/// One display column of a canvas row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Grapheme drawn in the cell, with any combining marks. Empty for
    /// padding and for the right half of a wide character.
    pub content: String,
    pub fg: Color,
    pub bg: Color,
    pub style: Style,
    /// Display width: 0 for a wide-character continuation, else 1 or 2
    pub width: u8,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            content: String::new(),
            fg: Color::Default,
            bg: Color::Default,
            style: Style::default(),
            width: 1,
        }
    }
}

impl Cell {
    pub fn with_style(content: String, fg: Color, bg: Color, style: Style, width: u8) -> Self {
        Self {
            content,
            fg,
            bg,
            style,
            width,
        }
    }

    pub fn is_wide_continuation(&self) -> bool {
        self.width == 0
    }
}

/// Cell color as written by SGR sequences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Color {
    /// Whatever the surface uses by default
    #[default]
    Default,
    /// 256-color palette index; 0-15 are the ANSI and bright colors
    Indexed { index: u8 },
    Rgb { r: u8, g: u8, b: u8 },
}

impl Color {
    /// Unpack a `0xRRGGBB` value
    pub fn from_hex(hex: u32) -> Self {
        let [_, r, g, b] = hex.to_be_bytes();
        Color::Rgb { r, g, b }
    }
}

/// SGR text attributes; only set flags are serialized
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Style {
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub faint: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub blink: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub inverse: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub strikethrough: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}
