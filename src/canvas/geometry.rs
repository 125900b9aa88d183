//! Surface geometry derived from canvas dimensions

use serde::{Deserialize, Serialize};

use super::cell::Color;
use super::grid::CanvasGrid;

/// Pixel size of one glyph cell in the font atlas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSize {
    pub width: u16,
    pub height: u16,
}

impl CellSize {
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

impl Default for CellSize {
    fn default() -> Self {
        Self::new(10, 19)
    }
}

/// Size and presentation of the surface a renderer draws into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasGeometry {
    /// Terminal columns
    pub cols: u16,
    /// Terminal rows
    pub rows: u16,
    /// Surface width in pixels
    pub pixel_width: u32,
    /// Surface height in pixels
    pub pixel_height: u32,
    /// Color painted around the grid, if any
    pub padding_color: Option<Color>,
    /// Whether the surface follows its CSS box size
    pub auto_resize_css: bool,
}

impl CanvasGeometry {
    /// Compute the geometry for a grid.
    ///
    /// Neighbouring glyph cells overlap by one pixel on each side, so every
    /// cell contributes `cell_size - 2` pixels.
    pub fn for_grid(grid: &CanvasGrid, cell_size: CellSize) -> Self {
        let cols = grid.cols().min(u16::MAX as usize) as u16;
        let rows = grid.rows().min(u16::MAX as usize) as u16;
        Self {
            cols,
            rows,
            pixel_width: cols as u32 * cell_size.width.saturating_sub(2) as u32,
            pixel_height: rows as u32 * cell_size.height.saturating_sub(2) as u32,
            padding_color: None,
            auto_resize_css: false,
        }
    }

    /// Set the padding color from a packed `0xRRGGBB` value
    pub fn with_padding_hex(mut self, hex: Option<u32>) -> Self {
        self.padding_color = hex.map(Color::from_hex);
        self
    }

    pub fn with_auto_resize_css(mut self, enable: bool) -> Self {
        self.auto_resize_css = enable;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_size_from_cells() {
        let grid = CanvasGrid::parse("abcd\nef\n").unwrap();
        let geometry = CanvasGeometry::for_grid(&grid, CellSize::new(10, 20));
        assert_eq!((geometry.cols, geometry.rows), (4, 2));
        assert_eq!(geometry.pixel_width, 32);
        assert_eq!(geometry.pixel_height, 36);
    }

    #[test]
    fn test_padding_and_resize() {
        let grid = CanvasGrid::parse("x").unwrap();
        let geometry = CanvasGeometry::for_grid(&grid, CellSize::default())
            .with_padding_hex(Some(0x112233))
            .with_auto_resize_css(true);
        assert_eq!(
            geometry.padding_color,
            Some(Color::Rgb {
                r: 0x11,
                g: 0x22,
                b: 0x33
            })
        );
        assert!(geometry.auto_resize_css);
    }
}
