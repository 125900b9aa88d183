//! Canvas grid parsing
//!
//! Turns canvas text (plain or ANSI-styled) into a rectangular grid of
//! cells. Only SGR sequences affect the result; every other escape sequence
//! is consumed and dropped. The grid is as tall as the text has lines and as
//! wide as its widest line.

use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthChar;

use super::cell::{Cell, Color, Style};

const TAB_STOP: usize = 8;
const ESC: char = '\x1b';
const BEL: char = '\x07';

/// Error produced when canvas text cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at byte {offset}")]
pub struct CanvasError {
    pub message: String,
    pub offset: usize,
}

impl CanvasError {
    fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// Rectangular grid of styled cells (row-major)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CanvasGrid {
    cols: usize,
    rows: usize,
    cells: Vec<Vec<Cell>>,
}

/// Current drawing attributes while parsing
#[derive(Debug, Clone, Copy, Default)]
struct Pen {
    fg: Color,
    bg: Color,
    style: Style,
}

impl CanvasGrid {
    /// Parse canvas text into a grid
    pub fn parse(text: &str) -> Result<Self, CanvasError> {
        let mut lines: Vec<Vec<Cell>> = Vec::new();
        let mut line_widths: Vec<usize> = Vec::new();
        let mut line: Vec<Cell> = Vec::new();
        let mut width = 0usize;
        let mut pen = Pen::default();
        let mut chars = text.char_indices().peekable();

        while let Some((offset, c)) = chars.next() {
            match c {
                ESC => match chars.next() {
                    Some((_, '[')) => {
                        let mut params = String::new();
                        let final_byte = loop {
                            match chars.next() {
                                Some((_, b @ '\x40'..='\x7e')) => break b,
                                Some((_, p)) => params.push(p),
                                None => {
                                    return Err(CanvasError::new(
                                        "unterminated CSI sequence",
                                        offset,
                                    ))
                                }
                            }
                        };
                        if final_byte == 'm' {
                            apply_sgr(&mut pen, &params);
                        }
                    }
                    Some((_, ']')) => loop {
                        match chars.next() {
                            Some((_, BEL)) => break,
                            Some((_, ESC)) => {
                                if matches!(chars.peek(), Some((_, '\\'))) {
                                    chars.next();
                                }
                                break;
                            }
                            Some(_) => {}
                            None => {
                                return Err(CanvasError::new("unterminated OSC sequence", offset))
                            }
                        }
                    },
                    Some(_) => {}
                    None => return Err(CanvasError::new("dangling escape", offset)),
                },
                '\n' => {
                    lines.push(std::mem::take(&mut line));
                    line_widths.push(width);
                    width = 0;
                }
                '\t' => {
                    let pad = TAB_STOP - (width % TAB_STOP);
                    for _ in 0..pad {
                        line.push(Cell::with_style(" ".to_string(), pen.fg, pen.bg, pen.style, 1));
                    }
                    width += pad;
                }
                c if c.is_control() => {}
                c => match c.width().unwrap_or(0) {
                    0 => {
                        // Combining mark joins the previous visible cell
                        if let Some(prev) = line.iter_mut().rev().find(|cell| cell.width > 0) {
                            prev.content.push(c);
                        }
                    }
                    w => {
                        line.push(Cell::with_style(c.to_string(), pen.fg, pen.bg, pen.style, w as u8));
                        if w == 2 {
                            line.push(Cell::with_style(String::new(), pen.fg, pen.bg, pen.style, 0));
                        }
                        width += w;
                    }
                },
            }
        }

        // A trailing newline terminates the last line rather than opening a new one
        if !line.is_empty() || (!text.is_empty() && !text.ends_with('\n')) {
            lines.push(line);
            line_widths.push(width);
        }

        let cols = line_widths.iter().copied().max().unwrap_or(0);
        let rows = lines.len();
        let cells = lines
            .into_iter()
            .zip(line_widths)
            .map(|(mut line, width)| {
                line.extend((width..cols).map(|_| Cell::default()));
                line
            })
            .collect();

        Ok(Self { cols, rows, cells })
    }

    /// Number of columns (display width of the widest line)
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of rows (line count)
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Check whether the grid has no cells at all
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// Cells of one row, including continuation cells of wide characters
    pub fn row(&self, row: usize) -> Option<&[Cell]> {
        self.cells.get(row).map(Vec::as_slice)
    }

    /// Get the cell at a display column, resolving through wide characters
    pub fn cell(&self, col: usize, row: usize) -> Option<&Cell> {
        let mut x = 0;
        for cell in self.cells.get(row)? {
            if cell.is_wide_continuation() {
                continue;
            }
            if col < x + cell.width as usize {
                return Some(cell);
            }
            x += cell.width as usize;
        }
        None
    }

    /// Plain text of the grid with trailing blanks trimmed
    pub fn to_text(&self) -> String {
        let mut result = String::new();

        for row in &self.cells {
            let start = result.len();
            for cell in row.iter().filter(|c| !c.is_wide_continuation()) {
                if cell.content.is_empty() {
                    result.push(' ');
                } else {
                    result.push_str(&cell.content);
                }
            }
            let trimmed = result[start..].trim_end_matches(' ').len();
            result.truncate(start + trimmed);
            result.push('\n');
        }

        result
    }
}

/// Apply an SGR parameter list to the pen
fn apply_sgr(pen: &mut Pen, params: &str) {
    // An empty parameter means 0; one that does not fit is skipped
    let values: Vec<u16> = params
        .split([';', ':'])
        .filter_map(|p| if p.is_empty() { Some(0) } else { p.parse().ok() })
        .collect();

    let mut i = 0;
    while i < values.len() {
        match values[i] {
            0 => *pen = Pen::default(),
            1 => pen.style.bold = true,
            2 => pen.style.faint = true,
            3 => pen.style.italic = true,
            4 => pen.style.underline = true,
            5 | 6 => pen.style.blink = true,
            7 => pen.style.inverse = true,
            8 => pen.style.hidden = true,
            9 => pen.style.strikethrough = true,
            22 => {
                pen.style.bold = false;
                pen.style.faint = false;
            }
            23 => pen.style.italic = false,
            24 => pen.style.underline = false,
            25 => pen.style.blink = false,
            27 => pen.style.inverse = false,
            28 => pen.style.hidden = false,
            29 => pen.style.strikethrough = false,
            n @ 30..=37 => pen.fg = Color::Indexed { index: (n - 30) as u8 },
            38 => {
                if let Some((color, used)) = extended_color(&values[i + 1..]) {
                    pen.fg = color;
                    i += used;
                }
            }
            39 => pen.fg = Color::Default,
            n @ 40..=47 => pen.bg = Color::Indexed { index: (n - 40) as u8 },
            48 => {
                if let Some((color, used)) = extended_color(&values[i + 1..]) {
                    pen.bg = color;
                    i += used;
                }
            }
            49 => pen.bg = Color::Default,
            n @ 90..=97 => pen.fg = Color::Indexed { index: (n - 90 + 8) as u8 },
            n @ 100..=107 => pen.bg = Color::Indexed { index: (n - 100 + 8) as u8 },
            _ => {}
        }
        i += 1;
    }
}

/// Parse `5;n` or `2;r;g;b`, returning the color and the parameters consumed
fn extended_color(rest: &[u16]) -> Option<(Color, usize)> {
    match rest {
        [5, index, ..] => Some((Color::Indexed { index: channel(*index) }, 2)),
        [2, r, g, b, ..] => Some((
            Color::Rgb {
                r: channel(*r),
                g: channel(*g),
                b: channel(*b),
            },
            4,
        )),
        _ => None,
    }
}

fn channel(value: u16) -> u8 {
    value.min(255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_dimensions() {
        let grid = CanvasGrid::parse("hello\nhi\n").unwrap();
        assert_eq!(grid.rows(), 2);
        assert_eq!(grid.cols(), 5);
        assert_eq!(grid.to_text(), "hello\nhi\n");
        // Short rows are padded to the full width
        assert_eq!(grid.row(1).unwrap().len(), 5);
    }

    #[test]
    fn test_empty_canvas() {
        let grid = CanvasGrid::parse("").unwrap();
        assert!(grid.is_empty());
        assert_eq!(grid.rows(), 0);
        assert_eq!(grid.cols(), 0);
    }

    #[test]
    fn test_sgr_colors() {
        let grid = CanvasGrid::parse("\x1b[1;31mR\x1b[0mN\x1b[38;2;10;20;30mT").unwrap();
        assert_eq!(grid.cols(), 3);

        let red = grid.cell(0, 0).unwrap();
        assert_eq!(red.content, "R");
        assert_eq!(red.fg, Color::Indexed { index: 1 });
        assert!(red.style.bold);

        let normal = grid.cell(1, 0).unwrap();
        assert_eq!(normal.fg, Color::Default);
        assert!(!normal.style.bold);

        let truecolor = grid.cell(2, 0).unwrap();
        assert_eq!(truecolor.fg, Color::Rgb { r: 10, g: 20, b: 30 });
    }

    #[test]
    fn test_256_color_and_bright() {
        let grid = CanvasGrid::parse("\x1b[48;5;202ma\x1b[95mb").unwrap();
        assert_eq!(grid.cell(0, 0).unwrap().bg, Color::Indexed { index: 202 });
        assert_eq!(grid.cell(1, 0).unwrap().fg, Color::Indexed { index: 13 });
    }

    #[test]
    fn test_out_of_range_sgr_values() {
        // Overflowing parameters are skipped, not read as a reset
        let grid = CanvasGrid::parse("\x1b[1;31m\x1b[99999ma").unwrap();
        let cell = grid.cell(0, 0).unwrap();
        assert!(cell.style.bold);
        assert_eq!(cell.fg, Color::Indexed { index: 1 });

        let grid = CanvasGrid::parse("\x1b[38;5;300mb\x1b[48;2;300;20;1000mc").unwrap();
        assert_eq!(grid.cell(0, 0).unwrap().fg, Color::Indexed { index: 255 });
        assert_eq!(grid.cell(1, 0).unwrap().bg, Color::Rgb { r: 255, g: 20, b: 255 });

        // An empty parameter list still resets
        let grid = CanvasGrid::parse("\x1b[1m\x1b[md").unwrap();
        assert!(!grid.cell(0, 0).unwrap().style.bold);
    }

    #[test]
    fn test_wide_characters() {
        let grid = CanvasGrid::parse("中a").unwrap();
        assert_eq!(grid.cols(), 3);
        assert_eq!(grid.cell(0, 0).unwrap().content, "中");
        assert_eq!(grid.cell(1, 0).unwrap().content, "中");
        assert_eq!(grid.cell(2, 0).unwrap().content, "a");
        assert!(grid.row(0).unwrap()[1].is_wide_continuation());
    }

    #[test]
    fn test_tabs_expand_to_stops() {
        let grid = CanvasGrid::parse("ab\tc").unwrap();
        assert_eq!(grid.cols(), 9);
        assert_eq!(grid.cell(8, 0).unwrap().content, "c");
    }

    #[test]
    fn test_non_sgr_sequences_are_dropped() {
        let grid = CanvasGrid::parse("\x1b[2J\x1b]0;title\x07ok").unwrap();
        assert_eq!(grid.to_text(), "ok\n");
    }

    #[test]
    fn test_unterminated_sequences_fail() {
        let err = CanvasGrid::parse("ok\x1b[31").unwrap_err();
        assert_eq!(err.offset, 2);
        assert!(CanvasGrid::parse("ok\x1b").is_err());
        assert!(CanvasGrid::parse("\x1b]0;title").is_err());
    }
}
