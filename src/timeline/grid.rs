//! Character-grid surface for terminals and plain-text output.
//!
//! Pixels map onto cells of `cell_w × cell_h`. Every glyph occupies one cell,
//! so `measure_text` is `chars × cell_w`. The cell height follows the active
//! zoom tier's font size ([`CellSurface::fit_tier`]), which puts each text
//! line the renderer emits on its own row.

#![allow(missing_docs)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]

use crate::timeline::scale::ZoomTier;
use crate::timeline::surface::{
    Font, Point, Rect, Rgb, Surface, TextStyle, aligned_left, aligned_top,
};

/// Guards floor() against representation error at exact cell boundaries.
const EDGE_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub color: Option<Rgb>,
}

impl Cell {
    pub const BLANK: Self = Self {
        ch: ' ',
        color: None,
    };
}

#[derive(Debug, Clone)]
pub struct CellSurface {
    cols: usize,
    rows: usize,
    cell_w: f64,
    cell_h: f64,
    cells: Vec<Cell>,
    dirty: Vec<bool>,
}

impl CellSurface {
    #[must_use]
    pub fn new(cols: usize, rows: usize, cell_w: f64, cell_h: f64) -> Self {
        Self {
            cols,
            rows,
            cell_w: cell_w.max(1.0),
            cell_h: cell_h.max(1.0),
            cells: vec![Cell::BLANK; cols * rows],
            dirty: vec![true; rows],
        }
    }

    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub const fn cell_size(&self) -> (f64, f64) {
        (self.cell_w, self.cell_h)
    }

    /// Change the grid dimensions in cells. Contents are discarded.
    pub fn resize_cells(&mut self, cols: usize, rows: usize) {
        self.cols = cols;
        self.rows = rows;
        self.cells = vec![Cell::BLANK; cols * rows];
        self.dirty = vec![true; rows];
    }

    /// Match the row height to `tier`'s font size.
    pub fn fit_tier(&mut self, tier: ZoomTier) {
        let cell_h = f64::from(tier.font_size_px());
        if (cell_h - self.cell_h).abs() > f64::EPSILON {
            self.cell_h = cell_h;
            self.dirty.fill(true);
        }
    }

    #[must_use]
    pub fn cell(&self, col: usize, row: usize) -> Option<Cell> {
        (col < self.cols && row < self.rows).then(|| self.cells[row * self.cols + col])
    }

    /// Row contents, trailing blanks included.
    #[must_use]
    pub fn row_text(&self, row: usize) -> String {
        if row >= self.rows {
            return String::new();
        }
        let start = row * self.cols;
        self.cells[start..start + self.cols]
            .iter()
            .map(|cell| cell.ch)
            .collect()
    }

    #[must_use]
    pub fn row_cells(&self, row: usize) -> &[Cell] {
        if row >= self.rows {
            return &[];
        }
        let start = row * self.cols;
        &self.cells[start..start + self.cols]
    }

    /// All rows with trailing blanks trimmed.
    #[must_use]
    pub fn to_lines(&self) -> Vec<String> {
        (0..self.rows)
            .map(|row| self.row_text(row).trim_end().to_string())
            .collect()
    }

    /// Rows written since the last call.
    pub fn take_dirty_rows(&mut self) -> Vec<usize> {
        let rows = self
            .dirty
            .iter()
            .enumerate()
            .filter_map(|(row, dirty)| dirty.then_some(row))
            .collect();
        self.dirty.fill(false);
        rows
    }

    /// Pixel that a pointer over `(col, row)` reports.
    ///
    /// Horizontally the cell center; vertically the last pixel of the row, so
    /// a box whose top falls inside a row is hit from that row.
    #[must_use]
    pub fn pixel_for_cell(&self, col: usize, row: usize) -> (f64, f64) {
        (
            (col as f64 + 0.5) * self.cell_w,
            (row as f64 + 1.0) * self.cell_h - 0.001,
        )
    }

    fn col_of(&self, x: f64) -> i64 {
        ((x + EDGE_EPSILON) / self.cell_w).floor() as i64
    }

    fn row_of(&self, y: f64) -> i64 {
        ((y + EDGE_EPSILON) / self.cell_h).floor() as i64
    }

    fn max_col(&self) -> i64 {
        self.cols as i64 - 1
    }

    fn max_row(&self) -> i64 {
        self.rows as i64 - 1
    }

    fn put(&mut self, col: i64, row: i64, ch: char, color: Option<Rgb>) {
        if col < 0 || row < 0 {
            return;
        }
        let (col, row) = (col as usize, row as usize);
        if col >= self.cols || row >= self.rows {
            return;
        }
        self.cells[row * self.cols + col] = Cell { ch, color };
        self.dirty[row] = true;
    }
}

impl Surface for CellSurface {
    fn size(&self) -> (f64, f64) {
        (
            self.cols as f64 * self.cell_w,
            self.rows as f64 * self.cell_h,
        )
    }

    fn resize(&mut self, width: f64, height: f64) {
        let cols = (width / self.cell_w).floor().max(0.0) as usize;
        let rows = (height / self.cell_h).floor().max(0.0) as usize;
        self.resize_cells(cols, rows);
    }

    fn clear_rect(&mut self, rect: Rect) {
        let first_col = self.col_of(rect.x).max(0);
        let last_col = self.col_of(rect.right() - EDGE_EPSILON * 2.0).min(self.max_col());
        let first_row = self.row_of(rect.y).max(0);
        let last_row = self.row_of(rect.bottom() - EDGE_EPSILON * 2.0).min(self.max_row());
        for row in first_row..=last_row {
            for col in first_col..=last_col {
                self.put(col, row, ' ', None);
            }
        }
    }

    fn draw_line(&mut self, from: Point, to: Point, color: Rgb) {
        if (from.y - to.y).abs() < f64::EPSILON {
            let row = self.row_of(from.y);
            let first = self.col_of(from.x.min(to.x)).max(0);
            let last = self
                .col_of(from.x.max(to.x) - EDGE_EPSILON * 2.0)
                .min(self.max_col());
            for col in first..=last {
                self.put(col, row, '-', Some(color));
            }
        } else {
            let col = self.col_of(from.x);
            let first = self.row_of(from.y.min(to.y)).max(0);
            let last = self
                .row_of(from.y.max(to.y) - EDGE_EPSILON * 2.0)
                .min(self.max_row());
            for row in first..=last {
                self.put(col, row, '|', Some(color));
            }
        }
    }

    fn draw_text(&mut self, text: &str, at: Point, style: &TextStyle) {
        let width = self.measure_text(text, &style.font);
        let left = aligned_left(at.x, width, style.align);
        let top = aligned_top(at.y, self.cell_h, style.baseline);
        let start = (left / self.cell_w).round() as i64;
        let row = self.row_of(top);
        for (offset, ch) in text.chars().enumerate() {
            self.put(start + offset as i64, row, ch, Some(style.color));
        }
    }

    fn measure_text(&self, text: &str, _font: &Font) -> f64 {
        text.chars().count() as f64 * self.cell_w
    }
}
