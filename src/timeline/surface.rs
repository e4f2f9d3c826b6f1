//! 2D drawing surface abstraction and a recording implementation.
//!
//! The renderer talks only to [`Surface`]: clear a region, draw a line, draw
//! styled text, measure text width, and read or change the logical size.
//! [`RecordingSurface`] keeps a display list of every call, which is what the
//! tests and `atl render --format ops` inspect.

#![allow(missing_docs)]
#![allow(clippy::cast_precision_loss)]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ──────────────────── primitives ────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// 24-bit color, written as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Self = Self(0xff, 0xff, 0xff);
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl FromStr for Rgb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| format!("color {s:?} must start with '#'"))?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("color {s:?} must be #rrggbb"));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|e| format!("color {s:?}: {e}"))
        };
        Ok(Self(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical anchor of the text origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextBaseline {
    #[default]
    Top,
    Middle,
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Font {
    pub size_px: u32,
    pub family: String,
}

impl Font {
    #[must_use]
    pub fn monospace(size_px: u32) -> Self {
        Self {
            size_px,
            family: "monospace".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextStyle {
    pub font: Font,
    pub align: TextAlign,
    pub baseline: TextBaseline,
    pub color: Rgb,
}

/// Left edge of a text run of `width` drawn at `x` with `align`.
#[must_use]
pub fn aligned_left(x: f64, width: f64, align: TextAlign) -> f64 {
    match align {
        TextAlign::Left => x,
        TextAlign::Center => x - width / 2.0,
        TextAlign::Right => x - width,
    }
}

/// Top edge of a text line of `height` anchored at `y` with `baseline`.
#[must_use]
pub fn aligned_top(y: f64, height: f64, baseline: TextBaseline) -> f64 {
    match baseline {
        TextBaseline::Top => y,
        TextBaseline::Middle => y - height / 2.0,
        TextBaseline::Bottom => y - height,
    }
}

// ──────────────────── surface trait ────────────────────

/// Immediate-mode 2D drawing context.
pub trait Surface {
    /// Logical `(width, height)` in pixels.
    fn size(&self) -> (f64, f64);

    /// Change the logical size. Contents are discarded.
    fn resize(&mut self, width: f64, height: f64);

    fn clear_rect(&mut self, rect: Rect);

    fn draw_line(&mut self, from: Point, to: Point, color: Rgb);

    fn draw_text(&mut self, text: &str, at: Point, style: &TextStyle);

    /// Rendered width of `text` in `font`, in pixels.
    fn measure_text(&self, text: &str, font: &Font) -> f64;

    fn width(&self) -> f64 {
        self.size().0
    }

    fn clear_all(&mut self) {
        let (width, height) = self.size();
        self.clear_rect(Rect::new(0.0, 0.0, width, height));
    }
}

// ──────────────────── recording surface ────────────────────

/// Average monospace advance as a fraction of the font size.
pub const MONOSPACE_ADVANCE: f64 = 0.6;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    Clear { rect: Rect },
    Line { from: Point, to: Point, color: Rgb },
    Text {
        text: String,
        at: Point,
        style: TextStyle,
    },
}

/// Display-list surface: records every call in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    width: f64,
    height: f64,
    ops: Vec<DrawOp>,
}

impl RecordingSurface {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    #[must_use]
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<DrawOp> {
        std::mem::take(&mut self.ops)
    }

    /// Text of every `Text` op, in draw order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.ops.clear();
    }

    fn clear_rect(&mut self, rect: Rect) {
        self.ops.push(DrawOp::Clear { rect });
    }

    fn draw_line(&mut self, from: Point, to: Point, color: Rgb) {
        self.ops.push(DrawOp::Line { from, to, color });
    }

    fn draw_text(&mut self, text: &str, at: Point, style: &TextStyle) {
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            at,
            style: style.clone(),
        });
    }

    fn measure_text(&self, text: &str, font: &Font) -> f64 {
        text.chars().count() as f64 * f64::from(font.size_px) * MONOSPACE_ADVANCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_parses_and_prints() {
        let color: Rgb = "#1a2B3c".parse().unwrap();
        assert_eq!(color, Rgb(0x1a, 0x2b, 0x3c));
        assert_eq!(color.to_string(), "#1a2b3c");
        assert!("1a2b3c".parse::<Rgb>().is_err());
        assert!("#12345".parse::<Rgb>().is_err());
        assert!("#12345g".parse::<Rgb>().is_err());
    }

    #[test]
    fn rgb_serde_uses_hex_string() {
        let json = serde_json::to_string(&Rgb(255, 0, 16)).unwrap();
        assert_eq!(json, "\"#ff0010\"");
        let back: Rgb = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Rgb(255, 0, 16));
    }

    #[test]
    fn alignment_helpers() {
        assert!((aligned_left(100.0, 40.0, TextAlign::Center) - 80.0).abs() < f64::EPSILON);
        assert!((aligned_left(100.0, 40.0, TextAlign::Right) - 60.0).abs() < f64::EPSILON);
        assert!((aligned_top(50.0, 10.0, TextBaseline::Middle) - 45.0).abs() < f64::EPSILON);
        assert!((aligned_top(50.0, 10.0, TextBaseline::Bottom) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn recording_surface_keeps_order() {
        let mut surface = RecordingSurface::new(200.0, 100.0);
        surface.clear_all();
        surface.draw_line(
            Point::new(0.0, 10.0),
            Point::new(200.0, 10.0),
            Rgb::WHITE,
        );
        surface.draw_text(
            "hi",
            Point::new(5.0, 5.0),
            &TextStyle {
                font: Font::monospace(10),
                align: TextAlign::Left,
                baseline: TextBaseline::Top,
                color: Rgb::WHITE,
            },
        );
        assert_eq!(surface.ops().len(), 3);
        assert!(matches!(surface.ops()[0], DrawOp::Clear { .. }));
        assert_eq!(surface.texts().collect::<Vec<_>>(), ["hi"]);
    }

    #[test]
    fn measure_counts_chars_not_bytes() {
        let surface = RecordingSurface::new(10.0, 10.0);
        let font = Font::monospace(10);
        assert!((surface.measure_text("héllo", &font) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn resize_discards_ops() {
        let mut surface = RecordingSurface::new(10.0, 10.0);
        surface.clear_all();
        surface.resize(20.0, 30.0);
        assert!(surface.ops().is_empty());
        assert_eq!(surface.size(), (20.0, 30.0));
    }

    #[test]
    fn ops_serialize_with_tag() {
        let mut surface = RecordingSurface::new(10.0, 10.0);
        surface.clear_all();
        let json = serde_json::to_string(surface.ops()).unwrap();
        assert!(json.contains("\"op\":\"clear\""));
    }
}
