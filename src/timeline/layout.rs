//! Node geometry, visibility culling, date labels, and the position table.
//!
//! [`layout_frame`] is the single source of truth for what a frame contains:
//! the renderer draws exactly its nodes and labels, and the input bridge hit
//! tests against exactly its [`PositionTable`].

#![allow(missing_docs)]
#![allow(clippy::cast_possible_wrap)]

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::timeline::event::EventCatalog;
use crate::timeline::scale::{Coord, ZoomTier, date_to_virtual_x};
use crate::timeline::viewport::ViewportState;

/// Appended to truncated titles.
pub const ELLIPSIS: &str = "...";

/// Box width in base units beyond the title characters.
const BOX_PADDING_UNITS: i64 = 4;

/// Box height in base units (three text lines).
const BOX_HEIGHT_UNITS: i64 = 3;

// ──────────────────── settings ────────────────────

/// Fixed vertical placement and the named layout constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LayoutSettings {
    /// Y of the horizontal timeline baseline.
    pub baseline_y: Coord,
    /// Gap between the baseline and the bottom of every node box.
    pub node_height_offset: Coord,
    /// Distance from the baseline down to the date label row.
    pub label_offset: Coord,
    /// Off-screen margin on both sides inside which nodes are still laid out.
    pub cull_buffer: Coord,
    /// Pixel length of the dash runs flanking each date label.
    pub label_dash: Coord,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            baseline_y: Coord::from_px(120),
            node_height_offset: Coord::from_px(40),
            label_offset: Coord::from_px(16),
            cull_buffer: Coord::from_px(200),
            label_dash: Coord::from_px(30),
        }
    }
}

impl LayoutSettings {
    #[must_use]
    pub fn label_y(&self) -> Coord {
        self.baseline_y + self.label_offset
    }
}

// ──────────────────── frame records ────────────────────

/// Last-drawn, hit-testable box of one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeGeometry {
    pub event_id: String,
    /// Horizontal center of the box; the event's screen X.
    pub screen_x: Coord,
    /// Top edge of the box.
    pub screen_y: Coord,
    pub width: Coord,
    pub height: Coord,
    pub source_index: usize,
    pub original_title: String,
    pub display_title: String,
}

impl NodeGeometry {
    #[must_use]
    pub fn left(&self) -> Coord {
        self.screen_x - self.width.half()
    }

    #[must_use]
    pub fn right(&self) -> Coord {
        self.left() + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> Coord {
        self.screen_y + self.height
    }

    /// Inclusive point-in-box test.
    #[must_use]
    pub fn contains(&self, x: Coord, y: Coord) -> bool {
        x >= self.left() && x <= self.right() && y >= self.screen_y && y <= self.bottom()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateLabel {
    pub text: String,
    /// Deduplication key: the label itself, or the decade number.
    pub bucket: String,
    pub anchor_x: Coord,
    pub y: Coord,
}

/// All node geometry of one frame, in ascending event order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PositionTable {
    nodes: Vec<NodeGeometry>,
}

impl PositionTable {
    #[must_use]
    pub fn new(nodes: Vec<NodeGeometry>) -> Self {
        Self { nodes }
    }

    /// First node containing the point.
    #[must_use]
    pub fn hit_test(&self, x: Coord, y: Coord) -> Option<&NodeGeometry> {
        self.nodes.iter().find(|node| node.contains(x, y))
    }

    #[must_use]
    pub fn get_by_index(&self, source_index: usize) -> Option<&NodeGeometry> {
        self.nodes
            .iter()
            .find(|node| node.source_index == source_index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeGeometry> {
        self.nodes.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Output of one layout pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
    pub tier: ZoomTier,
    pub canvas_width: Coord,
    pub positions: PositionTable,
    pub labels: Vec<DateLabel>,
}

// ──────────────────── text helpers ────────────────────

/// Cut `title` to `budget` characters plus an ellipsis when longer.
#[must_use]
pub fn truncate_title(title: &str, budget: usize) -> String {
    match title.char_indices().nth(budget) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", &title[..cut]),
        None => title.to_string(),
    }
}

/// Tier-specific date label: `YYYY-MM`, `YYYY`, or `'YY` of the decade start.
#[must_use]
pub fn format_date_label(date: NaiveDateTime, tier: ZoomTier) -> String {
    match tier {
        ZoomTier::Month => date.format("%Y-%m").to_string(),
        ZoomTier::Year => date.format("%Y").to_string(),
        ZoomTier::Decade => format!("'{:02}", decade_start(date.year()).rem_euclid(100)),
    }
}

/// Deduplication key for `date` at `tier`.
#[must_use]
pub fn label_bucket(date: NaiveDateTime, tier: ZoomTier) -> String {
    match tier {
        ZoomTier::Month | ZoomTier::Year => format_date_label(date, tier),
        ZoomTier::Decade => date.year().div_euclid(10).to_string(),
    }
}

fn decade_start(year: i32) -> i32 {
    year.div_euclid(10) * 10
}

/// Height of one text line at `tier`; the box sizing unit.
#[must_use]
pub fn base_unit(tier: ZoomTier) -> Coord {
    Coord::from_px(i64::from(tier.font_size_px()))
}

// ──────────────────── layout ────────────────────

/// Geometry of one event regardless of visibility.
///
/// With `full_title` the box is sized to the untruncated title; the hover
/// detail redraw uses this.
#[must_use]
pub fn node_geometry_for(
    catalog: &EventCatalog,
    index: usize,
    state: ViewportState,
    settings: &LayoutSettings,
    full_title: bool,
) -> Option<NodeGeometry> {
    let event = catalog.get(index)?;
    let virtual_x = catalog.virtual_x(index, state.zoom)?;
    let display_title = if full_title {
        event.title.clone()
    } else {
        truncate_title(&event.title, state.zoom.title_budget())
    };
    let unit = base_unit(state.zoom);
    let chars = display_title.chars().count() as i64;
    let width = unit * (chars + BOX_PADDING_UNITS);
    let height = unit * BOX_HEIGHT_UNITS;
    Some(NodeGeometry {
        event_id: event.id.clone(),
        screen_x: state.screen_x(virtual_x),
        screen_y: settings.baseline_y - settings.node_height_offset - height,
        width,
        height,
        source_index: index,
        original_title: event.title.clone(),
        display_title,
    })
}

/// Lay out every visible node and its deduplicated date labels.
#[must_use]
pub fn layout_frame(
    catalog: &EventCatalog,
    state: ViewportState,
    canvas_width: Coord,
    settings: &LayoutSettings,
) -> Frame {
    let tier = state.zoom;
    let low = -settings.cull_buffer;
    let high = canvas_width + settings.cull_buffer;
    let label_y = settings.label_y();

    let mut nodes = Vec::new();
    let mut labels = Vec::new();
    let mut seen_buckets = HashSet::new();

    if let Some(reference) = catalog.min_date() {
        for (index, event) in catalog.iter().enumerate() {
            let screen_x = state.screen_x(date_to_virtual_x(event.date, tier, reference));
            if screen_x < low || screen_x > high {
                continue;
            }
            let Some(node) = node_geometry_for(catalog, index, state, settings, false) else {
                continue;
            };

            let bucket = label_bucket(event.date, tier);
            if seen_buckets.insert(bucket.clone()) {
                let anchor_x = match tier {
                    ZoomTier::Month | ZoomTier::Year => screen_x,
                    ZoomTier::Decade => {
                        state.screen_x(date_to_virtual_x(decade_anchor(event.date), tier, reference))
                    }
                };
                labels.push(DateLabel {
                    text: format_date_label(event.date, tier),
                    bucket,
                    anchor_x,
                    y: label_y,
                });
            }
            nodes.push(node);
        }
    }

    Frame {
        tier,
        canvas_width,
        positions: PositionTable::new(nodes),
        labels,
    }
}

/// Midnight, January 1 of the decade containing `date`.
fn decade_anchor(date: NaiveDateTime) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(decade_start(date.year()), 1, 1)
        .unwrap_or_else(|| date.date())
        .and_time(NaiveTime::MIN)
}
