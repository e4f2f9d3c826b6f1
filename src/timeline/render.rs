//! Draws a laid-out [`Frame`] onto a [`Surface`].
//!
//! Stateless: everything comes in through the arguments. A full render clears
//! the surface; the hover detail redraw is the only partial repaint.

#![allow(missing_docs)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use serde::{Deserialize, Serialize};

use crate::timeline::layout::{Frame, LayoutSettings, NodeGeometry, base_unit};
use crate::timeline::scale::ZoomTier;
use crate::timeline::surface::{
    Font, Point, Rect, Rgb, Surface, TextAlign, TextBaseline, TextStyle,
};
use crate::timeline::viewport::ViewportState;

const DASH: &str = "-";

/// Colors and font family used by the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub default_color: Rgb,
    pub highlight_color: Rgb,
    pub detail_color: Rgb,
    pub background_color: Rgb,
    pub font_family: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            default_color: Rgb(0xd0, 0xd0, 0xd0),
            highlight_color: Rgb(0xff, 0xb0, 0x00),
            detail_color: Rgb(0x5f, 0xd7, 0xff),
            background_color: Rgb(0x10, 0x10, 0x10),
            font_family: "monospace".to_string(),
        }
    }
}

impl Theme {
    #[must_use]
    pub fn font(&self, tier: ZoomTier) -> Font {
        Font {
            size_px: tier.font_size_px(),
            family: self.font_family.clone(),
        }
    }

    fn text_style(&self, tier: ZoomTier, color: Rgb) -> TextStyle {
        TextStyle {
            font: self.font(tier),
            align: TextAlign::Center,
            baseline: TextBaseline::Top,
            color,
        }
    }
}

/// `+` + dashes + `*`, with the dash run sized to `width` pixels.
fn border_line(surface: &dyn Surface, font: &Font, width: f64) -> String {
    let dash_width = surface.measure_text(DASH, font);
    let dashes = if dash_width > 0.0 {
        ((width / dash_width).floor() as usize).saturating_sub(2)
    } else {
        0
    };
    format!("+{}*", DASH.repeat(dashes))
}

fn title_line(title: &str) -> String {
    format!("<-|{title}|->")
}

fn draw_node(
    surface: &mut dyn Surface,
    node: &NodeGeometry,
    settings: &LayoutSettings,
    theme: &Theme,
    tier: ZoomTier,
    color: Rgb,
) {
    let style = theme.text_style(tier, color);
    let x = node.screen_x.to_px();
    let top = node.screen_y.to_px();
    let unit = base_unit(tier).to_px();

    surface.draw_line(
        Point::new(x, settings.baseline_y.to_px()),
        Point::new(x, top),
        color,
    );

    let border = border_line(surface, &style.font, node.width.to_px());
    surface.draw_text(&border, Point::new(x, top), &style);
    surface.draw_text(&title_line(&node.display_title), Point::new(x, top + unit), &style);
    surface.draw_text(&border, Point::new(x, top + 2.0 * unit), &style);
}

/// Full repaint: clear, baseline, every node, every label.
pub fn render_frame(
    surface: &mut dyn Surface,
    state: ViewportState,
    frame: &Frame,
    settings: &LayoutSettings,
    theme: &Theme,
) {
    surface.clear_all();

    let baseline_y = settings.baseline_y.to_px();
    let width = surface.width();
    surface.draw_line(
        Point::new(0.0, baseline_y),
        Point::new(width, baseline_y),
        theme.default_color,
    );

    for node in frame.positions.iter() {
        let color = if state.selected_index == Some(node.source_index) {
            theme.highlight_color
        } else {
            theme.default_color
        };
        draw_node(surface, node, settings, theme, frame.tier, color);
    }

    let style = theme.text_style(frame.tier, theme.default_color);
    let dash_width = surface.measure_text(DASH, &style.font);
    let dashes = if dash_width > 0.0 {
        DASH.repeat((settings.label_dash.to_px() / dash_width).floor() as usize)
    } else {
        String::new()
    };
    for label in &frame.labels {
        surface.draw_text(
            &format!("{dashes}{}{dashes}", label.text),
            Point::new(label.anchor_x.to_px(), label.y.to_px()),
            &style,
        );
    }
}

/// Area a node occupies when drawn with its current title.
#[must_use]
pub fn node_extent(
    surface: &dyn Surface,
    node: &NodeGeometry,
    theme: &Theme,
    tier: ZoomTier,
) -> Rect {
    let font = theme.font(tier);
    let title_width = surface.measure_text(&title_line(&node.display_title), &font);
    let width = node.width.to_px().max(title_width);
    Rect::new(
        node.screen_x.to_px() - width / 2.0,
        node.screen_y.to_px(),
        width,
        node.height.to_px(),
    )
}

/// Partial repaint of one node with its untruncated title.
///
/// `node` must carry the full title (see
/// [`node_geometry_for`](crate::timeline::layout::node_geometry_for)). Only
/// the node's own rectangle is cleared.
pub fn render_detail(
    surface: &mut dyn Surface,
    state: ViewportState,
    node: &NodeGeometry,
    settings: &LayoutSettings,
    theme: &Theme,
) {
    let extent = node_extent(surface, node, theme, state.zoom);
    surface.clear_rect(extent);
    let color = if state.selected_index == Some(node.source_index) {
        theme.highlight_color
    } else {
        theme.detail_color
    };
    draw_node(surface, node, settings, theme, state.zoom, color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::event::{Event, EventCatalog};
    use crate::timeline::grid::CellSurface;
    use crate::timeline::layout::{layout_frame, node_geometry_for};
    use crate::timeline::scale::Coord;
    use crate::timeline::surface::{DrawOp, RecordingSurface};
    use chrono::NaiveDate;

    fn catalog(titles: &[(&str, (i32, u32, u32))]) -> EventCatalog {
        EventCatalog::from_events(
            titles
                .iter()
                .enumerate()
                .map(|(n, &(title, (y, m, d)))| {
                    Event::on(format!("e{n}"), title, NaiveDate::from_ymd_opt(y, m, d).unwrap())
                })
                .collect(),
        )
    }

    fn render_ops(events: &EventCatalog, state: ViewportState) -> Vec<DrawOp> {
        let settings = LayoutSettings::default();
        let mut surface = RecordingSurface::new(800.0, 200.0);
        let frame = layout_frame(events, state, Coord::from_px(800), &settings);
        render_frame(&mut surface, state, &frame, &settings, &Theme::default());
        surface.take_ops()
    }

    #[test]
    fn empty_catalog_draws_only_baseline() {
        let ops = render_ops(&EventCatalog::default(), ViewportState::default());
        assert_eq!(ops.len(), 2);
        assert!(matches!(ops[0], DrawOp::Clear { .. }));
        match &ops[1] {
            DrawOp::Line { from, to, .. } => {
                assert!((from.y - 120.0).abs() < f64::EPSILON);
                assert!((to.x - 800.0).abs() < f64::EPSILON);
            }
            other => panic!("expected baseline, got {other:?}"),
        }
    }

    #[test]
    fn node_draws_connector_and_three_lines() {
        let events = catalog(&[("Launch", (2020, 1, 23))]);
        let ops = render_ops(&events, ViewportState::default());
        let texts: Vec<String> = ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect();
        // width = (6 + 4) * 12 = 120px; dash = 7.2px -> 16 cells - 2 = 14 dashes.
        let border = format!("+{}*", "-".repeat(14));
        assert_eq!(texts[0], border);
        assert_eq!(texts[1], "<-|Launch|->");
        assert_eq!(texts[2], border);
        // 30px / 7.2px = 4 dashes either side of the label.
        assert_eq!(texts[3], "----2020-01----");
        let connector = ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Line { .. }))
            .nth(1)
            .unwrap();
        match connector {
            DrawOp::Line { from, to, .. } => {
                assert!(from.x.abs() < f64::EPSILON);
                assert!((from.y - 120.0).abs() < f64::EPSILON);
                assert!((to.y - 44.0).abs() < f64::EPSILON);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn selected_node_uses_highlight_color() {
        let events = catalog(&[("One", (2020, 1, 1)), ("Two", (2020, 2, 1))]);
        let theme = Theme::default();
        let state = ViewportState::default().with_selection(Some(1));
        let ops = render_ops(&events, state);
        let colors: Vec<(String, Rgb)> = ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, style, .. } if text.starts_with("<-|") => {
                    Some((text.clone(), style.color))
                }
                _ => None,
            })
            .collect();
        assert_eq!(colors[0], ("<-|One|->".to_string(), theme.default_color));
        assert_eq!(colors[1], ("<-|Two|->".to_string(), theme.highlight_color));
    }

    #[test]
    fn fonts_follow_tier() {
        let events = catalog(&[("One", (2020, 1, 1))]);
        for tier in ZoomTier::ALL {
            let ops = render_ops(&events, ViewportState::new(tier, Coord::ZERO));
            for op in &ops {
                if let DrawOp::Text { style, .. } = op {
                    assert_eq!(style.font.size_px, tier.font_size_px());
                    assert_eq!(style.font.family, "monospace");
                }
            }
        }
    }

    #[test]
    fn detail_clears_only_the_widened_node() {
        let events = catalog(&[("A considerably longer title", (2020, 1, 1))]);
        let settings = LayoutSettings::default();
        let state = ViewportState::new(ZoomTier::Month, Coord::from_px(400));
        let node = node_geometry_for(&events, 0, state, &settings, true).unwrap();
        let mut surface = RecordingSurface::new(800.0, 200.0);
        render_detail(&mut surface, state, &node, &settings, &Theme::default());
        let ops = surface.ops();
        match &ops[0] {
            DrawOp::Clear { rect } => {
                assert!(rect.width < 800.0);
                assert!((rect.y - node.screen_y.to_px()).abs() < f64::EPSILON);
            }
            other => panic!("expected clear, got {other:?}"),
        }
        assert!(surface.texts().any(|t| t == "<-|A considerably longer title|->"));
        match &ops[2] {
            DrawOp::Text { style, .. } => assert_eq!(style.color, Theme::default().detail_color),
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn cell_surface_shows_box_above_baseline() {
        let events = catalog(&[("Launch", (2020, 1, 23))]);
        let settings = LayoutSettings::default();
        let state = ViewportState::new(ZoomTier::Month, Coord::from_px(200));
        let mut grid = CellSurface::new(60, 14, 8.0, 12.0);
        let frame = layout_frame(&events, state, Coord::from_px(480), &settings);
        render_frame(&mut grid, state, &frame, &settings, &Theme::default());
        let lines = grid.to_lines();
        assert!(lines[3].contains("+-------------*"));
        assert!(lines[4].contains("<-|Launch|->"));
        assert!(lines[6].trim() == "|");
        assert!(lines[10].starts_with("------"));
        assert!(lines[11].contains("---2020-01---"));
    }
}
