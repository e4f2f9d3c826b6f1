//! Viewport state and the controller that mutates it.
//!
//! [`ViewportState`] is a plain `Copy` value: zoom tier, scroll offset and the
//! optional selection. Layout and rendering receive it by value. The only
//! writer is [`ViewportController`], whose operations each return a
//! [`RenderRequest`] telling the host to repaint.

#![allow(missing_docs)]

use serde::Serialize;

use crate::timeline::event::EventCatalog;
use crate::timeline::scale::{Coord, ZoomDirection, ZoomTier};

// ──────────────────── state value ────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ViewportState {
    pub zoom: ZoomTier,
    pub scroll_offset_x: Coord,
    pub selected_index: Option<usize>,
}

impl ViewportState {
    #[must_use]
    pub const fn new(zoom: ZoomTier, scroll_offset_x: Coord) -> Self {
        Self {
            zoom,
            scroll_offset_x,
            selected_index: None,
        }
    }

    /// Virtual X translated by the scroll offset.
    #[must_use]
    pub fn screen_x(self, virtual_x: Coord) -> Coord {
        virtual_x + self.scroll_offset_x
    }

    #[must_use]
    pub fn scrolled(self, delta: Coord) -> Self {
        Self {
            scroll_offset_x: self.scroll_offset_x + delta,
            ..self
        }
    }

    #[must_use]
    pub fn zoomed(self, direction: ZoomDirection) -> Self {
        Self {
            zoom: self.zoom.step(direction),
            ..self
        }
    }

    #[must_use]
    pub fn with_selection(self, selected_index: Option<usize>) -> Self {
        Self {
            selected_index,
            ..self
        }
    }

    /// Virtual X that currently sits under the canvas midpoint.
    #[must_use]
    pub fn center_virtual_x(self, canvas_width: Coord) -> Coord {
        -self.scroll_offset_x + canvas_width.half()
    }
}

// ──────────────────── controller ────────────────────

/// Repaint the host owes after a controller operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum RenderRequest {
    None,
    Full,
}

/// Keyboard navigation step over catalog indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NavStep {
    Prev,
    Next,
    First,
    Last,
}

#[derive(Debug, Clone)]
pub struct ViewportController {
    state: ViewportState,
    canvas_width: Coord,
    keep_center_on_zoom: bool,
}

impl ViewportController {
    #[must_use]
    pub fn new(canvas_width: Coord) -> Self {
        Self {
            state: ViewportState::default(),
            canvas_width,
            keep_center_on_zoom: false,
        }
    }

    #[must_use]
    pub fn with_state(mut self, state: ViewportState) -> Self {
        self.state = state;
        self
    }

    #[must_use]
    pub fn keep_center_on_zoom(mut self, enabled: bool) -> Self {
        self.keep_center_on_zoom = enabled;
        self
    }

    #[must_use]
    pub const fn state(&self) -> ViewportState {
        self.state
    }

    #[must_use]
    pub const fn canvas_width(&self) -> Coord {
        self.canvas_width
    }

    /// Host resized the surface.
    pub fn set_canvas_width(&mut self, width: Coord) -> RenderRequest {
        self.canvas_width = width;
        RenderRequest::Full
    }

    /// Shift the offset by `delta`. Unbounded.
    pub fn scroll(&mut self, delta: Coord) -> RenderRequest {
        self.state = self.state.scrolled(delta);
        RenderRequest::Full
    }

    /// Step one tier, clamped at Month and Decade.
    pub fn zoom(&mut self, direction: ZoomDirection, catalog: &EventCatalog) -> RenderRequest {
        let anchor = if self.keep_center_on_zoom {
            self.closest_event_to_viewport_center(catalog)
        } else {
            None
        };
        self.state = self.state.zoomed(direction);
        if let Some(index) = anchor {
            self.recenter_on(index, catalog);
        }
        RenderRequest::Full
    }

    /// Select `index` and scroll it to the canvas midpoint.
    ///
    /// An out-of-range index clears the selection and leaves the offset alone.
    pub fn select_by_index(&mut self, index: usize, catalog: &EventCatalog) -> RenderRequest {
        if index < catalog.len() {
            self.state = self.state.with_selection(Some(index));
            self.recenter_on(index, catalog);
        } else {
            self.state = self.state.with_selection(None);
        }
        RenderRequest::Full
    }

    pub fn clear_selection(&mut self) -> RenderRequest {
        self.state = self.state.with_selection(None);
        RenderRequest::Full
    }

    /// Move the selection one step, clamped at both ends.
    ///
    /// From no selection, `Next` lands on the first event and `Prev` on the
    /// last. An empty catalog ignores navigation.
    pub fn navigate(&mut self, step: NavStep, catalog: &EventCatalog) -> RenderRequest {
        let Some(last) = catalog.last_index() else {
            return RenderRequest::None;
        };
        let current = self.state.selected_index.map(|index| index.min(last));
        let target = match (step, current) {
            (NavStep::First, _) | (NavStep::Next, None) => 0,
            (NavStep::Last, _) | (NavStep::Prev, None) => last,
            (NavStep::Next, Some(index)) => (index + 1).min(last),
            (NavStep::Prev, Some(index)) => index.saturating_sub(1),
        };
        self.select_by_index(target, catalog)
    }

    /// Index whose virtual X is nearest the viewport midpoint.
    ///
    /// Ties go to the earlier event. `None` only for an empty catalog.
    #[must_use]
    pub fn closest_event_to_viewport_center(&self, catalog: &EventCatalog) -> Option<usize> {
        let center = self.state.center_virtual_x(self.canvas_width);
        let mut best: Option<(usize, u64)> = None;
        for index in 0..catalog.len() {
            let Some(virtual_x) = catalog.virtual_x(index, self.state.zoom) else {
                continue;
            };
            let distance = virtual_x.abs_diff(center);
            if best.is_none_or(|(_, best_distance)| distance < best_distance) {
                best = Some((index, distance));
            }
        }
        best.map(|(index, _)| index)
    }

    fn recenter_on(&mut self, index: usize, catalog: &EventCatalog) {
        if let Some(virtual_x) = catalog.virtual_x(index, self.state.zoom) {
            let delta = self.canvas_width.half() - self.state.screen_x(virtual_x);
            self.state = self.state.scrolled(delta);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::event::Event;
    use chrono::NaiveDate;

    fn catalog(dates: &[(i32, u32, u32)]) -> EventCatalog {
        EventCatalog::from_events(
            dates
                .iter()
                .enumerate()
                .map(|(n, &(y, m, d))| {
                    Event::on(
                        format!("e{n}"),
                        format!("Event {n}"),
                        NaiveDate::from_ymd_opt(y, m, d).unwrap(),
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn starts_at_month_zero_unselected() {
        let controller = ViewportController::new(Coord::from_px(800));
        assert_eq!(controller.state(), ViewportState::default());
        assert_eq!(controller.state().zoom, ZoomTier::Month);
    }

    #[test]
    fn scroll_is_unbounded() {
        let mut controller = ViewportController::new(Coord::from_px(800));
        assert_eq!(
            controller.scroll(Coord::from_px(-1_000_000)),
            RenderRequest::Full
        );
        assert_eq!(
            controller.state().scroll_offset_x,
            Coord::from_px(-1_000_000)
        );
    }

    #[test]
    fn select_recenters_exactly() {
        let events = catalog(&[(2020, 1, 1), (2020, 3, 15), (2021, 7, 9)]);
        let width = Coord::from_px(801);
        let mut controller = ViewportController::new(width);
        let _ = controller.select_by_index(2, &events);
        let state = controller.state();
        let vx = events.virtual_x(2, state.zoom).unwrap();
        assert_eq!(state.screen_x(vx), width.half());
        assert_eq!(state.selected_index, Some(2));
    }

    #[test]
    fn out_of_range_select_clears_without_scrolling() {
        let events = catalog(&[(2020, 1, 1)]);
        let mut controller = ViewportController::new(Coord::from_px(800));
        let _ = controller.select_by_index(0, &events);
        let offset = controller.state().scroll_offset_x;
        assert_eq!(controller.select_by_index(5, &events), RenderRequest::Full);
        assert_eq!(controller.state().selected_index, None);
        assert_eq!(controller.state().scroll_offset_x, offset);
    }

    #[test]
    fn navigation_clamps_and_starts_at_ends() {
        let events = catalog(&[(2020, 1, 1), (2020, 2, 1), (2020, 3, 1)]);
        let mut controller = ViewportController::new(Coord::from_px(800));
        let _ = controller.navigate(NavStep::Prev, &events);
        assert_eq!(controller.state().selected_index, Some(2));
        let _ = controller.navigate(NavStep::Next, &events);
        assert_eq!(controller.state().selected_index, Some(2));
        let _ = controller.navigate(NavStep::First, &events);
        let _ = controller.navigate(NavStep::Prev, &events);
        assert_eq!(controller.state().selected_index, Some(0));

        let _ = controller.clear_selection();
        let _ = controller.navigate(NavStep::Next, &events);
        let _ = controller.navigate(NavStep::Next, &events);
        assert_eq!(controller.state().selected_index, Some(1));
    }

    #[test]
    fn navigation_on_empty_catalog_is_noop() {
        let mut controller = ViewportController::new(Coord::from_px(800));
        let empty = EventCatalog::default();
        assert_eq!(
            controller.navigate(NavStep::Next, &empty),
            RenderRequest::None
        );
        assert_eq!(controller.state(), ViewportState::default());
    }

    #[test]
    fn closest_prefers_first_on_ties() {
        // Two events 10 days either side of the midpoint at Month scale.
        let events = catalog(&[(2020, 1, 1), (2020, 1, 21)]);
        let mut controller = ViewportController::new(Coord::from_px(60));
        let _ = controller.scroll(Coord::from_px(0));
        // Center virtual X = 30px = day 10.
        assert_eq!(controller.closest_event_to_viewport_center(&events), Some(0));
        let _ = controller.scroll(Coord::from_px(-3));
        assert_eq!(controller.closest_event_to_viewport_center(&events), Some(1));
        assert_eq!(
            controller.closest_event_to_viewport_center(&EventCatalog::default()),
            None
        );
    }

    #[test]
    fn zoom_clamps_and_keeps_offset_by_default() {
        let events = catalog(&[(2020, 1, 1), (2024, 1, 1)]);
        let mut controller = ViewportController::new(Coord::from_px(800));
        let _ = controller.scroll(Coord::from_px(-500));
        let _ = controller.zoom(ZoomDirection::In, &events);
        assert_eq!(controller.state().zoom, ZoomTier::Month);
        for _ in 0..4 {
            let _ = controller.zoom(ZoomDirection::Out, &events);
        }
        assert_eq!(controller.state().zoom, ZoomTier::Decade);
        assert_eq!(controller.state().scroll_offset_x, Coord::from_px(-500));
    }

    #[test]
    fn zoom_can_keep_center_event_centered() {
        let events = catalog(&[(2020, 1, 1), (2021, 6, 1), (2024, 1, 1)]);
        let width = Coord::from_px(800);
        let mut controller = ViewportController::new(width).keep_center_on_zoom(true);
        let _ = controller.select_by_index(1, &events);
        let _ = controller.zoom(ZoomDirection::Out, &events);
        let state = controller.state();
        assert_eq!(state.zoom, ZoomTier::Year);
        let vx = events.virtual_x(1, state.zoom).unwrap();
        assert_eq!(state.screen_x(vx), width.half());
    }
}
