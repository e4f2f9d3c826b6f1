//! Pure state transitions plus the paint step hosts run for render commands.

#![allow(missing_docs)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

use crate::timeline::layout::{layout_frame, node_geometry_for};
use crate::timeline::render::{Theme, render_detail, render_frame};
use crate::timeline::scale::Coord;
use crate::timeline::surface::Surface;
use crate::timeline::viewport::RenderRequest;

use super::input::{InputAction, ScrollDirection, resolve_key};
use super::model::{TimelineCmd, TimelineModel, TimelineMsg};

/// Apply one message to the model and return the resulting command.
pub fn update(model: &mut TimelineModel, msg: TimelineMsg) -> TimelineCmd {
    match msg {
        TimelineMsg::Key(input) => match resolve_key(&input).action {
            Some(action) => apply_action(model, action),
            None => TimelineCmd::None,
        },
        TimelineMsg::PointerMove { x, y } => pointer_moved(model, x, y),
        TimelineMsg::PointerLeave => pointer_left(model),
        TimelineMsg::Resize { width } => {
            let request = model.viewport.set_canvas_width(width);
            repaint(model, request)
        }
        TimelineMsg::HoverTimerFired(token) => match model.hover.accept_fire(token) {
            Some(index) => TimelineCmd::RenderDetail { index },
            None => TimelineCmd::None,
        },
    }
}

fn apply_action(model: &mut TimelineModel, action: InputAction) -> TimelineCmd {
    let request = match action {
        InputAction::Quit => {
            model.should_quit = true;
            return TimelineCmd::Quit;
        }
        InputAction::Scroll(direction) => {
            let step = scroll_step(model.viewport.canvas_width(), model.bridge.scroll_fraction);
            let delta = match direction {
                ScrollDirection::Backward => step,
                ScrollDirection::Forward => -step,
            };
            model.viewport.scroll(delta)
        }
        InputAction::Zoom(direction) => model.viewport.zoom(direction, &model.catalog),
        InputAction::Navigate(step) => model.viewport.navigate(step, &model.catalog),
        InputAction::SelectClosest => {
            match model.viewport.closest_event_to_viewport_center(&model.catalog) {
                Some(index) => model.viewport.select_by_index(index, &model.catalog),
                None => RenderRequest::None,
            }
        }
    };
    repaint(model, request)
}

/// `fraction` of `width`, rounded to the nearest sub-pixel unit.
fn scroll_step(width: Coord, fraction: f64) -> Coord {
    Coord::from_milli((width.milli() as f64 * fraction).round() as i64)
}

/// A full render wipes any detail overlay, so hover starts over.
fn repaint(model: &mut TimelineModel, request: RenderRequest) -> TimelineCmd {
    match request {
        RenderRequest::None => TimelineCmd::None,
        RenderRequest::Full => {
            if model.hover.reset() {
                TimelineCmd::Batch(vec![TimelineCmd::CancelHover, TimelineCmd::RenderFull])
            } else {
                TimelineCmd::RenderFull
            }
        }
    }
}

fn pointer_moved(model: &mut TimelineModel, x: Coord, y: Coord) -> TimelineCmd {
    let hit = model
        .positions
        .hit_test(x, y)
        .map(|node| (node.event_id.clone(), node.source_index));
    match hit {
        Some((event_id, index)) => {
            if model.hover.hovered_event_id() == Some(event_id.as_str()) {
                return TimelineCmd::None;
            }
            // an open detail from the previous target is wiped first
            let revert = model.hover.detail_shown();
            let token = model.hover.retarget(&event_id, index);
            let mut cmds = vec![TimelineCmd::CancelHover];
            if revert {
                cmds.push(TimelineCmd::RenderFull);
            }
            cmds.push(TimelineCmd::ScheduleHover {
                token,
                after: model.bridge.hover_debounce,
            });
            TimelineCmd::Batch(cmds)
        }
        None => pointer_left(model),
    }
}

fn pointer_left(model: &mut TimelineModel) -> TimelineCmd {
    if model.hover.hovered_event_id().is_none() {
        return TimelineCmd::None;
    }
    model.hover.reset();
    TimelineCmd::Batch(vec![TimelineCmd::CancelHover, TimelineCmd::RenderFull])
}

// ──────────────────── paint ────────────────────

/// Lay out and draw a full frame, then replace the model's position table.
///
/// Without a surface nothing happens and the old table stays in place.
pub fn paint_full(model: &mut TimelineModel, surface: Option<&mut dyn Surface>, theme: &Theme) {
    let Some(surface) = surface else {
        return;
    };
    let state = model.viewport.state();
    let frame = layout_frame(
        &model.catalog,
        state,
        model.viewport.canvas_width(),
        &model.layout,
    );
    render_frame(surface, state, &frame, &model.layout, theme);
    model.positions = frame.positions;
}

/// Redraw the node at `index` with its untruncated title.
///
/// No-op without a surface or when the event has no geometry in the current
/// table (it scrolled out of view since the hover began).
pub fn paint_detail(
    model: &TimelineModel,
    surface: Option<&mut dyn Surface>,
    theme: &Theme,
    index: usize,
) {
    let Some(surface) = surface else {
        return;
    };
    if model.positions.get_by_index(index).is_none() {
        return;
    }
    let state = model.viewport.state();
    if let Some(node) = node_geometry_for(&model.catalog, index, state, &model.layout, true) {
        render_detail(surface, state, &node, &model.layout, theme);
    }
}
