//! Timeline state machine: model, messages, and commands.
//!
//! Follows the Elm architecture: [`TimelineModel`] holds all state, hosts feed
//! [`TimelineMsg`] values into [`update`](super::update::update), and the
//! returned [`TimelineCmd`] describes the side effects (repaints, timers) the
//! host must perform. `update` itself performs no I/O.

#![allow(missing_docs)]

use std::time::Duration;

use crate::timeline::event::EventCatalog;
use crate::timeline::layout::{LayoutSettings, PositionTable};
use crate::timeline::scale::Coord;
use crate::timeline::viewport::{ViewportController, ViewportState};

use super::hover::HoverState;
use super::input::KeyInput;

// ──────────────────── settings ────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BridgeSettings {
    /// Fraction of the canvas width scrolled per Up/Down key.
    pub scroll_fraction: f64,
    /// Delay before the hover detail redraw.
    pub hover_debounce: Duration,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            scroll_fraction: 0.5,
            hover_debounce: Duration::from_millis(100),
        }
    }
}

// ──────────────────── model ────────────────────

#[derive(Debug, Clone)]
pub struct TimelineModel {
    pub catalog: EventCatalog,
    pub viewport: ViewportController,
    /// Position table of the most recent full render.
    pub positions: PositionTable,
    pub hover: HoverState,
    pub layout: LayoutSettings,
    pub bridge: BridgeSettings,
    pub should_quit: bool,
}

impl TimelineModel {
    #[must_use]
    pub fn new(catalog: EventCatalog, canvas_width: Coord) -> Self {
        Self {
            catalog,
            viewport: ViewportController::new(canvas_width),
            positions: PositionTable::default(),
            hover: HoverState::default(),
            layout: LayoutSettings::default(),
            bridge: BridgeSettings::default(),
            should_quit: false,
        }
    }

    #[must_use]
    pub fn with_layout(mut self, layout: LayoutSettings) -> Self {
        self.layout = layout;
        self
    }

    #[must_use]
    pub fn with_bridge(mut self, bridge: BridgeSettings) -> Self {
        self.bridge = bridge;
        self
    }

    #[must_use]
    pub fn with_viewport(mut self, viewport: ViewportController) -> Self {
        self.viewport = viewport;
        self
    }

    #[must_use]
    pub const fn state(&self) -> ViewportState {
        self.viewport.state()
    }
}

// ──────────────────── messages ────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineMsg {
    Key(KeyInput),
    /// Pointer position relative to the surface origin.
    PointerMove { x: Coord, y: Coord },
    /// Pointer left the surface.
    PointerLeave,
    /// Host resized the surface; a full render follows immediately.
    Resize { width: Coord },
    /// A scheduled hover timer fired.
    HoverTimerFired(u64),
}

// ──────────────────── commands ────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineCmd {
    None,
    /// Lay out and draw a full frame, then publish its position table.
    RenderFull,
    /// Redraw one node with its untruncated title.
    RenderDetail { index: usize },
    /// Fire `HoverTimerFired(token)` after the delay.
    ScheduleHover { token: u64, after: Duration },
    /// Drop any scheduled hover timer.
    CancelHover,
    Quit,
    Batch(Vec<Self>),
}

impl TimelineCmd {
    /// Flatten nested batches in execution order.
    #[must_use]
    pub fn flatten(self) -> Vec<Self> {
        match self {
            Self::None => Vec::new(),
            Self::Batch(cmds) => cmds.into_iter().flat_map(Self::flatten).collect(),
            other => vec![other],
        }
    }

    #[must_use]
    pub fn requests_full_render(&self) -> bool {
        match self {
            Self::RenderFull => true,
            Self::Batch(cmds) => cmds.iter().any(Self::requests_full_render),
            _ => false,
        }
    }
}
