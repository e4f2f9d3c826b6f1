//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use ascii_timeline::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{AtlError, Result};

// Timeline
pub use crate::timeline::event::{Event, EventCatalog, EventRecord};
pub use crate::timeline::grid::CellSurface;
pub use crate::timeline::layout::{Frame, LayoutSettings, NodeGeometry, PositionTable, layout_frame};
pub use crate::timeline::render::{Theme, render_detail, render_frame};
pub use crate::timeline::sample::sample_catalog;
pub use crate::timeline::scale::{Coord, ZoomDirection, ZoomTier};
pub use crate::timeline::surface::{RecordingSurface, Surface};
pub use crate::timeline::viewport::{ViewportController, ViewportState};

// Bridge
pub use crate::bridge::input::{Key, KeyInput, resolve_key};
pub use crate::bridge::model::{TimelineCmd, TimelineModel, TimelineMsg};
pub use crate::bridge::update::{paint_detail, paint_full, update};
