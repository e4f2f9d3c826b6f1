#![forbid(unsafe_code)]

//! ASCII Timeline (atl): a zoomable horizontal event timeline drawn with
//! ASCII-box glyphs.
//!
//! The crate is split the way data flows through a frame:
//! 1. **Scale** maps dates to virtual X under the month, year and decade tiers
//! 2. **Layout** culls, sizes and labels the visible events into a frame
//! 3. **Render** draws a frame onto any [`Surface`](timeline::surface::Surface)
//! 4. **Viewport** owns scroll, zoom and selection state
//! 5. **Bridge** turns keys, pointer moves and timers into state changes and
//!    repaint commands
//!
//! The core performs no I/O. The terminal host lives in `tui` behind the
//! `cli` feature.
//!
//! # Library usage
//!
//! ```rust,no_run
//! use ascii_timeline::prelude::*;
//!
//! let catalog = sample_catalog(7, 20);
//! let mut model = TimelineModel::new(catalog, Coord::from_px(800));
//! let mut surface = RecordingSurface::new(800.0, 200.0);
//! let cmd = update(&mut model, TimelineMsg::Key(Key::ArrowRight.into()));
//! if cmd.requests_full_render() {
//!     paint_full(&mut model, Some(&mut surface), &Theme::default());
//! }
//! ```

pub mod prelude;

pub mod bridge;
pub mod core;
pub mod logger;
pub mod timeline;
#[cfg(feature = "cli")]
pub mod tui;
