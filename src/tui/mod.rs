//! Terminal host for the timeline: crossterm session around the bridge.

#![allow(missing_docs)]

pub mod runtime;
pub mod terminal_guard;

pub use runtime::{Viewer, open_activity_log, run_viewer};
