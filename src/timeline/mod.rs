//! Coordinate-and-rendering engine.
//!
//! Leaves first: [`scale`] maps dates to virtual X, [`layout`] turns a
//! [`viewport::ViewportState`] into node geometry and labels, [`render`]
//! draws a frame onto any [`surface::Surface`].

pub mod event;
pub mod grid;
pub mod layout;
pub mod render;
pub mod sample;
pub mod scale;
pub mod surface;
pub mod viewport;
