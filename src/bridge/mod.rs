//! Input bridge: key and pointer routing, hover debounce, and the
//! model/update loop that ties the viewport to a drawing surface.

pub mod hover;
pub mod input;
pub mod model;
pub mod update;

#[cfg(test)]
mod test_properties;
