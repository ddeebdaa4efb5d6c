//! Geometry of the working frame: rotation and cell cropping.
//!
//! The working frame is always the source raster rotated by the session's
//! current angle, on a canvas of the source's size. Grid lines, preview
//! overlays, and cell rectangles all live in that fixed [0,W] x [0,H]
//! coordinate space.
//!
//! Segmentation calls [`rotate_about_center`] with the frozen final angle
//! and then [`crop_rect`] once per cell; the preview path uses the same
//! rotation call so what the operator sees is what gets cropped.

mod crop;
mod rotation;

pub use crop::crop_rect;
pub use rotation::{rotate_about_center, SampleFilter};
