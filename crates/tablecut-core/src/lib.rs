//! Tablecut Core - Interactive grid segmentation engine
//!
//! This crate turns one photograph of a printed table plus a sequence of
//! operator commands into a directory of per-cell cropped images that an
//! OCR step can consume.
//!
//! # Pipeline
//!
//! 1. [`decode`] loads the photograph into an RGB [`Raster`], applying
//!    EXIF orientation.
//! 2. [`session`] runs the line placement state machine: row clicks,
//!    column clicks, undo, and a modal rotation sub-state that deskews
//!    the working frame in 0.25-degree steps.
//! 3. [`segment`] freezes the angle, adds the implicit image-edge
//!    boundaries, and crops and writes one PNG per cell as
//!    `row_<i>/col_<j>.png`.
//!
//! The engine is single-threaded and UI-free; frontends own the event
//! loop and translate their input into [`Command`]s.

pub mod decode;
pub mod overlay;
pub mod segment;
pub mod session;
pub mod transform;

pub use decode::{decode_table_image, load_table_image, DecodeError, Raster};
pub use segment::{grid_boundaries, segment_session, SegmentError, SegmentReport};
pub use session::{
    Command, DrawingMode, Phase, Preview, Session, Step, ROTATE_STEP_DEGREES,
};
pub use transform::{crop_rect, rotate_about_center, SampleFilter};
