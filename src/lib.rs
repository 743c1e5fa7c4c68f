//! platemark: license plate detection helpers.
//!
//! The core is [`annotate`], which draws detection boxes, corner brackets and
//! labels onto images for display. Around it sit the dataset descriptor
//! preparation and training launcher for the external detector, and a batch
//! annotator for detection manifests.

pub mod annotate;
pub mod build_info;
pub mod categories;
pub mod config;
pub mod dataset;
pub mod detections;
pub mod logging;
pub mod settings;
pub mod train;

pub use annotate::{
    draw_corner_brackets, draw_filled_box, AnnotateStyle, Annotator, ColorInput, Coord, MarkerStyle,
};
