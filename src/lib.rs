//! roicurve - region-of-interest threshold analysis for scientific 2D images.
//!
//! This crate is the computational core of an interactive image-analysis
//! viewer. It loads single-frame 2D numeric images, slices rectangular
//! regions of interest out of them, aggregates the sampled pixel values
//! across many files and regions into cumulative threshold curves, and
//! persists the file-group/region configuration as a JSON project document.
//!
//! The presentation layer (windowing, mouse-driven region editing, plot
//! rendering) lives outside this crate and drives it through four surfaces:
//!
//! - [`model::Region`]: immutable rectangles in absolute image coordinates
//! - [`data::ImageStore`]: image loading and bounds-checked extraction
//! - [`format::Project`]: the persisted project document
//! - [`curve::CurveEngine`]: threshold-curve computation over file batches

pub mod curve;
pub mod data;
pub mod format;
pub mod model;

pub use curve::{
    CancelToken, CurveEngine, CurveError, CurveOptions, CurveOutcome, CurveWorker, FileCurve,
    PerFileOutcome, SkippedFile, ThresholdCurve,
};
pub use data::{ImageData, ImageStore, LoadError, LoaderRegistry};
pub use format::{AreaEntry, FileGroup, Project, ProjectData, ProjectError};
pub use model::Region;
