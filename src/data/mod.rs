//! Image data structures and loaders.
//!
//! This module provides:
//! - `ImageData`: a single-frame 2D grid of numeric samples
//! - `LoaderRegistry`: extensible dispatch over file-format loaders
//! - `ImageStore`: loads images from disk and slices regions out of them
//! - Built-in loaders for NumPy (`.npy`) arrays, FITS files and standard
//!   raster images
//!
//! ## Adding new formats
//!
//! To support a new format (e.g. ENVI, HDF5):
//!
//! 1. Create a loader in `loaders/` implementing `ImageLoader`
//! 2. Register it via `LoaderRegistry::register`

mod image;
mod loader;
pub mod loaders;

pub use image::ImageData;
pub use loader::{ImageLoader, ImageStore, LoadError, LoaderRegistry};
