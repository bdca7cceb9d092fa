//! Built-in image loaders.
//!
//! This module contains implementations of the `ImageLoader` trait for the
//! supported file formats.

mod fits_loader;
mod image_loader;
mod npy_loader;

pub use fits_loader::FitsLoader;
pub use image_loader::RasterLoader;
pub use npy_loader::NpyLoader;
