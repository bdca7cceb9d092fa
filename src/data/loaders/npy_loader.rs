//! Loader for NumPy `.npy` files.
//!
//! Scientific 2D intensity data is commonly exported as NumPy arrays; this
//! loader accepts single-frame 2D `.npy` files of the usual numeric dtypes.

use std::io::Cursor;

use ndarray::{ArrayD, Ix2};
use ndarray_npy::ReadNpyExt;

use crate::data::ImageData;
use crate::data::loader::{ImageLoader, LoadError};

/// Loader for NumPy `.npy` files.
///
/// Accepts 2D arrays of `f32`, `f64`, `u8`, `u16`, `u32`, `i16`, `i32` or
/// `i64`. Sample values are carried through as raw intensities (no
/// normalization): threshold counts operate on the values as stored.
/// Arrays with other dimensionality are rejected as a format error.
pub struct NpyLoader;

impl NpyLoader {
    /// NumPy magic bytes: \x93NUMPY
    const MAGIC: &'static [u8] = &[0x93, b'N', b'U', b'M', b'P', b'Y'];

    fn array_to_image<T>(array: ArrayD<T>) -> Result<ImageData, LoadError>
    where
        T: Copy + Into<f64>,
    {
        let shape = array.shape().to_vec();
        let array = array.into_dimensionality::<Ix2>().map_err(|_| {
            LoadError::format(
                "npy",
                format!("expected a 2D array, got shape {shape:?}"),
            )
        })?;

        let data = array.mapv(|v| {
            let v: f64 = v.into();
            v as f32
        });
        log::debug!("NpyLoader: array shape {shape:?}");
        Ok(ImageData::new(data))
    }
}

impl ImageLoader for NpyLoader {
    fn id(&self) -> &'static str {
        "npy"
    }

    fn display_name(&self) -> &'static str {
        "NumPy Array (.npy)"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["npy"]
    }

    fn can_load(&self, data: &[u8]) -> bool {
        data.len() >= Self::MAGIC.len() && data.starts_with(Self::MAGIC)
    }

    fn load(&self, data: &[u8]) -> Result<ImageData, LoadError> {
        let mut cursor = Cursor::new(data);

        // Try numeric dtypes in order of likelihood; f32 is most common
        // for scientific data.
        if let Ok(array) = ArrayD::<f32>::read_npy(&mut cursor) {
            return Self::array_to_image(array);
        }

        cursor.set_position(0);
        if let Ok(array) = ArrayD::<f64>::read_npy(&mut cursor) {
            // Narrowing past f32 precision is accepted for threshold counting.
            return Self::array_to_image(array);
        }

        cursor.set_position(0);
        if let Ok(array) = ArrayD::<u8>::read_npy(&mut cursor) {
            return Self::array_to_image(array);
        }

        cursor.set_position(0);
        if let Ok(array) = ArrayD::<u16>::read_npy(&mut cursor) {
            return Self::array_to_image(array);
        }

        cursor.set_position(0);
        if let Ok(array) = ArrayD::<u32>::read_npy(&mut cursor) {
            return Self::array_to_image(array);
        }

        cursor.set_position(0);
        if let Ok(array) = ArrayD::<i16>::read_npy(&mut cursor) {
            return Self::array_to_image(array);
        }

        cursor.set_position(0);
        if let Ok(array) = ArrayD::<i32>::read_npy(&mut cursor) {
            return Self::array_to_image(array);
        }

        cursor.set_position(0);
        if let Ok(array) = ArrayD::<i64>::read_npy(&mut cursor) {
            let shape = array.shape().to_vec();
            let array = array.into_dimensionality::<Ix2>().map_err(|_| {
                LoadError::format(
                    "npy",
                    format!("expected a 2D array, got shape {shape:?}"),
                )
            })?;
            return Ok(ImageData::new(array.mapv(|v| v as f32)));
        }

        Err(LoadError::format(
            "npy",
            "failed to read NumPy array: unsupported dtype or invalid header",
        ))
    }

    fn priority(&self) -> i32 {
        // NumPy files outrank generic rasters for scientific data.
        10
    }
}
