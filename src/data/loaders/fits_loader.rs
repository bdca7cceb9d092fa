//! Loader for FITS files (Flexible Image Transport System).
//!
//! Reads the primary HDU of a FITS file as a single-frame 2D image. The
//! underlying parser works on file paths, so this loader only supports
//! [`load_path`](crate::data::loader::ImageLoader::load_path).

use std::path::Path;

use fitrs::{Fits, FitsData, FitsDataArray};
use ndarray::Array2;

use crate::data::ImageData;
use crate::data::loader::{ImageLoader, LoadError};

/// Loader for FITS astronomical/scientific image files.
///
/// Only the primary HDU is read, and it must hold 2D numeric data. Integer
/// blank values (missing samples) become NaN, which downstream counting
/// ignores.
pub struct FitsLoader;

/// Assemble a row-major sample grid from a FITS data array.
///
/// FITS stores NAXIS1 as the fastest-varying axis, so `shape` is
/// `[width, height]` while the samples are laid out row by row.
fn from_fits_array(shape: &[usize], samples: Vec<f32>) -> Result<ImageData, LoadError> {
    if shape.len() != 2 {
        return Err(LoadError::format(
            "fits",
            format!("expected 2D data in primary HDU, got {} axes", shape.len()),
        ));
    }
    let (width, height) = (shape[0], shape[1]);
    let data = Array2::from_shape_vec((height, width), samples).map_err(|e| {
        LoadError::format("fits", format!("data length does not match shape: {e}"))
    })?;
    Ok(ImageData::new(data))
}

fn int_array_to_image<T: Copy + Into<f64>>(
    arr: &FitsDataArray<Option<T>>,
) -> Result<ImageData, LoadError> {
    let samples = arr
        .data
        .iter()
        .map(|v| match v {
            Some(v) => {
                let v: f64 = (*v).into();
                v as f32
            }
            None => f32::NAN,
        })
        .collect();
    from_fits_array(&arr.shape, samples)
}

impl ImageLoader for FitsLoader {
    fn id(&self) -> &'static str {
        "fits"
    }

    fn display_name(&self) -> &'static str {
        "FITS Image"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["fits", "fit", "fts"]
    }

    fn can_load(&self, data: &[u8]) -> bool {
        // Every conformant FITS file opens with the SIMPLE keyword.
        data.starts_with(b"SIMPLE")
    }

    fn load(&self, _data: &[u8]) -> Result<ImageData, LoadError> {
        Err(LoadError::format(
            "fits",
            "FITS data must be loaded from a file path",
        ))
    }

    fn load_path(&self, path: &Path) -> Result<ImageData, LoadError> {
        let fits = Fits::open(path)
            .map_err(|e| LoadError::format("fits", format!("failed to open FITS file: {e}")))?;

        let hdu = fits
            .iter()
            .next()
            .ok_or_else(|| LoadError::format("fits", "no primary HDU"))?;

        let data = hdu.read_data();
        let image = match &data {
            FitsData::FloatingPoint32(arr) => from_fits_array(&arr.shape, arr.data.clone()),
            FitsData::FloatingPoint64(arr) => from_fits_array(
                &arr.shape,
                arr.data.iter().map(|&v| v as f32).collect(),
            ),
            FitsData::IntegersI32(arr) => int_array_to_image(arr),
            FitsData::IntegersU32(arr) => int_array_to_image(arr),
            FitsData::Characters(_) => Err(LoadError::format(
                "fits",
                "primary HDU holds character data, not an image",
            )),
        }?;

        log::trace!(
            "FitsLoader: loaded {}x{} image from {:?}",
            image.width(),
            image.height(),
            path
        );

        Ok(image)
    }

    fn priority(&self) -> i32 {
        10
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use fitrs::Hdu;

    use crate::data::loader::LoaderRegistry;

    fn write_fits_fixture(path: &Path, width: usize, height: usize) {
        // v = y * width + x, so sample values encode their coordinates.
        let data: Vec<f32> = (0..width * height).map(|v| v as f32).collect();
        let hdu = Hdu::new(&[width, height], data);
        Fits::create(path, hdu).unwrap();
    }

    #[test]
    fn test_loader_metadata() {
        let loader = FitsLoader;
        assert_eq!(loader.id(), "fits");
        assert!(loader.extensions().contains(&"fits"));
        assert!(loader.extensions().contains(&"fts"));
    }

    #[test]
    fn test_magic_detection() {
        let loader = FitsLoader;
        assert!(loader.can_load(b"SIMPLE  =                    T"));
        assert!(!loader.can_load(b"\x93NUMPY"));
    }

    #[test]
    fn test_load_primary_hdu_2d() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.fits");
        write_fits_fixture(&path, 4, 3);

        let image = FitsLoader.load_path(&path).unwrap();
        assert_eq!(image.width(), 4);
        assert_eq!(image.height(), 3);
        assert_eq!(image.data()[[0, 0]], 0.0);
        assert_eq!(image.data()[[1, 2]], 6.0);
        assert_eq!(image.data()[[2, 3]], 11.0);
    }

    #[test]
    fn test_load_from_bytes_is_rejected() {
        let err = FitsLoader.load(b"SIMPLE  =").unwrap_err();
        assert!(matches!(err, LoadError::Format { loader: "fits", .. }));
    }

    #[test]
    fn test_registry_dispatches_fits_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.fts");
        write_fits_fixture(&path, 5, 2);

        let image = LoaderRegistry::new().load_path(&path).unwrap();
        assert_eq!(image.width(), 5);
        assert_eq!(image.height(), 2);
    }
}
