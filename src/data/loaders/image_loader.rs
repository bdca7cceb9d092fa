//! Loader for standard raster formats (PNG, TIFF, BMP, JPEG).
//!
//! Decodes to 16-bit grayscale and carries the luma values through as raw
//! intensity samples.

use ndarray::Array2;

use crate::data::ImageData;
use crate::data::loader::{ImageLoader, LoadError};

/// Loader for standard raster image formats.
///
/// Supports PNG, TIFF, BMP and JPEG. Pixels are converted to 16-bit luma and
/// used as raw sample values: 16-bit sources keep their 0-65535 values,
/// 8-bit sources are mapped back to their native 0-255 range with
/// fractional luma preserved.
pub struct RasterLoader;

impl ImageLoader for RasterLoader {
    fn id(&self) -> &'static str {
        "raster"
    }

    fn display_name(&self) -> &'static str {
        "Raster Image (grayscale)"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["png", "tiff", "tif", "bmp", "jpg", "jpeg"]
    }

    fn can_load(&self, data: &[u8]) -> bool {
        if data.len() < 8 {
            return false;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return true;
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return true;
        }

        // BMP: 42 4D (BM)
        if data.starts_with(&[0x42, 0x4D]) {
            return true;
        }

        // TIFF: II*\0 (little endian) or MM\0* (big endian)
        data.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
    }

    fn load(&self, data: &[u8]) -> Result<ImageData, LoadError> {
        let decoded = image::load_from_memory(data)
            .map_err(|e| LoadError::format("raster", format!("failed to decode image: {e}")))?;

        let width = decoded.width() as usize;
        let height = decoded.height() as usize;

        // to_luma8 would truncate 16-bit scientific scans, so go through
        // luma16 and rescale the 8-bit case back to its native range.
        let is_16bit = matches!(
            decoded.color(),
            image::ColorType::L16 | image::ColorType::La16 | image::ColorType::Rgb16 | image::ColorType::Rgba16
        );
        let luma = decoded.to_luma16();

        let data = Array2::from_shape_fn((height, width), |(y, x)| {
            let v = luma.get_pixel(x as u32, y as u32)[0];
            if is_16bit {
                f32::from(v)
            } else {
                // 8-bit sources are upscaled by 257 in to_luma16; undo it
                // without truncating luma derived from mixed RGB channels.
                f32::from(v) / 257.0
            }
        });

        log::trace!("RasterLoader: loaded {width}x{height} grayscale image");

        Ok(ImageData::new(data))
    }
}
