//! Single-frame 2D image data and sub-array extraction.

use ndarray::{Array2, s};

use crate::model::Region;

/// A single-frame 2D grid of numeric intensity samples.
///
/// Stored row-major with ndarray's `[row, col] = [y, x]` convention, so the
/// array shape is `(height, width)`. Dimensions are fixed at load time; a new
/// load produces a new `ImageData`.
#[derive(Debug, Clone)]
pub struct ImageData {
    data: Array2<f32>,
    width: u32,
    height: u32,
}

impl ImageData {
    /// Wrap a `(height, width)` sample grid.
    pub fn new(data: Array2<f32>) -> Self {
        let (height, width) = data.dim();
        Self {
            data,
            width: width as u32,
            height: height as u32,
        }
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The full `(height, width)` sample grid.
    pub fn data(&self) -> &Array2<f32> {
        &self.data
    }

    /// Rectangular sub-array `data[top..bottom, left..right]` for a region.
    ///
    /// The region is brought to canonical form first, but its bounds are
    /// otherwise taken as-is: out-of-range bounds are not clamped. A
    /// zero-area or out-of-range region yields an empty `(0, 0)` array, and
    /// callers treat that as "no samples contributed" rather than an error.
    pub fn extract(&self, region: &Region) -> Array2<f32> {
        let r = region.normalized();
        let (x0, y0) = (r.left(), r.top());
        let (x1, y1) = (r.right(), r.bottom());

        let in_range =
            x0 >= 0 && y0 >= 0 && x1 <= self.width as i32 && y1 <= self.height as i32;
        if !in_range || r.is_empty() {
            return Array2::zeros((0, 0));
        }

        self.data
            .slice(s![y0 as usize..y1 as usize, x0 as usize..x1 as usize])
            .to_owned()
    }

    /// Flattened 1D sequence of the samples inside a region.
    pub fn samples(&self, region: &Region) -> Vec<f32> {
        self.extract(region).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_image(width: usize, height: usize) -> ImageData {
        // Sample value encodes its coordinates: v = y * 100 + x
        ImageData::new(Array2::from_shape_fn((height, width), |(y, x)| {
            (y * 100 + x) as f32
        }))
    }

    #[test]
    fn test_extract_interior_region() {
        let img = ramp_image(8, 6);
        let sub = img.extract(&Region::new(2, 1, 3, 2));
        assert_eq!(sub.dim(), (2, 3));
        assert_eq!(sub[[0, 0]], 102.0);
        assert_eq!(sub[[1, 2]], 204.0);
    }

    #[test]
    fn test_extract_full_image() {
        let img = ramp_image(4, 3);
        let sub = img.extract(&Region::new(0, 0, 4, 3));
        assert_eq!(sub, *img.data());
    }

    #[test]
    fn test_extract_zero_area_yields_no_samples() {
        let img = ramp_image(4, 4);
        assert_eq!(img.extract(&Region::new(1, 1, 0, 3)).len(), 0);
        assert_eq!(img.extract(&Region::new(1, 1, 3, 0)).len(), 0);
        assert!(img.samples(&Region::new(2, 2, 0, 0)).is_empty());
    }

    #[test]
    fn test_extract_out_of_range_yields_empty() {
        let img = ramp_image(4, 4);
        assert_eq!(img.extract(&Region::new(-1, 0, 2, 2)).len(), 0);
        assert_eq!(img.extract(&Region::new(3, 3, 2, 2)).len(), 0);
    }

    #[test]
    fn test_extract_clamped_region_yields_intersection() {
        let img = ImageData::new(Array2::from_elem((4, 4), 200.0));
        let region = Region::new(2, 2, 4, 4);

        // As-is the bounds run off the image, so nothing is extracted.
        assert_eq!(img.samples(&region).len(), 0);

        // Clipped to the image, the 2x2 intersection contributes.
        let clipped = region.clamped(img.width(), img.height());
        let samples = img.samples(&clipped);
        assert_eq!(samples.len(), 4);
        assert!(samples.iter().all(|&v| v == 200.0));
    }

    #[test]
    fn test_extract_normalizes_inverted_bounds() {
        let img = ramp_image(8, 8);
        let dragged = Region::new(5, 4, -3, -2);
        assert_eq!(img.extract(&dragged), img.extract(&dragged.normalized()));
    }
}
