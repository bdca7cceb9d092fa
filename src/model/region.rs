//! Rectangular region-of-interest type.

/// An axis-aligned rectangle in image coordinates.
///
/// Regions are value types: editing flows create candidate geometries and
/// commit whole new `Region` values rather than mutating bounds in place.
/// A region may be authored with negative width/height (dragging a rectangle
/// from an arbitrary corner produces inverted bounds); call [`normalized`]
/// before using it for extraction or persistence.
///
/// [`normalized`]: Region::normalized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Left edge (or right edge, while inverted during authoring).
    pub x: i32,
    /// Top edge (or bottom edge, while inverted during authoring).
    pub y: i32,
    /// Horizontal extent; may be negative before normalization.
    pub width: i32,
    /// Vertical extent; may be negative before normalization.
    pub height: i32,
    /// Transient selection flag for presentation. Never persisted.
    pub selected: bool,
}

impl Region {
    /// Create a region from position and size as authored.
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            selected: false,
        }
    }

    /// Create a canonical region spanning two corner points.
    pub fn from_corners(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self::new(x1.min(x2), y1.min(y2), (x2 - x1).abs(), (y2 - y1).abs())
    }

    /// Canonical form with non-negative width and height.
    ///
    /// Inverted bounds (right < left or bottom < top) are flipped so that
    /// `x`/`y` name the top-left corner. Idempotent: normalizing an already
    /// canonical region returns it unchanged.
    pub fn normalized(&self) -> Self {
        let (x, width) = if self.width < 0 {
            (self.x + self.width, -self.width)
        } else {
            (self.x, self.width)
        };
        let (y, height) = if self.height < 0 {
            (self.y + self.height, -self.height)
        } else {
            (self.y, self.height)
        };
        Self {
            x,
            y,
            width,
            height,
            selected: self.selected,
        }
    }

    /// Copy of this region shifted by `(dx, dy)`.
    ///
    /// Used to compose a locally-stored rectangle with its anchor position
    /// into absolute image coordinates.
    pub const fn translated(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            width: self.width,
            height: self.height,
            selected: self.selected,
        }
    }

    /// Intersection of this region with an image of the given dimensions.
    ///
    /// Brings the region to canonical form, then clips it to
    /// `[0, width] x [0, height]`. A region partially overlapping the image
    /// keeps its in-image part; a region entirely outside collapses to an
    /// empty region at the nearest edge. Extraction takes bounds as-is, so
    /// callers clip regions to the image before extracting.
    pub fn clamped(&self, width: u32, height: u32) -> Self {
        let r = self.normalized();
        let x0 = r.left().clamp(0, width as i32);
        let y0 = r.top().clamp(0, height as i32);
        let x1 = r.right().clamp(0, width as i32);
        let y1 = r.bottom().clamp(0, height as i32);
        Self {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
            selected: r.selected,
        }
    }

    /// Left edge of the rectangle.
    pub const fn left(&self) -> i32 {
        self.x
    }

    /// Top edge of the rectangle.
    pub const fn top(&self) -> i32 {
        self.y
    }

    /// Right edge, `x + width`.
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Bottom edge, `y + height`.
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Whether this region covers zero pixels.
    ///
    /// An empty region is valid: it denotes an extraction contributing zero
    /// samples, not an error.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Copy of this region with the transient selection flag set.
    pub const fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_inverted_bounds() {
        let dragged = Region::new(10, 20, -4, -6);
        let canonical = dragged.normalized();
        assert_eq!(canonical, Region::new(6, 14, 4, 6));
        assert_eq!(canonical.right(), 10);
        assert_eq!(canonical.bottom(), 20);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for region in [
            Region::new(0, 0, 5, 5),
            Region::new(3, 7, -2, 9),
            Region::new(-4, -4, -1, -1),
            Region::new(1, 1, 0, 0),
        ] {
            let once = region.normalized();
            assert_eq!(once.normalized(), once);
            assert!(once.width >= 0);
            assert!(once.height >= 0);
        }
    }

    #[test]
    fn test_from_corners_matches_normalize() {
        let a = Region::from_corners(12, 3, 2, 13);
        let b = Region::new(12, 3, -10, 10).normalized();
        assert_eq!(a, b);
    }

    #[test]
    fn test_translated_composes_anchor() {
        let local = Region::new(0, 0, 100, 100);
        let absolute = local.translated(40, 25);
        assert_eq!(absolute, Region::new(40, 25, 100, 100));
        assert_eq!(absolute.translated(-40, -25), local);
    }

    #[test]
    fn test_clamped_keeps_interior_region() {
        let region = Region::new(1, 1, 2, 2);
        assert_eq!(region.clamped(8, 8), region);
    }

    #[test]
    fn test_clamped_clips_partial_overlap() {
        assert_eq!(Region::new(2, 2, 4, 4).clamped(4, 4), Region::new(2, 2, 2, 2));
        assert_eq!(Region::new(-3, -2, 5, 5).clamped(8, 8), Region::new(0, 0, 2, 3));
    }

    #[test]
    fn test_clamped_outside_image_is_empty() {
        assert!(Region::new(10, 10, 4, 4).clamped(4, 4).is_empty());
        assert!(Region::new(-9, -9, 3, 3).clamped(4, 4).is_empty());
    }

    #[test]
    fn test_clamped_normalizes_first() {
        assert_eq!(Region::new(6, 6, -4, -4).clamped(4, 4), Region::new(2, 2, 2, 2));
    }

    #[test]
    fn test_zero_size_is_empty_not_invalid() {
        let line = Region::new(5, 5, 0, 10);
        assert!(line.is_empty());
        assert_eq!(line.normalized(), line);
    }

    #[test]
    fn test_selected_flag_is_transient_state() {
        let region = Region::new(1, 2, 3, 4).with_selected(true);
        assert!(region.selected);
        assert!(region.normalized().selected);
        assert_eq!(region.normalized(), region);
    }
}
