//! Crop rectangle types.
//!
//! Three representations of the same rectangle appear in the pipeline:
//!
//! - [`CropRect`]: the widget's live rectangle, fractional image pixels
//! - [`CropDescriptor`]: the saved, rounded rectangle attached to an image.
//!   Signed because it may come from raw numeric input that was never clamped.
//! - [`PixelRegion`]: a descriptor validated against real image dimensions,
//!   guaranteed to lie inside the image and to be at least 1x1
//!
//! All coordinates are in the original image's pixel grid, origin top-left.

use serde::{Deserialize, Serialize};

/// Live crop rectangle as reported by the crop widget.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Round every component to the nearest integer.
    pub fn round(&self) -> CropDescriptor {
        CropDescriptor {
            x: self.x.round() as i64,
            y: self.y.round() as i64,
            width: self.width.round() as i64,
            height: self.height.round() as i64,
        }
    }
}

impl From<CropDescriptor> for CropRect {
    fn from(d: CropDescriptor) -> Self {
        Self {
            x: d.x as f64,
            y: d.y as f64,
            width: d.width as f64,
            height: d.height as f64,
        }
    }
}

/// Saved crop rectangle for one image, in integer original-image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CropDescriptor {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl CropDescriptor {
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Descriptor covering the whole `width x height` image.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i64, height as i64)
    }

    /// Check the descriptor invariant against source dimensions without clamping.
    pub fn fits_within(&self, source_width: u32, source_height: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.width >= 1
            && self.height >= 1
            && ends_within(self.x, self.width, source_width)
            && ends_within(self.y, self.height, source_height)
    }

    /// Clamp into a `source_width x source_height` image.
    ///
    /// The origin is clamped into the image, then the size is shrunk so the
    /// region ends inside it. Sizes below one pixel become one pixel.
    /// Returns `None` only for an empty source.
    pub fn clamp_to(&self, source_width: u32, source_height: u32) -> Option<PixelRegion> {
        if source_width == 0 || source_height == 0 {
            return None;
        }

        let (x, width) = clamp_axis(self.x, self.width, source_width);
        let (y, height) = clamp_axis(self.y, self.height, source_height);

        Some(PixelRegion {
            x,
            y,
            width,
            height,
        })
    }
}

/// `origin + length <= extent`, treating overflow as out of bounds.
fn ends_within(origin: i64, length: i64, extent: u32) -> bool {
    origin
        .checked_add(length)
        .is_some_and(|end| end <= extent as i64)
}

/// Clamp one axis: origin into `[0, extent - 1]`, length into `[1, extent - origin]`.
fn clamp_axis(origin: i64, length: i64, extent: u32) -> (u32, u32) {
    let extent = extent as i64;
    let origin = origin.clamp(0, extent - 1);
    let length = length.clamp(1, extent - origin);
    (origin as u32, length as u32)
}

/// A crop region proven to fit inside a specific image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRegion {
    /// The whole image.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn to_descriptor(self) -> CropDescriptor {
        CropDescriptor::new(
            self.x as i64,
            self.y as i64,
            self.width as i64,
            self.height as i64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_away_from_zero() {
        let rect = CropRect::new(10.5, 19.49, 399.6, 400.4);
        assert_eq!(rect.round(), CropDescriptor::new(11, 19, 400, 400));
    }

    #[test]
    fn test_fits_within() {
        assert!(CropDescriptor::new(0, 0, 100, 80).fits_within(100, 80));
        assert!(CropDescriptor::new(10, 10, 90, 70).fits_within(100, 80));
        assert!(!CropDescriptor::new(11, 10, 90, 70).fits_within(100, 80));
        assert!(!CropDescriptor::new(-1, 0, 10, 10).fits_within(100, 80));
        assert!(!CropDescriptor::new(0, 0, 0, 10).fits_within(100, 80));
    }

    #[test]
    fn test_fits_within_rejects_overflowing_extent() {
        assert!(!CropDescriptor::new(i64::MAX, 0, 1, 1).fits_within(10, 10));
        assert!(!CropDescriptor::new(0, 1, 1, i64::MAX).fits_within(10, 10));
        assert!(!CropDescriptor::new(0, 0, i64::MAX, i64::MAX).fits_within(u32::MAX, u32::MAX));
    }

    #[test]
    fn test_clamp_extreme_values() {
        let region = CropDescriptor::new(i64::MAX, i64::MIN, i64::MAX, i64::MIN)
            .clamp_to(100, 50)
            .unwrap();
        assert_eq!(
            region,
            PixelRegion {
                x: 99,
                y: 0,
                width: 1,
                height: 1
            }
        );
        assert!(region.to_descriptor().fits_within(100, 50));
    }

    #[test]
    fn test_clamp_in_bounds_is_identity() {
        let d = CropDescriptor::new(20, 30, 40, 50);
        let region = d.clamp_to(100, 100).unwrap();
        assert_eq!(region.to_descriptor(), d);
    }

    #[test]
    fn test_clamp_shrinks_overflowing_size() {
        let region = CropDescriptor::new(700, 500, 400, 400)
            .clamp_to(1000, 800)
            .unwrap();
        assert_eq!(
            region,
            PixelRegion {
                x: 700,
                y: 500,
                width: 300,
                height: 300
            }
        );
    }

    #[test]
    fn test_clamp_negative_origin() {
        let region = CropDescriptor::new(-50, -10, 100, 100)
            .clamp_to(80, 60)
            .unwrap();
        assert_eq!(region.x, 0);
        assert_eq!(region.y, 0);
        assert_eq!(region.width, 80);
        assert_eq!(region.height, 60);
    }

    #[test]
    fn test_clamp_origin_past_edge() {
        let region = CropDescriptor::new(500, 500, 10, 10).clamp_to(100, 100).unwrap();
        assert_eq!(region.x, 99);
        assert_eq!(region.y, 99);
        assert_eq!(region.width, 1);
        assert_eq!(region.height, 1);
    }

    #[test]
    fn test_clamp_degenerate_size() {
        let region = CropDescriptor::new(5, 5, 0, -3).clamp_to(10, 10).unwrap();
        assert_eq!(region.width, 1);
        assert_eq!(region.height, 1);
    }

    #[test]
    fn test_clamp_empty_source() {
        assert!(CropDescriptor::new(0, 0, 1, 1).clamp_to(0, 10).is_none());
    }

    #[test]
    fn test_full_descriptor() {
        let d = CropDescriptor::full(1000, 800);
        assert!(d.fits_within(1000, 800));
        assert_eq!(d.clamp_to(1000, 800), Some(PixelRegion::full(1000, 800)));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
