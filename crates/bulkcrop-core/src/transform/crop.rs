//! Axis-aligned region copy.
//!
//! Cropping here is a plain row-by-row copy: no scaling, no rotation, no color
//! transform. The output is exactly `region.width x region.height` and its
//! `(0, 0)` pixel is the source's `(region.x, region.y)` pixel.

use crate::decode::DecodedImage;
use crate::descriptor::{CropDescriptor, PixelRegion};

/// Copy a validated region out of `image`.
///
/// The region must lie inside the image (as produced by
/// [`CropDescriptor::clamp_to`]); a full-image region returns a clone.
pub fn crop_region(image: &DecodedImage, region: PixelRegion) -> DecodedImage {
    debug_assert!(region.right() <= image.width && region.bottom() <= image.height);

    if region == PixelRegion::full(image.width, image.height) {
        return image.clone();
    }

    let channels = DecodedImage::CHANNELS;
    let src_stride = image.stride();
    let row_len = region.width as usize * channels;
    let mut output = Vec::with_capacity(row_len * region.height as usize);

    for row in region.y..region.bottom() {
        let start = row as usize * src_stride + region.x as usize * channels;
        output.extend_from_slice(&image.pixels[start..start + row_len]);
    }

    DecodedImage::new(region.width, region.height, output)
}

/// Clamp a saved descriptor to `image` and copy the resulting region.
///
/// Out-of-range descriptors are clamped, never rejected. Returns `None` only
/// for an empty image.
pub fn apply_crop(image: &DecodedImage, descriptor: &CropDescriptor) -> Option<DecodedImage> {
    let region = descriptor.clamp_to(image.width, image.height)?;
    Some(crop_region(image, region))
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn create_test_image(width: u32, height: u32) -> DecodedImage {
        let pixels = (0..width * height)
            .flat_map(|i| {
                let v = (i % 256) as u8;
                [v, v.wrapping_add(1), v.wrapping_add(2)]
            })
            .collect();
        DecodedImage::new(width, height, pixels)
    }

    proptest! {
        /// Property: Output size equals the clamped region size.
        #[test]
        fn prop_output_matches_clamped_region(
            (width, height) in (1u32..=60, 1u32..=60),
            (x, y, w, h) in (-20i64..=80, -20i64..=80, -5i64..=80, -5i64..=80),
        ) {
            let img = create_test_image(width, height);
            let descriptor = CropDescriptor::new(x, y, w, h);
            let region = descriptor.clamp_to(width, height).unwrap();
            let result = apply_crop(&img, &descriptor).unwrap();

            prop_assert_eq!(result.width, region.width);
            prop_assert_eq!(result.height, region.height);
            prop_assert_eq!(result.pixels.len(), (region.width * region.height * 3) as usize);
        }

        /// Property: Every output pixel is the source pixel at the offset position.
        #[test]
        fn prop_pixels_copied_unchanged(
            (width, height) in (1u32..=40, 1u32..=40),
            (x, y, w, h) in (0i64..=40, 0i64..=40, 1i64..=40, 1i64..=40),
        ) {
            let img = create_test_image(width, height);
            let region = CropDescriptor::new(x, y, w, h).clamp_to(width, height).unwrap();
            let result = crop_region(&img, region);

            for cy in 0..result.height {
                for cx in 0..result.width {
                    prop_assert_eq!(
                        result.pixel(cx, cy),
                        img.pixel(region.x + cx, region.y + cy)
                    );
                }
            }
        }
    }
}
