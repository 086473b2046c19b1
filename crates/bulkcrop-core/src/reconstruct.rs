//! Headless reconstruction of a saved crop.
//!
//! Given an image's original bytes and its saved [`CropDescriptor`], produce
//! the same pixels the editor showed, without the editor:
//!
//! 1. No descriptor: the original bytes are returned untouched.
//! 2. Otherwise decode, clamp the descriptor to the decoded size, copy the
//!    region unscaled, and encode as JPEG.

use thiserror::Error;

use crate::collection::ImageEntity;
use crate::decode::{decode_image, DecodeError};
use crate::descriptor::{CropDescriptor, PixelRegion};
use crate::encode::{encode_jpeg, EncodeError};
use crate::transform::crop_region;

/// Failure to reconstruct one image. Never aborts a batch on its own.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReconstructError {
    #[error("Failed to decode source image: {0}")]
    Decode(#[from] DecodeError),

    #[error("Failed to encode cropped image: {0}")]
    Encode(#[from] EncodeError),
}

/// Output of [`reconstruct`].
#[derive(Debug, Clone, PartialEq)]
pub enum Reconstruction {
    /// No crop was saved; these are the original bytes.
    Original(Vec<u8>),
    /// JPEG bytes of the cropped region.
    Cropped {
        bytes: Vec<u8>,
        /// The region actually copied, after clamping.
        region: PixelRegion,
    },
}

impl Reconstruction {
    pub fn bytes(&self) -> &[u8] {
        match self {
            Reconstruction::Original(bytes) => bytes,
            Reconstruction::Cropped { bytes, .. } => bytes,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Reconstruction::Original(bytes) => bytes,
            Reconstruction::Cropped { bytes, .. } => bytes,
        }
    }
}

/// Reconstruct an entity's export output. Never reads the entity's preview.
pub fn reconstruct(entity: &ImageEntity, quality: u8) -> Result<Reconstruction, ReconstructError> {
    reconstruct_bytes(entity.source_bytes(), entity.crop(), quality)
}

/// Reconstruct from raw source bytes and an optional descriptor.
pub fn reconstruct_bytes(
    source: &[u8],
    crop: Option<&CropDescriptor>,
    quality: u8,
) -> Result<Reconstruction, ReconstructError> {
    let Some(descriptor) = crop else {
        return Ok(Reconstruction::Original(source.to_vec()));
    };

    let image = decode_image(source)?;
    let region = descriptor
        .clamp_to(image.width, image.height)
        .ok_or(DecodeError::EmptyImage {
            width: image.width,
            height: image.height,
        })?;

    let cropped = crop_region(&image, region);
    let bytes = encode_jpeg(&cropped, quality)?;
    Ok(Reconstruction::Cropped { bytes, region })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{ImageCollection, SavedCrop, SourceFile};
    use crate::decode::fixtures::rotated_jpeg;
    use crate::decode::DecodedImage;
    use crate::encode::DEFAULT_QUALITY;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 90])
        });
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    /// Mean absolute per-channel difference between two same-size images.
    fn mean_abs_diff(a: &DecodedImage, b: &DecodedImage) -> f64 {
        assert_eq!((a.width, a.height), (b.width, b.height));
        let total: u64 = a
            .pixels
            .iter()
            .zip(&b.pixels)
            .map(|(x, y)| (*x as i16 - *y as i16).unsigned_abs() as u64)
            .sum();
        total as f64 / a.pixels.len() as f64
    }

    #[test]
    fn test_no_descriptor_is_byte_identical() {
        let source = png_bytes(20, 10);
        let result = reconstruct_bytes(&source, None, DEFAULT_QUALITY).unwrap();
        assert_eq!(result, Reconstruction::Original(source.clone()));
        assert_eq!(result.bytes(), source.as_slice());
    }

    #[test]
    fn test_no_descriptor_never_decodes() {
        // Undecodable bytes pass through unchanged when there is nothing to crop.
        let garbage = vec![0xde, 0xad, 0xbe, 0xef];
        let result = reconstruct_bytes(&garbage, None, DEFAULT_QUALITY).unwrap();
        assert_eq!(result.into_bytes(), garbage);
    }

    #[test]
    fn test_crop_dimensions() {
        let source = png_bytes(100, 80);
        let descriptor = CropDescriptor::new(10, 20, 40, 30);
        let result = reconstruct_bytes(&source, Some(&descriptor), DEFAULT_QUALITY).unwrap();

        let decoded = decode_image(result.bytes()).unwrap();
        assert_eq!((decoded.width, decoded.height), (40, 30));
        assert!(matches!(
            result,
            Reconstruction::Cropped {
                region: PixelRegion {
                    x: 10,
                    y: 20,
                    width: 40,
                    height: 30
                },
                ..
            }
        ));
    }

    #[test]
    fn test_out_of_bounds_descriptor_is_clamped() {
        let source = png_bytes(100, 80);
        let descriptor = CropDescriptor::new(90, -5, 50, 200);
        let result = reconstruct_bytes(&source, Some(&descriptor), DEFAULT_QUALITY).unwrap();

        let Reconstruction::Cropped { region, bytes } = result else {
            panic!("expected a cropped result");
        };
        assert_eq!(
            region,
            PixelRegion {
                x: 90,
                y: 0,
                width: 10,
                height: 80
            }
        );
        let decoded = decode_image(&bytes).unwrap();
        assert_eq!((decoded.width, decoded.height), (10, 80));
    }

    #[test]
    fn test_full_bounds_matches_source_within_encoding_loss() {
        let source = png_bytes(64, 48);
        let original = decode_image(&source).unwrap();
        let descriptor = CropDescriptor::full(64, 48);

        let result = reconstruct_bytes(&source, Some(&descriptor), DEFAULT_QUALITY).unwrap();
        let decoded = decode_image(result.bytes()).unwrap();

        assert!(mean_abs_diff(&original, &decoded) < 4.0);
    }

    #[test]
    fn test_descriptor_applies_to_displayed_orientation() {
        // Stored 400x200, displayed 200x400: the bottom square of the
        // displayed image is the stored right half (blue).
        let source = rotated_jpeg();
        let descriptor = CropDescriptor::new(0, 200, 200, 200);
        let result = reconstruct_bytes(&source, Some(&descriptor), DEFAULT_QUALITY).unwrap();

        let Reconstruction::Cropped { region, bytes } = result else {
            panic!("expected a cropped result");
        };
        assert_eq!(
            region,
            PixelRegion {
                x: 0,
                y: 200,
                width: 200,
                height: 200
            }
        );

        let decoded = decode_image(&bytes).unwrap();
        assert_eq!((decoded.width, decoded.height), (200, 200));
        let [r, _, b] = decoded.pixel(100, 100).unwrap();
        assert!(b > 200 && r < 60, "expected blue, got r={r} b={b}");
    }

    #[test]
    fn test_corrupt_source_with_descriptor_fails() {
        let descriptor = CropDescriptor::new(0, 0, 10, 10);
        let result = reconstruct_bytes(b"not an image", Some(&descriptor), DEFAULT_QUALITY);
        assert!(matches!(result, Err(ReconstructError::Decode(_))));
    }

    #[test]
    fn test_reconstruct_entity_uses_saved_crop() {
        let mut images = ImageCollection::new();
        let id = images.add(SourceFile::new("a.png", "image/png", png_bytes(50, 50)));
        images
            .save_crop(
                id,
                SavedCrop {
                    descriptor: CropDescriptor::new(5, 5, 20, 10),
                    // A preview that disagrees with the descriptor must be ignored.
                    preview: Some(DecodedImage::blank(1, 1)),
                },
            )
            .unwrap();

        let result = reconstruct(images.get(id).unwrap(), DEFAULT_QUALITY).unwrap();
        let decoded = decode_image(result.bytes()).unwrap();
        assert_eq!((decoded.width, decoded.height), (20, 10));
    }
}
