//! Decoding of ingested source files (JPEG, PNG, WEBP).
//!
//! The format is sniffed from the bytes, not from the file name or MIME type.
//! EXIF orientation is applied while decoding, so decoded pixels are laid out
//! the way a browser displays the file. Crop coordinates captured from the
//! widget and reconstruction both live in that oriented grid.

use std::io::Cursor;

use image::{DynamicImage, ImageDecoder, ImageReader};

use super::{DecodeError, DecodedImage};

/// Decode image bytes into an RGB surface with EXIF orientation applied.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` for empty or unrecognized bytes,
/// `DecodeError::CorruptedFile` when the decoder rejects the data and
/// `DecodeError::EmptyImage` for zero-sized images.
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::InvalidFormat);
    }

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    let mut decoder = reader
        .into_decoder()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    // Missing or unreadable EXIF means the file is shown as stored.
    let orientation = decoder
        .orientation()
        .unwrap_or(image::metadata::Orientation::NoTransforms);

    let mut img = DynamicImage::from_decoder(decoder)
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;
    img.apply_orientation(orientation);

    let decoded = DecodedImage::from_rgb_image(img.into_rgb8());
    if decoded.is_empty() {
        return Err(DecodeError::EmptyImage {
            width: decoded.width,
            height: decoded.height,
        });
    }
    Ok(decoded)
}
