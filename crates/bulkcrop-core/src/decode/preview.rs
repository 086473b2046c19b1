//! Thumbnail rendering for grid previews.
//!
//! Previews are a display cache only. The export path never reads them.

use serde::{Deserialize, Serialize};

use super::{DecodeError, DecodedImage};

/// Options for preview thumbnails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewOptions {
    /// Longest edge of the rendered thumbnail in pixels.
    pub max_edge: u32,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self { max_edge: 300 }
    }
}

/// Scale an image so its longest edge is at most `max_edge`, preserving aspect ratio.
///
/// Images that already fit are returned unchanged. Uses bilinear filtering.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` for a zero `max_edge` and
/// `DecodeError::EmptyImage` for an empty source.
pub fn render_thumbnail(image: &DecodedImage, max_edge: u32) -> Result<DecodedImage, DecodeError> {
    if max_edge == 0 {
        return Err(DecodeError::InvalidFormat);
    }
    if image.is_empty() {
        return Err(DecodeError::EmptyImage {
            width: image.width,
            height: image.height,
        });
    }

    if image.width <= max_edge && image.height <= max_edge {
        return Ok(image.clone());
    }

    let (width, height) = fit_dimensions(image.width, image.height, max_edge);
    let view = image
        .as_rgb_view()
        .ok_or_else(|| DecodeError::CorruptedFile("Pixel buffer size mismatch".to_string()))?;

    let resized =
        image::imageops::resize(&view, width, height, image::imageops::FilterType::Triangle);
    Ok(DecodedImage::from_rgb_image(resized))
}

/// Dimensions fitting within `max_edge` along the longest side.
fn fit_dimensions(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    let ratio = width as f64 / height as f64;

    if width >= height {
        let new_height = (max_edge as f64 / ratio).round() as u32;
        (max_edge, new_height.max(1))
    } else {
        let new_width = (max_edge as f64 * ratio).round() as u32;
        (new_width.max(1), max_edge)
    }
}
