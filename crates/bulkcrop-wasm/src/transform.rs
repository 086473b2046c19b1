//! WASM bindings for single-image crop operations.
//!
//! Useful for previewing one export result without building an archive.

use crate::types::{JsCropDescriptor, JsDecodedImage};
use bulkcrop_core::decode::render_thumbnail;
use bulkcrop_core::reconstruct_bytes;
use bulkcrop_core::transform::apply_crop as core_crop;
use wasm_bindgen::prelude::*;

/// Crop a decoded image to a pixel rectangle.
///
/// The rectangle is clamped into the image first. Returns `undefined` if
/// nothing of it remains.
#[wasm_bindgen]
pub fn apply_crop(image: &JsDecodedImage, crop: &JsCropDescriptor) -> Option<JsDecodedImage> {
    let src = image.to_decoded();
    core_crop(&src, &(*crop).into()).map(JsDecodedImage::from_decoded)
}

/// Rebuild one export output from original file bytes.
///
/// Without a crop the original bytes come back unchanged. With one, the region
/// is cut from the decoded image and encoded as JPEG at `quality`.
///
/// ```typescript
/// const crop = new JsCropDescriptor(600, 80, 400, 400);
/// const jpeg = reconstruct_image(bytes, crop, 95);
/// ```
#[wasm_bindgen]
pub fn reconstruct_image(
    bytes: &[u8],
    crop: Option<JsCropDescriptor>,
    quality: u8,
) -> Result<Vec<u8>, JsValue> {
    let descriptor = crop.map(Into::into);
    reconstruct_bytes(bytes, descriptor.as_ref(), quality)
        .map(|r| r.into_bytes())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Scale an image down so its longest edge is at most `max_edge`.
#[wasm_bindgen]
pub fn generate_thumbnail(
    image: &JsDecodedImage,
    max_edge: u32,
) -> Result<JsDecodedImage, JsValue> {
    let src = image.to_decoded();
    render_thumbnail(&src, max_edge)
        .map(JsDecodedImage::from_decoded)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
