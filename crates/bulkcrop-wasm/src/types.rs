//! WASM-compatible wrapper types.
//!
//! This module provides JavaScript-friendly types that wrap the core BulkCrop
//! types, handling the conversion between Rust and JavaScript representations.

use bulkcrop_core::decode::DecodedImage;
use bulkcrop_core::CropDescriptor;
use wasm_bindgen::prelude::*;

/// A decoded image wrapper for JavaScript.
///
/// Used for grid thumbnails and crop previews. The pixel data lives in WASM
/// memory; `pixels()` copies it out as a `Uint8Array`.
#[wasm_bindgen]
pub struct JsDecodedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsDecodedImage {
    /// Create a new JsDecodedImage from dimensions and RGB pixel data.
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> JsDecodedImage {
        JsDecodedImage {
            width,
            height,
            pixels,
        }
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of bytes in the pixel buffer (width * height * 3).
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns RGB pixel data as Uint8Array. This copies the buffer.
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }

    /// Returns RGBA pixel data, ready for `new ImageData(...)`.
    pub fn rgba_pixels(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() / 3 * 4);
        for rgb in self.pixels.chunks_exact(3) {
            out.extend_from_slice(rgb);
            out.push(255);
        }
        out
    }
}

impl JsDecodedImage {
    pub(crate) fn from_decoded(img: DecodedImage) -> Self {
        Self {
            width: img.width,
            height: img.height,
            pixels: img.pixels,
        }
    }

    /// Convert back to a core DecodedImage. Clones the pixel data.
    pub(crate) fn to_decoded(&self) -> DecodedImage {
        DecodedImage {
            width: self.width,
            height: self.height,
            pixels: self.pixels.clone(),
        }
    }
}

/// A saved crop rectangle in natural image pixels.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JsCropDescriptor {
    inner: CropDescriptor,
}

#[wasm_bindgen]
impl JsCropDescriptor {
    #[wasm_bindgen(constructor)]
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> JsCropDescriptor {
        JsCropDescriptor {
            inner: CropDescriptor::new(x.into(), y.into(), width.into(), height.into()),
        }
    }

    #[wasm_bindgen(getter)]
    pub fn x(&self) -> f64 {
        self.inner.x as f64
    }

    #[wasm_bindgen(getter)]
    pub fn y(&self) -> f64 {
        self.inner.y as f64
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> f64 {
        self.inner.width as f64
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> f64 {
        self.inner.height as f64
    }

    /// Whether the rectangle lies fully inside a `width` x `height` image.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.inner.fits_within(width, height)
    }
}

impl From<CropDescriptor> for JsCropDescriptor {
    fn from(inner: CropDescriptor) -> Self {
        Self { inner }
    }
}

impl From<JsCropDescriptor> for CropDescriptor {
    fn from(js: JsCropDescriptor) -> Self {
        js.inner
    }
}
