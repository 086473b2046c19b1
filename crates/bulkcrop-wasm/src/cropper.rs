//! The page's crop widget, driven from Rust.
//!
//! The page passes its cropperjs instance (or any object with the same
//! methods) into the workspace calls that need a widget. Rectangles cross the
//! boundary as `{ x, y, width, height }` in natural image pixels, the shape
//! `getData()` and `setData()` already use.

use bulkcrop_core::decode::DecodedImage;
use bulkcrop_core::{AspectRatio, CropRect, CropWidget};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    /// A cropperjs instance.
    #[derive(Debug, Clone)]
    pub type Cropper;

    #[wasm_bindgen(method, js_name = getData)]
    fn get_data(this: &Cropper) -> JsValue;

    #[wasm_bindgen(method, js_name = setData)]
    fn set_data(this: &Cropper, data: JsValue);

    #[wasm_bindgen(method, js_name = reset)]
    fn reset_box(this: &Cropper);

    #[wasm_bindgen(method, js_name = setAspectRatio)]
    fn apply_aspect_ratio(this: &Cropper, ratio: f64);

    #[wasm_bindgen(method, js_name = getImageData)]
    fn get_image_data(this: &Cropper) -> JsValue;
}

/// The part of `getImageData()` the editor reads.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NaturalSize {
    natural_width: f64,
    natural_height: f64,
}

fn warn(message: &str) {
    web_sys::console::warn_1(&JsValue::from_str(message));
}

impl CropWidget for Cropper {
    fn image_size(&self) -> (u32, u32) {
        match serde_wasm_bindgen::from_value::<NaturalSize>(self.get_image_data()) {
            Ok(size) => (
                size.natural_width.round() as u32,
                size.natural_height.round() as u32,
            ),
            Err(e) => {
                warn(&format!("Unreadable cropper image data: {e}"));
                (0, 0)
            }
        }
    }

    fn rectangle(&self) -> CropRect {
        serde_wasm_bindgen::from_value(self.get_data()).unwrap_or_else(|e| {
            warn(&format!("Unreadable cropper data: {e}"));
            CropRect::default()
        })
    }

    fn set_rectangle(&mut self, rect: CropRect) {
        match serde_wasm_bindgen::to_value(&rect) {
            Ok(data) => self.set_data(data),
            Err(e) => warn(&format!("Cannot pass crop rectangle to cropper: {e}")),
        }
    }

    fn reset(&mut self) {
        self.reset_box();
    }

    fn set_aspect_ratio(&mut self, ratio: AspectRatio) {
        // cropperjs takes NaN for a free ratio.
        self.apply_aspect_ratio(ratio.value().unwrap_or(f64::NAN));
    }

    /// The page renders nothing for the core, so the workspace cuts the
    /// preview from the decoded image instead.
    fn render_preview(&self, _max_edge: u32) -> Option<DecodedImage> {
        None
    }
}
