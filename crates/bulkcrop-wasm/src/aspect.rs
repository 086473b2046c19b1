//! Aspect ratio bindings.
//!
//! The ratio selector and the orientation toggle hand their raw string values
//! over; the resolved number goes to the crop widget's `setAspectRatio`.

use bulkcrop_core::aspect::{AspectRatioParseError, AspectRatioSpec, Orientation, PRESETS};
use wasm_bindgen::prelude::*;

/// Resolve a selector value (`"free"` or `"W/H"`) and an orientation
/// (`"portrait"` or `"landscape"`) to a `width / height` ratio.
///
/// Returns `undefined` for freeform.
///
/// ```typescript
/// resolve_aspect_ratio("16/9", "portrait");  // 0.5625
/// resolve_aspect_ratio("free", "landscape"); // undefined
/// ```
#[wasm_bindgen]
pub fn resolve_aspect_ratio(ratio: &str, orientation: &str) -> Result<Option<f64>, JsValue> {
    resolve_selection(ratio, orientation).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Selector values of the built-in presets, in display order.
#[wasm_bindgen]
pub fn aspect_ratio_presets() -> js_sys::Array {
    preset_values().into_iter().map(JsValue::from).collect()
}

pub(crate) fn parse_selection(
    ratio: &str,
    orientation: &str,
) -> Result<AspectRatioSpec, AspectRatioParseError> {
    let orientation: Orientation = orientation.parse()?;
    AspectRatioSpec::parse(ratio, orientation)
}

pub(crate) fn resolve_selection(
    ratio: &str,
    orientation: &str,
) -> Result<Option<f64>, AspectRatioParseError> {
    Ok(parse_selection(ratio, orientation)?.resolve().value())
}

pub(crate) fn preset_values() -> Vec<&'static str> {
    PRESETS.iter().map(|(value, _)| *value).collect()
}
