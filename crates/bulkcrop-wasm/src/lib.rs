//! BulkCrop WASM - WebAssembly bindings for BulkCrop
//!
//! This crate exposes bulkcrop-core to the browser page that hosts the crop
//! widget.
//!
//! # Module Structure
//!
//! - `aspect` - Ratio selector resolution
//! - `cropper` - The page's cropperjs instance as a `CropWidget`
//! - `export` - Export results with status and per-image failures
//! - `transform` - Single-image crop, reconstruction and thumbnails
//! - `types` - WASM-compatible wrapper types
//! - `workspace` - Images, the editing session and zip export
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsWorkspace } from '@bulkcrop/wasm';
//!
//! await init();
//!
//! const ws = new JsWorkspace();
//! const id = ws.add(file.name, file.type, bytes);
//! ws.set_aspect_ratio("16/9", "landscape", cropper);
//! ```

use wasm_bindgen::prelude::*;

mod aspect;
mod cropper;
mod export;
mod transform;
mod types;
mod workspace;

pub use aspect::{aspect_ratio_presets, resolve_aspect_ratio};
pub use cropper::Cropper;
pub use export::JsExportResult;
pub use transform::{apply_crop, generate_thumbnail, reconstruct_image};
pub use types::{JsCropDescriptor, JsDecodedImage};
pub use workspace::JsWorkspace;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
