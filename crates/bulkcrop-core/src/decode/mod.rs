//! Image decoding for BulkCrop.
//!
//! This module provides functionality for:
//! - Decoding ingested JPEG, PNG and WEBP files into RGB surfaces
//! - Applying EXIF orientation so pixels match what a browser displays
//! - Rendering small previews of a crop for the image grid
//!
//! All operations are synchronous and single-threaded.
//!
//! # Examples
//!
//! ```ignore
//! use bulkcrop_core::decode::decode_image;
//!
//! let bytes = std::fs::read("photo.jpg").unwrap();
//! let image = decode_image(&bytes).unwrap();
//! println!("Decoded {}x{} image", image.width, image.height);
//! ```

mod preview;
mod source;
mod types;

pub use preview::{render_thumbnail, PreviewOptions};
pub use source::decode_image;
pub use types::{DecodeError, DecodedImage};
