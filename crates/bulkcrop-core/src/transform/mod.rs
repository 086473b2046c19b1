//! Pixel transforms used by the export path.
//!
//! Only axis-aligned cropping exists. Rotation and flipping are not supported
//! in either the interactive or the batch path.

mod crop;

pub use crop::{apply_crop, crop_region};
