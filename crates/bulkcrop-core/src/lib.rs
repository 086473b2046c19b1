//! BulkCrop Core - Batch image cropping library
//!
//! This crate holds everything behind the BulkCrop editor that is not UI:
//! aspect ratio resolution, crop descriptors, the two-way sync between the
//! numeric crop fields and the crop widget, the image collection with its
//! save-on-navigate editing sessions, and the batch export that rebuilds every
//! crop from the original bytes and packs the results into a zip archive.
//!
//! The interactive widget is abstracted behind [`widget::CropWidget`];
//! [`widget::HeadlessCropper`] implements it without a UI.

pub mod aspect;
pub mod collection;
pub mod decode;
pub mod descriptor;
pub mod encode;
pub mod export;
pub mod reconstruct;
pub mod session;
pub mod sync;
pub mod transform;
pub mod widget;

pub use aspect::{resolve, AspectRatio, AspectRatioMode, AspectRatioSpec, Orientation};
pub use collection::{ImageCollection, ImageEntity, ImageId, SavedCrop, SourceFile};
pub use descriptor::{CropDescriptor, CropRect, PixelRegion};
pub use export::{
    build_archive, export, ArchiveSink, CancelToken, ExportError, ExportOptions, ExportOutcome,
    ExportReport, ExportStatus,
};
pub use reconstruct::{reconstruct, reconstruct_bytes, ReconstructError, Reconstruction};
pub use session::{Navigation, SessionError, SessionState, Workspace};
pub use sync::{parse_field_input, CropFieldSynchronizer, CropFields, PushToken};
pub use transform::apply_crop;
pub use widget::{capture_rect, CropWidget, HeadlessCropper};
