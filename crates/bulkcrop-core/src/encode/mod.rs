//! Image encoding for export.
//!
//! Exported crops are always JPEG. See [`encode_jpeg`].

mod jpeg;

pub use jpeg::{encode_jpeg, EncodeError, DEFAULT_QUALITY};
