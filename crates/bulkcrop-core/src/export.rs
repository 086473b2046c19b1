//! Batch export: reconstruct every image and package the results in a zip.
//!
//! Images are processed sequentially in collection order. A failure to
//! reconstruct one image is recorded and the batch continues; a failure to
//! write or deliver the archive aborts the export and discards the archive.
//!
//! The collection is borrowed for the whole export, so it cannot change
//! underneath the loop.

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, debug_span, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::collection::{ImageCollection, ImageId};
use crate::encode::DEFAULT_QUALITY;
use crate::reconstruct::{reconstruct, ReconstructError};

/// How entries are stored in the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    Deflated,
    Stored,
}

impl Compression {
    fn method(self) -> CompressionMethod {
        match self {
            Compression::Deflated => CompressionMethod::Deflated,
            Compression::Stored => CompressionMethod::Stored,
        }
    }
}

/// Export settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// JPEG quality for cropped images (1-100).
    pub quality: u8,
    /// Prefix prepended to each original file name.
    pub entry_prefix: String,
    /// File name the archive is delivered under.
    pub archive_name: String,
    pub compression: Compression,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            entry_prefix: "cropped_".to_string(),
            archive_name: "cropped_images.zip".to_string(),
            compression: Compression::Deflated,
        }
    }
}

impl ExportOptions {
    /// Archive entry name for an original file name.
    pub fn entry_name(&self, file_name: &str) -> String {
        format!("{}{}", self.entry_prefix, file_name)
    }
}

/// Errors that abort a whole export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Writing the zip failed. No archive is produced.
    #[error("Failed to write archive: {0}")]
    ArchiveWrite(String),

    /// The finished archive could not be handed to the save/download channel.
    #[error("Failed to deliver archive '{name}': {reason}")]
    Delivery { name: String, reason: String },

    /// The export was cancelled. No archive is produced.
    #[error("Export cancelled after {processed} of {total} images")]
    Cancelled { processed: usize, total: usize },
}

impl From<zip::result::ZipError> for ExportError {
    fn from(e: zip::result::ZipError) -> Self {
        ExportError::ArchiveWrite(e.to_string())
    }
}

impl From<std::io::Error> for ExportError {
    fn from(e: std::io::Error) -> Self {
        ExportError::ArchiveWrite(e.to_string())
    }
}

/// Cooperative cancellation flag, checked between images.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// An image left out of the archive.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryFailure {
    pub id: ImageId,
    pub file_name: String,
    pub error: ReconstructError,
}

/// Overall result of a non-empty export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStatus {
    /// Every image was written.
    Complete,
    /// Some images failed and were left out.
    Partial,
    /// Every image failed; the archive is empty.
    AllFailed,
}

/// A finished archive and what went into it.
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub archive_name: String,
    pub archive: Vec<u8>,
    /// Entry names in archive order.
    pub entries: Vec<String>,
    pub failures: Vec<EntryFailure>,
}

impl ExportReport {
    pub fn status(&self) -> ExportStatus {
        match (self.entries.is_empty(), self.failures.is_empty()) {
            (_, true) => ExportStatus::Complete,
            (true, false) => ExportStatus::AllFailed,
            (false, false) => ExportStatus::Partial,
        }
    }

    /// A one-line message suitable for a user notification.
    pub fn summary(&self) -> String {
        match self.status() {
            ExportStatus::Complete => format!("Exported {} images", self.entries.len()),
            ExportStatus::Partial => format!(
                "Exported {} images, {} failed",
                self.entries.len(),
                self.failures.len()
            ),
            ExportStatus::AllFailed => {
                format!("All {} images failed to export", self.failures.len())
            }
        }
    }
}

/// Result of an export that did not abort.
#[derive(Debug, Clone)]
pub enum ExportOutcome {
    /// There were no images; nothing was produced.
    Empty,
    Exported(ExportReport),
}

/// The save/download side channel.
pub trait ArchiveSink {
    fn deliver(&mut self, name: &str, bytes: &[u8]) -> std::io::Result<()>;
}

/// Keeps delivered archives in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub delivered: Vec<(String, Vec<u8>)>,
}

impl ArchiveSink for MemorySink {
    fn deliver(&mut self, name: &str, bytes: &[u8]) -> std::io::Result<()> {
        self.delivered.push((name.to_string(), bytes.to_vec()));
        Ok(())
    }
}

/// Writes delivered archives into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArchiveSink for DirectorySink {
    fn deliver(&mut self, name: &str, bytes: &[u8]) -> std::io::Result<()> {
        std::fs::write(self.dir.join(name), bytes)
    }
}

/// Reconstruct every image and build the archive in memory.
///
/// # Errors
///
/// Returns `ExportError::Cancelled` if `cancel` fires before the last image,
/// and `ExportError::ArchiveWrite` if the zip cannot be written. Per-image
/// failures are reported in the [`ExportReport`], not as errors.
pub fn build_archive(
    images: &ImageCollection,
    options: &ExportOptions,
    cancel: Option<&CancelToken>,
) -> Result<ExportOutcome, ExportError> {
    let total = images.len();
    if total == 0 {
        info!("export requested with no images");
        return Ok(ExportOutcome::Empty);
    }

    let span = debug_span!("export", images = total);
    let _guard = span.enter();

    let mut outputs = ArchiveEntries::default();
    let mut failures = Vec::new();

    for (processed, entity) in images.iter().enumerate() {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            warn!(processed, total, "export cancelled");
            return Err(ExportError::Cancelled { processed, total });
        }

        match reconstruct(entity, options.quality) {
            Ok(output) => {
                debug!(id = %entity.id(), file = entity.file_name(), "reconstructed");
                outputs.insert(options.entry_name(entity.file_name()), output.into_bytes());
            }
            Err(error) => {
                warn!(id = %entity.id(), file = entity.file_name(), %error, "skipping image");
                failures.push(EntryFailure {
                    id: entity.id(),
                    file_name: entity.file_name().to_string(),
                    error,
                });
            }
        }
    }

    let entries = outputs.names();
    let archive = outputs.write_zip(options.compression)?;

    info!(
        written = entries.len(),
        failed = failures.len(),
        bytes = archive.len(),
        "archive finished"
    );

    Ok(ExportOutcome::Exported(ExportReport {
        archive_name: options.archive_name.clone(),
        archive,
        entries,
        failures,
    }))
}

/// Build the archive and hand it to `sink`.
///
/// Nothing is delivered for an empty collection. An archive in which every
/// image failed is still delivered; check [`ExportReport::status`].
pub fn export<S: ArchiveSink + ?Sized>(
    images: &ImageCollection,
    options: &ExportOptions,
    cancel: Option<&CancelToken>,
    sink: &mut S,
) -> Result<ExportOutcome, ExportError> {
    let outcome = build_archive(images, options, cancel)?;

    if let ExportOutcome::Exported(report) = &outcome {
        sink.deliver(&report.archive_name, &report.archive)
            .map_err(|e| ExportError::Delivery {
                name: report.archive_name.clone(),
                reason: e.to_string(),
            })?;
    }
    Ok(outcome)
}

/// Archive entries in first-insertion order; a repeated name keeps the
/// position of its first insertion and the bytes of its last.
#[derive(Debug, Default)]
struct ArchiveEntries {
    entries: Vec<(String, Vec<u8>)>,
    index: HashMap<String, usize>,
}

impl ArchiveEntries {
    fn insert(&mut self, name: String, bytes: Vec<u8>) {
        match self.index.get(&name) {
            Some(&i) => {
                warn!(name = %name, "duplicate entry name, replacing earlier entry");
                self.entries[i].1 = bytes;
            }
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, bytes));
            }
        }
    }

    fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    fn write_zip(self, compression: Compression) -> Result<Vec<u8>, ExportError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let file_options = SimpleFileOptions::default().compression_method(compression.method());

        for (name, bytes) in self.entries {
            writer.start_file(name, file_options)?;
            writer.write_all(&bytes)?;
        }

        Ok(writer.finish()?.into_inner())
    }
}
