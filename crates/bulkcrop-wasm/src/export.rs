//! Export results handed back to the page.
//!
//! `status` is one of `"empty"`, `"complete"`, `"partial"` or `"all_failed"`.
//! The page offers `archive` for download unless the status is `"empty"` and
//! shows `summary` either way.

use bulkcrop_core::{ExportOutcome, ExportStatus};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// An image left out of the archive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct FailedImage {
    pub id: String,
    pub file_name: String,
    pub reason: String,
}

#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct JsExportResult {
    status: &'static str,
    summary: String,
    archive_name: String,
    archive: Vec<u8>,
    failures: Vec<FailedImage>,
}

#[wasm_bindgen]
impl JsExportResult {
    #[wasm_bindgen(getter)]
    pub fn status(&self) -> String {
        self.status.to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn summary(&self) -> String {
        self.summary.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn archive_name(&self) -> String {
        self.archive_name.clone()
    }

    /// Zip bytes. Empty when nothing was exported.
    pub fn archive(&self) -> Vec<u8> {
        self.archive.clone()
    }

    /// `[{ id, file_name, reason }]` for every image left out.
    pub fn failures(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.failures)
            .map_err(|e| JsValue::from_str(&format!("Cannot convert failures: {e}")))
    }
}

impl JsExportResult {
    pub(crate) fn from_outcome(outcome: ExportOutcome, archive_name: &str) -> Self {
        let report = match outcome {
            ExportOutcome::Empty => {
                return Self {
                    status: "empty",
                    summary: "No images to export".to_string(),
                    archive_name: archive_name.to_string(),
                    archive: Vec::new(),
                    failures: Vec::new(),
                }
            }
            ExportOutcome::Exported(report) => report,
        };

        let status = match report.status() {
            ExportStatus::Complete => "complete",
            ExportStatus::Partial => "partial",
            ExportStatus::AllFailed => "all_failed",
        };
        let failures = report
            .failures
            .iter()
            .map(|f| FailedImage {
                id: f.id.to_string(),
                file_name: f.file_name.clone(),
                reason: f.error.to_string(),
            })
            .collect();

        Self {
            status,
            summary: report.summary(),
            archive_name: report.archive_name,
            archive: report.archive,
            failures,
        }
    }

    pub(crate) fn failed_images(&self) -> &[FailedImage] {
        &self.failures
    }
}
