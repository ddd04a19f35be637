//! Handing scan results to the save/export step.
//!
//! The receipts of a scan are what a later export step needs to find the links
//! again (for instance to fix up link encodings in a fixed-layout export).
//! [`ManifestSink`] writes them out as a JSON manifest.

use crate::annotate::AnnotationReceipt;
use crate::error::Result;
use crate::scan::ScanReport;
use indexmap::IndexMap;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Receives the report of a finished scan.
pub trait ExportSink {
    /// Consume one report.
    fn export(&mut self, report: &ScanReport) -> Result<()>;
}

#[derive(Serialize)]
struct Manifest<'a> {
    tool: &'static str,
    version: &'static str,
    run_id: String,
    generated_at: String,
    total_annotated: usize,
    per_region_counts: &'a IndexMap<String, usize>,
    receipts: &'a [AnnotationReceipt],
}

/// Writes a pretty-printed JSON manifest of the receipts.
#[derive(Debug, Clone)]
pub struct ManifestSink {
    path: PathBuf,
}

impl ManifestSink {
    /// Sink writing to `path` (overwritten on each export).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Output path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The manifest as a JSON string.
    pub fn render(report: &ScanReport) -> Result<String> {
        let manifest = Manifest {
            tool: crate::NAME,
            version: crate::VERSION,
            run_id: uuid::Uuid::new_v4().to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            total_annotated: report.total_annotated,
            per_region_counts: &report.per_region_counts,
            receipts: &report.receipts,
        };
        Ok(serde_json::to_string_pretty(&manifest)?)
    }
}

impl ExportSink for ManifestSink {
    fn export(&mut self, report: &ScanReport) -> Result<()> {
        let json = Self::render(report)?;
        std::fs::write(&self.path, json)?;
        log::info!(
            "Wrote manifest with {} receipt(s) to {}",
            report.receipts.len(),
            self.path.display()
        );
        Ok(())
    }
}
