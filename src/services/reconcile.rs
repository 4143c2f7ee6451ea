//! Post-run reconciliation.
//!
//! Rows declare their download outcome; the filesystem is the ground truth.
//! This step compares the two and reports drift. It observes and explains,
//! it never repairs.

use std::path::Path;

use tracing::{info, warn};

use crate::models::ProductRecord;
use crate::services::image::CANONICAL_EXT;

/// Outcome of comparing declared successes against files on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconciliationReport {
    /// Rows whose status says the download succeeded.
    pub declared_success: usize,
    /// Canonical-format files actually present in the images directory.
    pub actual_files: usize,
}

impl ReconciliationReport {
    /// Absolute difference between declared and observed.
    pub fn drift(&self) -> usize {
        self.declared_success.abs_diff(self.actual_files)
    }

    pub fn has_drift(&self) -> bool {
        self.drift() > 0
    }
}

/// Compare record statuses against the canonical files under `images_dir`.
///
/// A missing images directory counts as zero files, not an error; a run that
/// never downloaded anything has nothing on disk.
pub fn reconcile(records: &[ProductRecord], images_dir: &Path) -> std::io::Result<ReconciliationReport> {
    let declared_success = records
        .iter()
        .filter(|r| r.download_status.is_success())
        .count();

    let actual_files = match std::fs::read_dir(images_dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == CANONICAL_EXT)
                    .unwrap_or(false)
            })
            .count(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
        Err(e) => return Err(e),
    };

    Ok(ReconciliationReport {
        declared_success,
        actual_files,
    })
}

/// Log the report, enumerating plausible causes when drift is present.
pub fn log_report(report: &ReconciliationReport, total_rows: usize) {
    info!(
        "Declared successful downloads: {}/{}",
        report.declared_success, total_rows
    );
    info!(
        "Files actually present: {}/{}",
        report.actual_files, total_rows
    );

    if !report.has_drift() {
        info!("Reconciliation clean: declared and on-disk counts agree");
        return;
    }

    warn!(
        "Drift detected: {} declared successful, {} on disk ({} difference)",
        report.declared_success,
        report.actual_files,
        report.drift()
    );
    if report.actual_files < report.declared_success {
        warn!("Possible causes:");
        warn!("  - file save errors");
        warn!("  - permission problems");
        warn!("  - failed canonical conversions");
        warn!("  - corrupted files removed after the fact");
    }
}
