//! Tabular export of crawl results.
//!
//! Each run produces a CSV and a styled XLSX with a fixed column order.
//! Existing outputs are rotated to timestamped backups rather than clobbered;
//! periodic `temp_` snapshots are overwritten in place and removed once the
//! final export lands.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Local;
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook};
use tracing::{debug, info};

use crate::models::ProductRecord;

/// Export columns, in order.
pub const COLUMNS: [&str; 9] = [
    "CanonicalName",
    "RawName",
    "SourceLink",
    "OriginalImageUrl",
    "ServedImageUrl",
    "SavedFilename",
    "DownloadStatus",
    "PageNumber",
    "ScrapedAt",
];

/// Column widths for the XLSX sheet, matching column order.
const COLUMN_WIDTHS: [f64; 9] = [25.0, 60.0, 60.0, 70.0, 70.0, 20.0, 20.0, 12.0, 20.0];

/// Header fill color for the XLSX sheet.
const HEADER_FILL: u32 = 0x366092;

/// Prefix for periodic snapshot files.
const SNAPSHOT_PREFIX: &str = "temp_";

fn record_row(record: &ProductRecord) -> [String; 9] {
    [
        record.canonical_name.clone(),
        record.raw_name.clone(),
        record.source_link.clone(),
        record
            .original_image_url
            .clone()
            .unwrap_or_else(|| "not found".to_string()),
        record
            .served_image_url
            .clone()
            .unwrap_or_else(|| "unavailable".to_string()),
        record
            .saved_filename
            .clone()
            .unwrap_or_else(|| "not downloaded".to_string()),
        record.download_status.label(),
        record.page_number.to_string(),
        record.scraped_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    ]
}

/// Write records as CSV.
pub fn write_csv(records: &[ProductRecord], path: &Path) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(COLUMNS)?;
    for record in records {
        writer.write_record(record_row(record))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write records as XLSX with column widths and a styled header row.
pub fn write_xlsx(records: &[ProductRecord], path: &Path) -> anyhow::Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    let header_format = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_align(FormatAlign::Center);

    for (col, (name, width)) in COLUMNS.iter().zip(COLUMN_WIDTHS).enumerate() {
        worksheet.set_column_width(col as u16, width)?;
        worksheet.write_string_with_format(0, col as u16, *name, &header_format)?;
    }

    for (row, record) in records.iter().enumerate() {
        for (col, value) in record_row(record).iter().enumerate() {
            worksheet.write_string((row + 1) as u32, col as u16, value)?;
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("saving {}", path.display()))?;
    Ok(())
}

/// Move an existing file out of the way as `<stem>_backup_<timestamp>.<ext>`.
pub fn rotate_existing(path: &Path) -> anyhow::Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("export");
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("bak");
    let backup = path.with_file_name(format!(
        "{}_backup_{}.{}",
        stem,
        Local::now().format("%Y%m%d_%H%M%S"),
        ext
    ));
    std::fs::rename(path, &backup)
        .with_context(|| format!("rotating {}", path.display()))?;
    info!("Existing file backed up as: {}", backup.display());
    Ok(Some(backup))
}

/// Final export: rotate any previous outputs, then write both formats.
pub fn export_final(
    records: &[ProductRecord],
    output_folder: &Path,
    base_name: &str,
) -> anyhow::Result<()> {
    let csv_path = output_folder.join(format!("{}.csv", base_name));
    let xlsx_path = output_folder.join(format!("{}.xlsx", base_name));

    rotate_existing(&csv_path)?;
    rotate_existing(&xlsx_path)?;

    write_csv(records, &csv_path)?;
    info!("CSV saved to: {}", csv_path.display());
    write_xlsx(records, &xlsx_path)?;
    info!("XLSX saved to: {}", xlsx_path.display());
    Ok(())
}

/// Crash-resilience snapshot, overwritten in place.
pub fn write_snapshot(
    records: &[ProductRecord],
    output_folder: &Path,
    base_name: &str,
) -> anyhow::Result<()> {
    let csv_path = output_folder.join(format!("{}{}.csv", SNAPSHOT_PREFIX, base_name));
    let xlsx_path = output_folder.join(format!("{}{}.xlsx", SNAPSHOT_PREFIX, base_name));
    write_csv(records, &csv_path)?;
    write_xlsx(records, &xlsx_path)?;
    debug!("Progress snapshot saved ({} rows)", records.len());
    Ok(())
}

/// Remove snapshot files after a clean final export.
pub fn remove_snapshots(output_folder: &Path, base_name: &str) {
    for ext in ["csv", "xlsx"] {
        let path = output_folder.join(format!("{}{}.{}", SNAPSHOT_PREFIX, base_name, ext));
        if path.exists() && std::fs::remove_file(&path).is_ok() {
            debug!("Cleaned up {}", path.display());
        }
    }
}
