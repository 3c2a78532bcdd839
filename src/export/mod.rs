//! CSV export of the night's signups
//!
//! Every field is quoted and embedded quotes are doubled, so names with
//! commas or quotes survive a spreadsheet import.

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;
use std::path::Path;

use crate::models::SignupRecord;
use crate::utils::quote_csv_field;

/// Header row of the export
pub const CSV_HEADER: [&str; 3] = ["Name", "Category", "Signed Up (local)"];

/// Rendered export ready to be written or downloaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvExport {
    /// Suggested file name
    pub filename: String,
    pub content: String,
    pub rows: usize,
}

impl CsvExport {
    /// Write the export into `dir` under its suggested name
    pub async fn write_to_dir(&self, dir: impl AsRef<Path>) -> std::io::Result<std::path::PathBuf> {
        let path = dir.as_ref().join(&self.filename);
        tokio::fs::write(&path, &self.content).await?;
        Ok(path)
    }
}

/// Render records (already in signup order) as CSV, times in `zone`
pub fn signups_csv(records: &[SignupRecord], zone: Tz) -> String {
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(
        CSV_HEADER
            .iter()
            .map(|h| quote_csv_field(h))
            .collect::<Vec<_>>()
            .join(","),
    );

    for record in records {
        let local = record
            .signed_up_at
            .with_timezone(&zone)
            .format("%Y-%m-%d %H:%M")
            .to_string();
        let row = [record.name.as_str(), record.category.label(), local.as_str()];
        lines.push(
            row.iter()
                .map(|v| quote_csv_field(v))
                .collect::<Vec<_>>()
                .join(","),
        );
    }

    lines.join("\n")
}

/// File name such as `open-decks-signups-20250905-2330.csv`
pub fn export_filename(now: &DateTime<Tz>) -> String {
    format!("open-decks-signups-{}.csv", now.format("%Y%m%d-%H%M"))
}

/// Build the full export
pub fn build_export(records: &[SignupRecord], now: &DateTime<Tz>) -> CsvExport {
    CsvExport {
        filename: export_filename(now),
        content: signups_csv(records, now.timezone()),
        rows: records.len(),
    }
}
