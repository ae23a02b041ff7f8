// src/config.rs

use std::ops::Range;

use anyhow::{Context, Result};
use url::Url;

/// Page the viewer rewrites after every state change.
pub const OUTPUT_PAGE: &str = "viewer.html";

const SPREADSHEET_ID: &str = "1kpyTPIGCLtkDHS_964d9LWrrqlLV9vqpT9DfEU442CA";
const SHEET_GID: &str = "1695733723";
const EXPORT_BASE: &str = "https://docs.google.com/spreadsheets/d/";

/// Published spreadsheet tab to pull the CSV export from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSource {
    /// Everything before the spreadsheet id, with a trailing slash.
    pub base_url: String,
    pub spreadsheet_id: String,
    pub gid: String,
}

impl Default for SheetSource {
    fn default() -> Self {
        Self {
            base_url: EXPORT_BASE.to_string(),
            spreadsheet_id: SPREADSHEET_ID.to_string(),
            gid: SHEET_GID.to_string(),
        }
    }
}

impl SheetSource {
    /// `{base}{ID}/export?format=csv&gid={GID}`
    pub fn export_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .and_then(|base| base.join(&format!("{}/export", self.spreadsheet_id)))
            .with_context(|| format!("building export URL for {}", self.spreadsheet_id))?;
        url.query_pairs_mut()
            .append_pair("format", "csv")
            .append_pair("gid", &self.gid);
        Ok(url)
    }
}

/// Fixed positions of the header row, data rows and metric columns.
///
/// Row indices count tokenized rows, i.e. after blank lines were skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLayout {
    /// Row holding the metric names (third non-blank line).
    pub header_row: usize,
    /// First data row (fifth non-blank line).
    pub data_row: usize,
    /// Metric column window, D through BG.
    pub metric_columns: Range<usize>,
    /// Column B.
    pub date_column: usize,
    /// Rows shorter than this are skipped.
    pub min_row_cells: usize,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            header_row: 2,
            data_row: 4,
            metric_columns: 3..59,
            date_column: 1,
            min_row_cells: 4,
        }
    }
}
