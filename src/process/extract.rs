use std::collections::HashMap;

use tracing::{debug, warn};

use crate::config::SheetLayout;
use crate::error::LoadError;
use crate::process::raw_table::{RawTable, Row};

/// Header names plus the data rows they describe.
#[derive(Debug)]
pub struct Extracted<'a> {
    pub headers: Vec<String>,
    pub rows: &'a [Row],
}

/// Slice the header row's metric window and the data-row span out of `table`.
///
/// Blank header cells are dropped and the list compacted, so the i-th header
/// does not necessarily name column `metric_columns.start + i`.
pub fn extract<'a>(table: &'a RawTable, layout: &SheetLayout) -> Result<Extracted<'a>, LoadError> {
    let header_row = table.row(layout.header_row).ok_or_else(|| {
        LoadError::Processing(format!(
            "header row {} missing ({} rows in sheet)",
            layout.header_row,
            table.len()
        ))
    })?;

    let window = header_row
        .get(layout.metric_columns.clone())
        .or_else(|| header_row.get(layout.metric_columns.start.min(header_row.len())..))
        .unwrap_or(&[]);

    let headers = dedupe_headers(
        window
            .iter()
            .filter(|cell| !cell.is_blank())
            .map(|cell| cell.to_string().trim().to_string())
            .filter(|name| !name.is_empty())
            .collect(),
    );

    let rows = table.rows.get(layout.data_row..).unwrap_or(&[]);
    debug!(headers = headers.len(), rows = rows.len(), "extracted table");

    Ok(Extracted { headers, rows })
}

/// Suffix repeated names (`売上`, `売上 (2)`) so every column stays addressable.
fn dedupe_headers(names: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let count = seen.entry(name.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            out.push(name);
        } else {
            let renamed = format!("{} ({})", name, count);
            warn!(header = %name, renamed = %renamed, "duplicate header renamed");
            out.push(renamed);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::raw_table::Cell;

    fn text(s: &str) -> Cell {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|s| text(s)).collect()
    }

    fn layout() -> SheetLayout {
        SheetLayout {
            metric_columns: 3..6,
            ..SheetLayout::default()
        }
    }

    fn table() -> RawTable {
        RawTable::new(vec![
            row(&["title"]),
            row(&["", "sub"]),
            row(&["", "日付", "", " 売上 ", "", "達成率%", "ignored"]),
            row(&["note"]),
            row(&["", "2024-01-01", "", "1", "", "2"]),
            row(&["", "2024-01-02", "", "3", "", "4"]),
        ])
    }

    #[test]
    fn drops_blank_headers_and_trims() -> Result<(), LoadError> {
        let t = table();
        let out = extract(&t, &layout())?;
        assert_eq!(out.headers, vec!["売上", "達成率%"]);
        assert_eq!(out.rows.len(), 2);
        Ok(())
    }

    #[test]
    fn idempotent() -> Result<(), LoadError> {
        let t = table();
        let a = extract(&t, &layout())?;
        let b = extract(&t, &layout())?;
        assert_eq!(a.headers, b.headers);
        assert_eq!(a.rows, b.rows);
        Ok(())
    }

    #[test]
    fn numeric_headers_become_text() -> Result<(), LoadError> {
        let mut t = table();
        t.rows[2][3] = Cell::Number(2024.0);
        let out = extract(&t, &layout())?;
        assert_eq!(out.headers, vec!["2024", "達成率%"]);
        Ok(())
    }

    #[test]
    fn zero_header_is_dropped() -> Result<(), LoadError> {
        let mut t = table();
        t.rows[2][3] = Cell::Number(0.0);
        let out = extract(&t, &layout())?;
        assert_eq!(out.headers, vec!["達成率%"]);
        Ok(())
    }

    #[test]
    fn literal_quotes_in_header_are_kept() -> Result<(), LoadError> {
        let mut t = table();
        t.rows[2][3] = Cell::Text(" \"売上\" ".into());
        let out = extract(&t, &layout())?;
        assert_eq!(out.headers, vec!["\"売上\"", "達成率%"]);
        Ok(())
    }

    #[test]
    fn short_header_row_uses_what_exists() -> Result<(), LoadError> {
        let t = RawTable::new(vec![
            row(&["a"]),
            row(&["b"]),
            row(&["", "", "", "売上"]),
        ]);
        let out = extract(&t, &layout())?;
        assert_eq!(out.headers, vec!["売上"]);
        assert!(out.rows.is_empty());
        Ok(())
    }

    #[test]
    fn missing_header_row_is_processing_error() {
        let t = RawTable::new(vec![row(&["only"])]);
        let err = extract(&t, &layout()).unwrap_err();
        assert_eq!(err.kind(), "processing");
    }

    #[test]
    fn duplicate_headers_are_namespaced() {
        let names = vec!["売上".to_string(), "売上".to_string(), "利益".to_string(), "売上".to_string()];
        assert_eq!(
            dedupe_headers(names),
            vec!["売上", "売上 (2)", "利益", "売上 (3)"]
        );
    }
}
