use tracing::trace;

use crate::config::SheetLayout;
use crate::process::raw_table::{Cell, Row};
use crate::process::utils::{parse_float_prefix, strip_currency};
use crate::process::Record;

/// Numeric value of a metric cell, `None` when it is empty, unparseable or
/// non-finite.
///
/// Text is cleaned first: currency glyphs and thousands separators go, and a
/// percent sign is dropped while the value stays on the 0–100 scale.
pub fn parse_metric_value(cell: &Cell) -> Option<f64> {
    let value = match cell {
        Cell::Number(n) => Some(*n),
        Cell::Text(s) => {
            let cleaned = strip_currency(s);
            if cleaned.contains('%') {
                parse_float_prefix(&cleaned.replacen('%', "", 1))
            } else {
                parse_float_prefix(&cleaned)
            }
        }
        Cell::Empty => None,
    };
    value.filter(|v| v.is_finite())
}

/// Turn one data row into a record, or skip it when the row is short or its
/// date cell is blank.
pub fn normalize_row(row: &Row, headers: &[String], layout: &SheetLayout) -> Option<Record> {
    if row.len() < layout.min_row_cells {
        trace!(cells = row.len(), "short row skipped");
        return None;
    }
    let date_cell = row.get(layout.date_column)?;
    if date_cell.is_blank() {
        trace!("row without date skipped");
        return None;
    }

    let values = (0..headers.len())
        .map(|i| {
            row.get(layout.metric_columns.start + i)
                .and_then(parse_metric_value)
        })
        .collect();

    Some(Record {
        date: date_cell.to_string(),
        values,
    })
}

pub fn normalize_rows(rows: &[Row], headers: &[String], layout: &SheetLayout) -> Vec<Record> {
    rows.iter()
        .filter_map(|row| normalize_row(row, headers, layout))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn cleans_locale_formatting() {
        assert_eq!(parse_metric_value(&text("¥1,234")), Some(1234.0));
        assert_eq!(parse_metric_value(&text("45.5%")), Some(45.5));
        assert_eq!(parse_metric_value(&text("1,000")), Some(1000.0));
        assert_eq!(parse_metric_value(&text("-12.5%")), Some(-12.5));
        assert_eq!(parse_metric_value(&text("$3,000.25")), Some(3000.25));
    }

    #[test]
    fn garbage_is_null() {
        assert_eq!(parse_metric_value(&text("")), None);
        assert_eq!(parse_metric_value(&text("n/a")), None);
        assert_eq!(parse_metric_value(&text("#DIV/0!")), None);
        assert_eq!(parse_metric_value(&text("Infinity")), None);
        assert_eq!(parse_metric_value(&Cell::Empty), None);
    }

    #[test]
    fn numbers_pass_through() {
        assert_eq!(parse_metric_value(&Cell::Number(12.5)), Some(12.5));
        assert_eq!(parse_metric_value(&Cell::Number(f64::NAN)), None);
    }

    #[test]
    fn row_skip_rules() {
        let layout = SheetLayout::default();
        let headers = vec!["売上".to_string()];

        let short = vec![Cell::Empty, text("2024-01-01"), Cell::Empty];
        assert!(normalize_row(&short, &headers, &layout).is_none());

        let no_date = vec![Cell::Empty, Cell::Empty, Cell::Empty, text("100")];
        assert!(normalize_row(&no_date, &headers, &layout).is_none());

        let ok = vec![Cell::Empty, text("2024-01-01"), Cell::Empty, text("100")];
        let rec = normalize_row(&ok, &headers, &layout).expect("record");
        assert_eq!(rec.date, "2024-01-01");
        assert_eq!(rec.values, vec![Some(100.0)]);
    }

    #[test]
    fn missing_trailing_cells_are_null() {
        let layout = SheetLayout::default();
        let headers = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let row = vec![Cell::Empty, text("2024-01-01"), Cell::Empty, text("7")];
        let rec = normalize_row(&row, &headers, &layout).expect("record");
        assert_eq!(rec.values, vec![Some(7.0), None, None]);
    }

    #[test]
    fn every_value_is_finite_or_null() {
        let layout = SheetLayout::default();
        let headers: Vec<String> = (0..5).map(|i| format!("m{i}")).collect();
        let rows = vec![
            vec![
                Cell::Empty,
                text("2024-01-01"),
                Cell::Empty,
                text("1e400"),
                text("abc"),
                Cell::Number(3.0),
                text("50%"),
                Cell::Empty,
            ],
            vec![Cell::Empty, Cell::Number(45000.0), Cell::Empty, text("-Infinity")],
        ];
        let records = normalize_rows(&rows, &headers, &layout);
        assert_eq!(records.len(), 2);
        for rec in &records {
            assert_eq!(rec.values.len(), headers.len());
            assert!(rec.values.iter().flatten().all(|v| v.is_finite()));
        }
        assert_eq!(records[1].date, "45000");
    }
}
