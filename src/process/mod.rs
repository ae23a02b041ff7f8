// src/process/mod.rs
pub mod date_parser;
pub mod extract;
pub mod normalize;
pub mod raw_table;
pub mod utils;

use csv::ReaderBuilder;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use crate::config::SheetLayout;
use crate::error::LoadError;
pub use raw_table::{Cell, RawTable, Row};

/// One data point: the raw date plus one value per header, in header order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Raw date text from the sheet, not parsed.
    pub date: String,
    pub values: Vec<Option<f64>>,
}

/// Everything one successful load produces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn metric_index(&self, metric: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == metric)
    }

    /// `(date, value)` for every record, nulls included.
    pub fn series<'a>(
        &'a self,
        metric: &str,
    ) -> impl Iterator<Item = (&'a str, Option<f64>)> + 'a {
        let idx = self.metric_index(metric);
        self.records.iter().map(move |r| {
            let v = idx.and_then(|i| r.values.get(i).copied().flatten());
            (r.date.as_str(), v)
        })
    }

    /// Records as `{ "date": …, "<metric>": number|null, … }` objects.
    pub fn to_json(&self) -> Value {
        Value::Array(
            self.records
                .iter()
                .map(|r| {
                    let mut obj = Map::new();
                    obj.insert("date".to_string(), Value::String(r.date.clone()));
                    for (name, v) in self.headers.iter().zip(&r.values) {
                        let json = v
                            .and_then(serde_json::Number::from_f64)
                            .map(Value::Number)
                            .unwrap_or(Value::Null);
                        obj.insert(name.clone(), json);
                    }
                    Value::Object(obj)
                })
                .collect(),
        )
    }
}

/// Split CSV bytes into typed cells. Blank lines are skipped and rows may
/// have differing widths. Invalid UTF-8 is a parse error.
pub fn tokenize(csv: &[u8]) -> Result<RawTable, LoadError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(csv);

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| {
            LoadError::Parse(format!("CSV parse error at record {}: {}", idx, e))
        })?;
        if record.len() == 1 && record.get(0).map_or(false, str::is_empty) {
            continue;
        }
        rows.push(record.iter().map(type_cell).collect());
    }
    Ok(RawTable::new(rows))
}

fn type_cell(raw: &str) -> Cell {
    if raw.is_empty() {
        Cell::Empty
    } else if utils::looks_numeric(raw) {
        raw.trim()
            .parse()
            .map(Cell::Number)
            .unwrap_or_else(|_| Cell::Text(raw.to_string()))
    } else {
        Cell::Text(raw.to_string())
    }
}

/// CSV export → headers + normalized records.
#[instrument(level = "info", skip(csv, layout), fields(bytes = csv.len()))]
pub fn parse_sheet(csv: &[u8], layout: &SheetLayout) -> Result<Dataset, LoadError> {
    let table = tokenize(csv)?;
    debug!(rows = table.len(), "tokenized");

    let extracted = extract::extract(&table, layout)?;
    let records = normalize::normalize_rows(extracted.rows, &extracted.headers, layout);

    info!(
        headers = extracted.headers.len(),
        records = records.len(),
        skipped = extracted.rows.len() - records.len(),
        "sheet parsed"
    );

    Ok(Dataset {
        headers: extracted.headers,
        records,
    })
}
