use std::fmt;

/// One tokenized CSV cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Auto-typed numeric cell, e.g. `1200` or `-0.5`.
    Number(f64),
    /// Anything else that is not empty, kept verbatim.
    Text(String),
    Empty,
}

impl Cell {
    /// Falsy in the spreadsheet sense: empty, blank text or the number zero.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.is_empty(),
            Cell::Number(n) => *n == 0.0 || n.is_nan(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Text(s) => f.write_str(s),
            Cell::Empty => Ok(()),
        }
    }
}

pub type Row = Vec<Cell>;

/// Rows exactly as the tokenizer produced them, blank lines already skipped.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RawTable {
    pub rows: Vec<Row>,
}

impl RawTable {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn row(&self, idx: usize) -> Option<&Row> {
        self.rows.get(idx)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}
