//! In-memory table types shared by every pipeline stage.

use std::collections::HashMap;
use std::fmt;

/// A single tagged cell value.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    #[default]
    Missing,
}

impl Cell {
    /// Builds a cell from a raw CSV field. Blank fields become [`Cell::Missing`];
    /// everything else is kept verbatim as text so identifiers keep leading zeros.
    pub fn from_raw(field: &str) -> Self {
        let trimmed = field.trim();
        if trimmed.is_empty() {
            Cell::Missing
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    /// Wraps an optional number, mapping `None` and NaN to [`Cell::Missing`].
    pub fn number(value: Option<f64>) -> Self {
        match value {
            Some(v) if !v.is_nan() => Cell::Number(v),
            _ => Cell::Missing,
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Missing => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(v) => v.is_nan(),
        }
    }

    /// Numeric coercion. Unparseable or non-finite values are `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) if v.is_finite() => Some(*v),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(v) if v.is_nan() => Ok(()),
            Cell::Number(v) => write!(f, "{}", v),
            Cell::Text(s) => f.write_str(s),
            Cell::Missing => Ok(()),
        }
    }
}

/// Untyped grid read straight from the input file. Rows may be ragged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSheet {
    pub rows: Vec<Vec<Cell>>,
}

impl RawSheet {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    /// Convenience constructor used heavily in tests.
    pub fn from_strings(rows: &[&[&str]]) -> Self {
        Self {
            rows: rows
                .iter()
                .map(|r| r.iter().map(|f| Cell::from_raw(f)).collect())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

pub type Record = HashMap<String, Cell>;

/// Normalized table: an explicit column order alongside one map per row.
///
/// Column names may repeat when the source headers collide. The ordered list
/// keeps every occurrence, but a row map holds one value per name, so the
/// later column shadows the earlier one on lookup.
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Record>,
}

static MISSING: Cell = Cell::Missing;

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row given as cells aligned with the column list.
    /// Short rows are padded with [`Cell::Missing`], extra cells are dropped.
    pub fn push_row(&mut self, cells: Vec<Cell>) {
        let mut record = Record::with_capacity(self.columns.len());
        let mut cells = cells.into_iter();
        for name in &self.columns {
            record.insert(name.clone(), cells.next().unwrap_or_default());
        }
        self.rows.push(record);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// First column (in column order) satisfying `pred`.
    pub fn find_column<P: Fn(&str) -> bool>(&self, pred: P) -> Option<&str> {
        self.columns.iter().map(String::as_str).find(|c| pred(c))
    }

    pub fn get(&self, row: usize, column: &str) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&MISSING)
    }

    /// Adds (or overwrites) a whole column. The name is appended to the
    /// column order only the first time it is seen.
    pub fn set_column(&mut self, name: &str, values: Vec<Cell>) {
        if !self.has_column(name) {
            self.columns.push(name.to_string());
        }
        let mut values = values.into_iter();
        for row in &mut self.rows {
            row.insert(name.to_string(), values.next().unwrap_or_default());
        }
    }
}
