//! Header normalization for multi-row exam sheet exports.
//!
//! Exports carry a two-row header somewhere below a preamble: a sparse
//! "subject" row whose labels span the following columns, and a dense
//! "component" row (`TEE`, `ICA`, ...). This module flattens that pair into
//! unique-ish column names such as `TEE_Data_Structures` and lifts the
//! optional "N marks" metadata row into a [`MaxMarks`] lookup.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::error::ReportError;
use crate::table::{Cell, RawSheet, Table};

/// Token that identifies the subject header row.
pub const HEADER_MARKER: &str = "Add.ID";

static MARKS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*marks").expect("static regex"));

/// Maximum achievable marks keyed by both `{component}_{subject}` and
/// `{subject}_{component}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaxMarks(HashMap<String, u32>);

impl MaxMarks {
    pub fn get(&self, key: &str) -> Option<u32> {
        self.0.get(key).copied()
    }

    pub fn insert(&mut self, key: String, marks: u32) {
        self.0.insert(key, marks);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Output of [`normalize`].
#[derive(Debug, Clone)]
pub struct Normalized {
    pub table: Table,
    pub max_marks: MaxMarks,
    /// Index of the subject header row in the raw sheet.
    pub header_row: usize,
}

/// Index of the first row with a cell containing [`HEADER_MARKER`].
pub fn find_header_row(sheet: &RawSheet) -> Result<usize, ReportError> {
    sheet
        .rows
        .iter()
        .position(|row| {
            row.iter()
                .any(|c| c.as_str().is_some_and(|s| s.contains(HEADER_MARKER)))
        })
        .ok_or(ReportError::HeaderNotFound)
}

/// Placeholder labels (blank, or `Unnamed...` from spreadsheet re-exports).
fn header_label(cell: Option<&Cell>) -> Option<&str> {
    let s = cell?.as_str()?.trim();
    if s.is_empty() || s.starts_with("Unnamed") {
        None
    } else {
        Some(s)
    }
}

/// Left-to-right forward fill of a sparse header row, `width` cells wide.
/// Cells before the first label stay blank.
pub fn forward_fill(row: &[Cell], width: usize) -> Vec<String> {
    let mut last_seen = String::new();
    (0..width)
        .map(|i| {
            if let Some(label) = header_label(row.get(i)) {
                last_seen = label.to_string();
            }
            last_seen.clone()
        })
        .collect()
}

/// Trailing token after the last underscore (`"Maths_TEE"` -> `"TEE"`).
pub fn component_label(raw: &str) -> &str {
    raw.rsplit('_').next().unwrap_or(raw).trim()
}

fn clean(label: &str) -> String {
    label.trim().replace(' ', "_")
}

/// Flat column names for a subject/component header pair.
pub fn column_names(subject_row: &[Cell], component_row: &[Cell]) -> Vec<String> {
    let width = subject_row.len().max(component_row.len());
    flatten_headers(subject_row, component_row, width)
        .into_iter()
        .map(|(name, _, _)| name)
        .collect()
}

/// Returns `(name, component, subject)` per column, the latter two cleaned.
fn flatten_headers(
    subject_row: &[Cell],
    component_row: &[Cell],
    width: usize,
) -> Vec<(String, String, String)> {
    let subjects = forward_fill(subject_row, width);

    subjects
        .iter()
        .enumerate()
        .map(|(i, main)| {
            let main = clean(main);
            let sub = header_label(component_row.get(i))
                .map(|s| clean(component_label(s)))
                .unwrap_or_default();

            let name = match (sub.is_empty(), main.is_empty()) {
                (false, false) => format!("{}_{}", sub, main),
                (false, true) => sub.clone(),
                (true, false) => main.clone(),
                (true, true) => format!("Unnamed_{}", i),
            };
            (name, sub, main)
        })
        .collect()
}

/// Parses a "N marks" metadata row. Returns `None` when no cell matches.
fn parse_max_marks(row: &[Cell], headers: &[(String, String, String)]) -> Option<MaxMarks> {
    let mut marks = MaxMarks::default();
    let mut matched = false;

    for (i, cell) in row.iter().enumerate() {
        let Some(text) = cell.as_str() else { continue };
        let Some(caps) = MARKS_PATTERN.captures(text) else {
            continue;
        };
        matched = true;

        let Ok(value) = caps[1].parse::<u32>() else {
            continue;
        };
        let Some((_, component, subject)) = headers.get(i) else {
            continue;
        };
        if component.is_empty() {
            continue;
        }

        if subject.is_empty() {
            marks.insert(component.clone(), value);
        } else {
            marks.insert(format!("{}_{}", component, subject), value);
            marks.insert(format!("{}_{}", subject, component), value);
        }
    }

    matched.then_some(marks)
}

/// Locates the header pair, flattens it and collects the student body.
///
/// # Errors
///
/// Returns [`ReportError::HeaderNotFound`] if no row contains [`HEADER_MARKER`].
#[tracing::instrument(skip(sheet), fields(raw_rows = sheet.len()))]
pub fn normalize(sheet: &RawSheet) -> Result<Normalized, ReportError> {
    let header_row = find_header_row(sheet)?;
    let subject_row = &sheet.rows[header_row];
    let component_row: &[Cell] = sheet
        .rows
        .get(header_row + 1)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let body = sheet.rows.get(header_row + 2..).unwrap_or(&[]);
    let width = body
        .iter()
        .map(Vec::len)
        .chain([subject_row.len(), component_row.len()])
        .max()
        .unwrap_or(0);

    let headers = flatten_headers(subject_row, component_row, width);

    let body: Vec<&Vec<Cell>> = body
        .iter()
        .filter(|row| !row.iter().all(Cell::is_blank))
        .collect();

    let (max_marks, students) =
        match body.first().and_then(|first| parse_max_marks(first, &headers)) {
            Some(marks) => {
                debug!(entries = marks.len(), "Extracted max marks row");
                (marks, &body[1..])
            }
            None => (MaxMarks::default(), &body[..]),
        };

    let mut table = Table::new(headers.into_iter().map(|(name, _, _)| name).collect());
    for row in students {
        table.push_row((*row).clone());
    }

    info!(
        header_row,
        columns = table.columns().len(),
        students = table.len(),
        "Normalized sheet"
    );

    Ok(Normalized {
        table,
        max_marks,
        header_row,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(row: &[&str]) -> Vec<Cell> {
        row.iter().map(|s| Cell::from_raw(s)).collect()
    }

    #[test]
    fn test_column_names_two_row_header() {
        let names = column_names(
            &cells(&["", "Math", "", "Physics"]),
            &cells(&["Add.ID", "TEE", "ICA", "TEE"]),
        );
        assert_eq!(names, vec!["Add.ID", "TEE_Math", "ICA_Math", "TEE_Physics"]);
    }

    #[test]
    fn test_column_names_cleaning_and_suffixes() {
        let names = column_names(
            &cells(&["Add.ID", "Student Name", " Data Structures ", ""]),
            &cells(&["", "", "Data Structures_TEE", "x_y_ICA"]),
        );
        assert_eq!(
            names,
            vec!["Add.ID", "Student_Name", "TEE_Data_Structures", "ICA_Data_Structures"]
        );
    }

    #[test]
    fn test_column_names_both_blank() {
        let names = column_names(&cells(&["", ""]), &cells(&["Add.ID", ""]));
        assert_eq!(names, vec!["Add.ID", "Unnamed_1"]);
    }

    #[test]
    fn test_forward_fill() {
        let filled = forward_fill(&cells(&["", "A", "", "Unnamed: 3_level_0", "B"]), 6);
        assert_eq!(filled, vec!["", "A", "A", "A", "B", "B"]);
    }

    #[test]
    fn test_component_label() {
        assert_eq!(component_label("Maths_TEE"), "TEE");
        assert_eq!(component_label("ICA"), "ICA");
        assert_eq!(component_label("a_b_"), "");
    }

    #[test]
    fn test_find_header_row_missing() {
        let sheet = RawSheet::from_strings(&[&["Name", "Score"], &["a", "1"]]);
        assert!(matches!(
            find_header_row(&sheet),
            Err(ReportError::HeaderNotFound)
        ));
    }

    #[test]
    fn test_find_header_row_is_case_sensitive_substring() {
        let sheet = RawSheet::from_strings(&[
            &["add.id"],
            &["Student Add.ID No", "Math"],
            &["", "TEE"],
        ]);
        assert_eq!(find_header_row(&sheet).unwrap(), 1);
    }

    #[test]
    fn test_normalize_body_and_max_marks() {
        let sheet = RawSheet::from_strings(&[
            &["Result sheet"],
            &["Add.ID", "Math", ""],
            &["", "TEE", "ICA"],
            &["", "100 Marks", "50 marks"],
            &["A1", "80", "30"],
            &["", "", ""],
            &["A2", "30", "10"],
        ]);
        let normalized = normalize(&sheet).unwrap();

        assert_eq!(normalized.header_row, 1);
        assert_eq!(normalized.table.columns(), &["Add.ID", "TEE_Math", "ICA_Math"]);
        assert_eq!(normalized.table.len(), 2);
        assert_eq!(normalized.table.get(1, "Add.ID"), &Cell::Text("A2".into()));

        let marks = &normalized.max_marks;
        assert_eq!(marks.get("TEE_Math"), Some(100));
        assert_eq!(marks.get("Math_TEE"), Some(100));
        assert_eq!(marks.get("ICA_Math"), Some(50));
        assert_eq!(marks.get("Math_ICA"), Some(50));
    }

    #[test]
    fn test_normalize_without_marks_row() {
        let sheet = RawSheet::from_strings(&[
            &["Add.ID", "Math", ""],
            &["", "TEE", "ICA"],
            &["A1", "80", "30"],
        ]);
        let normalized = normalize(&sheet).unwrap();

        assert!(normalized.max_marks.is_empty());
        assert_eq!(normalized.table.len(), 1);
    }

    #[test]
    fn test_normalize_header_only() {
        let sheet = RawSheet::from_strings(&[&["Add.ID", "Math"]]);
        let normalized = normalize(&sheet).unwrap();

        assert_eq!(normalized.table.columns(), &["Add.ID", "Math"]);
        assert!(normalized.table.is_empty());
    }
}
