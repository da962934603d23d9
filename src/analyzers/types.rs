//! Data types used by the grading and reporting pipeline.

use serde::Serialize;

use crate::table::Cell;

/// Which derived view a [`Report`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReportKind {
    Failures,
    TeeBorderline,
    FinalBorderline,
}

impl ReportKind {
    /// Header of the payload column.
    pub fn payload_column(&self) -> &'static str {
        match self {
            ReportKind::Failures => "Reason",
            ReportKind::TeeBorderline => "TEE_Score",
            ReportKind::FinalBorderline => "Final_Marks",
        }
    }
}

/// Resolved identity columns of a normalized table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityColumns {
    pub id: String,
    pub name: Option<String>,
}

/// One projected student row in a report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub student_id: Cell,
    pub student_name: Option<Cell>,
    pub subject: String,
    pub payload: Cell,
}

/// A flat report concatenated across subjects.
#[derive(Debug, Clone)]
pub struct Report {
    pub kind: ReportKind,
    pub identity: IdentityColumns,
    pub rows: Vec<ReportRow>,
}

impl Report {
    pub fn new(kind: ReportKind, identity: IdentityColumns) -> Self {
        Self {
            kind,
            identity,
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Projected column names before de-duplication.
    fn raw_header(&self) -> Vec<&str> {
        let mut header = vec![self.identity.id.as_str()];
        if let Some(name) = &self.identity.name {
            header.push(name.as_str());
        }
        header.push("Subject");
        header.push(self.kind.payload_column());
        header
    }

    /// Positions of the first occurrence of every column name.
    fn kept_positions(&self) -> Vec<usize> {
        let raw = self.raw_header();
        (0..raw.len())
            .filter(|&i| !raw[..i].contains(&raw[i]))
            .collect()
    }

    /// Column names, duplicates removed keeping the first occurrence.
    pub fn header(&self) -> Vec<String> {
        let raw = self.raw_header();
        self.kept_positions()
            .into_iter()
            .map(|i| raw[i].to_string())
            .collect()
    }

    /// Rows rendered as text, aligned with [`Report::header`].
    pub fn records(&self) -> Vec<Vec<String>> {
        let kept = self.kept_positions();
        self.rows
            .iter()
            .map(|row| {
                let mut cells = vec![row.student_id.to_string()];
                if self.identity.name.is_some() {
                    cells.push(
                        row.student_name
                            .as_ref()
                            .map(Cell::to_string)
                            .unwrap_or_default(),
                    );
                }
                cells.push(row.subject.clone());
                cells.push(row.payload.to_string());
                kept.iter().map(|&i| cells[i].clone()).collect()
            })
            .collect()
    }
}

/// Raised when extracted max marks disagree with the fixed 100/50 weighting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradingWarning {
    pub subject: String,
    pub component: String,
    pub max_marks: u32,
    pub assumed_max: u32,
}

/// The three derived views of one run.
#[derive(Debug, Clone)]
pub struct ReportSet {
    pub failures: Report,
    pub tee_borderline: Report,
    pub final_borderline: Report,
}

impl ReportSet {
    pub fn iter(&self) -> impl Iterator<Item = &Report> {
        [&self.failures, &self.tee_borderline, &self.final_borderline].into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(id: &str, name: Option<&str>) -> IdentityColumns {
        IdentityColumns {
            id: id.to_string(),
            name: name.map(str::to_string),
        }
    }

    #[test]
    fn test_header_with_and_without_name() {
        let report = Report::new(ReportKind::Failures, identity("Add.ID", Some("Student_Name")));
        assert_eq!(report.header(), vec!["Add.ID", "Student_Name", "Subject", "Reason"]);

        let report = Report::new(ReportKind::TeeBorderline, identity("Add.ID", None));
        assert_eq!(report.header(), vec!["Add.ID", "Subject", "TEE_Score"]);
    }

    #[test]
    fn test_duplicate_header_keeps_first() {
        let mut report = Report::new(ReportKind::FinalBorderline, identity("Subject", None));
        report.rows.push(ReportRow {
            student_id: Cell::Text("A1".into()),
            student_name: None,
            subject: "Math".into(),
            payload: Cell::Number(38.5),
        });

        assert_eq!(report.header(), vec!["Subject", "Final_Marks"]);
        assert_eq!(report.records(), vec![vec!["A1".to_string(), "38.5".to_string()]]);
    }
}
