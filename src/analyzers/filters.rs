//! Report filters over a graded table.
//!
//! Each filter walks subjects in discovery order and rows in table order and
//! projects matching rows to (id, optional name, subject label, payload).

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analyzers::grade::FailReason;
use crate::analyzers::grader::{ASSUMED_TEE_MAX, fail_reason_column, tee_column, total_column};
use crate::analyzers::types::{IdentityColumns, Report, ReportKind, ReportRow};
use crate::analyzers::utility::subject_label;
use crate::error::ReportError;
use crate::normalize::MaxMarks;
use crate::table::{Cell, Table};

/// Inclusive score band flagged for manual review.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BorderlineRange {
    pub low: f64,
    pub high: f64,
}

impl Default for BorderlineRange {
    fn default() -> Self {
        Self {
            low: 37.0,
            high: 39.0,
        }
    }
}

impl BorderlineRange {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, score: f64) -> bool {
        score >= self.low && score <= self.high
    }
}

/// What the TEE borderline filter compares against the range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TeeBasis {
    /// The absolute TEE score.
    #[default]
    Raw,
    /// TEE as a percentage of the subject's max TEE marks.
    Percent,
}

/// Resolves the id column (required) and name column (optional) by suffix.
pub fn identity_columns(
    table: &Table,
    id_suffix: &str,
    name_suffix: &str,
) -> Result<IdentityColumns, ReportError> {
    let id = table
        .find_column(|c| c.ends_with(id_suffix))
        .ok_or_else(|| ReportError::MissingColumn(id_suffix.to_string()))?
        .to_string();
    let name = table
        .find_column(|c| c.ends_with(name_suffix))
        .map(str::to_string);

    Ok(IdentityColumns { id, name })
}

fn project(table: &Table, ids: &IdentityColumns, row: usize, subject: &str, payload: Cell) -> ReportRow {
    ReportRow {
        student_id: table.get(row, &ids.id).clone(),
        student_name: ids.name.as_ref().map(|n| table.get(row, n).clone()),
        subject: subject_label(subject),
        payload,
    }
}

/// Rows whose fail reason is anything but Pass.
pub fn failures(table: &Table, subjects: &[String], ids: &IdentityColumns) -> Report {
    let mut report = Report::new(ReportKind::Failures, ids.clone());

    for subject in subjects {
        let fail_col = fail_reason_column(subject);
        for row in 0..table.len() {
            let reason = table.get(row, &fail_col);
            if reason.as_str() == Some(FailReason::Pass.label()) {
                continue;
            }
            report
                .rows
                .push(project(table, ids, row, subject, reason.clone()));
        }
    }

    debug!(rows = report.len(), "Collected failures");
    report
}

/// TEE score used by the borderline filter for one row.
fn tee_score(
    table: &Table,
    row: usize,
    subject: &str,
    basis: TeeBasis,
    max_marks: &MaxMarks,
) -> Option<f64> {
    let tee = table.get(row, &tee_column(subject)).as_number()?;
    match basis {
        TeeBasis::Raw => Some(tee),
        TeeBasis::Percent => {
            let max = max_marks
                .get(&tee_column(subject))
                .unwrap_or(ASSUMED_TEE_MAX);
            if max == 0 {
                return None;
            }
            Some(tee / max as f64 * 100.0)
        }
    }
}

/// Rows whose TEE score falls inside `range`.
pub fn tee_borderline(
    table: &Table,
    subjects: &[String],
    ids: &IdentityColumns,
    range: BorderlineRange,
    basis: TeeBasis,
    max_marks: &MaxMarks,
) -> Report {
    let mut report = Report::new(ReportKind::TeeBorderline, ids.clone());

    for subject in subjects {
        for row in 0..table.len() {
            let Some(score) = tee_score(table, row, subject, basis, max_marks) else {
                continue;
            };
            if range.contains(score) {
                report
                    .rows
                    .push(project(table, ids, row, subject, Cell::Number(score)));
            }
        }
    }

    debug!(rows = report.len(), ?basis, "Collected TEE borderline");
    report
}

/// Rows whose `Total_` falls inside `range`.
pub fn final_borderline(
    table: &Table,
    subjects: &[String],
    ids: &IdentityColumns,
    range: BorderlineRange,
) -> Report {
    let mut report = Report::new(ReportKind::FinalBorderline, ids.clone());

    for subject in subjects {
        let total_col = total_column(subject);
        for row in 0..table.len() {
            let Some(total) = table.get(row, &total_col).as_number() else {
                continue;
            };
            if range.contains(total) {
                report
                    .rows
                    .push(project(table, ids, row, subject, Cell::Number(total)));
            }
        }
    }

    debug!(rows = report.len(), "Collected final borderline");
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::grader::grade_table;

    fn graded(rows: &[&[&str]]) -> (Table, Vec<String>, IdentityColumns) {
        let mut t = Table::new(
            ["Add.ID", "Student_Name", "TEE_Data_Structures", "ICA_Data_Structures"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        );
        for row in rows {
            t.push_row(row.iter().map(|f| Cell::from_raw(f)).collect());
        }
        let subjects = grade_table(&mut t);
        let ids = identity_columns(&t, "Add.ID", "Student_Name").unwrap();
        (t, subjects, ids)
    }

    #[test]
    fn test_range_is_inclusive() {
        let range = BorderlineRange::default();
        assert!(range.contains(37.0));
        assert!(range.contains(39.0));
        assert!(range.contains(38.5));
        assert!(!range.contains(36.0));
        assert!(!range.contains(40.0));
    }

    #[test]
    fn test_identity_columns_by_suffix() {
        let t = Table::new(vec!["0_Add.ID".into(), "1_Student_Name".into()]);
        let ids = identity_columns(&t, "Add.ID", "Student_Name").unwrap();
        assert_eq!(ids.id, "0_Add.ID");
        assert_eq!(ids.name.as_deref(), Some("1_Student_Name"));

        let t = Table::new(vec!["Add.ID".into()]);
        let ids = identity_columns(&t, "Add.ID", "Student_Name").unwrap();
        assert_eq!(ids.name, None);
    }

    #[test]
    fn test_identity_columns_missing_id() {
        let t = Table::new(vec!["Roll".into()]);
        let result = identity_columns(&t, "Add.ID", "Student_Name");
        assert!(matches!(result, Err(ReportError::MissingColumn(_))));
    }

    #[test]
    fn test_failures_projection() {
        let (t, subjects, ids) = graded(&[&["A1", "Asha", "80", "30"], &["A2", "Ben", "30", "10"]]);
        let report = failures(&t, &subjects, &ids);

        assert_eq!(report.header(), vec!["Add.ID", "Student_Name", "Subject", "Reason"]);
        assert_eq!(
            report.records(),
            vec![vec![
                "A2".to_string(),
                "Ben".to_string(),
                "Data Structures".to_string(),
                "Both TEE & ICA Low (ICA impacted more)".to_string(),
            ]]
        );
    }

    #[test]
    fn test_tee_borderline_bounds() {
        let (t, subjects, ids) = graded(&[
            &["A1", "a", "36", "30"],
            &["A2", "b", "37", "30"],
            &["A3", "c", "39", "30"],
            &["A4", "d", "40", "30"],
            &["A5", "e", "AB", "30"],
        ]);
        let report = tee_borderline(
            &t,
            &subjects,
            &ids,
            BorderlineRange::default(),
            TeeBasis::Raw,
            &MaxMarks::default(),
        );
        let ids: Vec<_> = report.rows.iter().map(|r| r.student_id.to_string()).collect();
        assert_eq!(ids, vec!["A2", "A3"]);
    }

    #[test]
    fn test_tee_borderline_percent_uses_max_marks() {
        let (t, subjects, ids) = graded(&[&["A1", "a", "19", "30"], &["A2", "b", "38", "30"]]);
        let mut marks = MaxMarks::default();
        marks.insert("TEE_Data_Structures".into(), 50);

        let report = tee_borderline(
            &t,
            &subjects,
            &ids,
            BorderlineRange::default(),
            TeeBasis::Percent,
            &marks,
        );

        assert_eq!(report.len(), 1);
        assert_eq!(report.rows[0].student_id.to_string(), "A1");
        assert_eq!(report.rows[0].payload, Cell::Number(38.0));
    }

    #[test]
    fn test_final_borderline() {
        let (t, subjects, ids) = graded(&[
            &["A1", "a", "74", "2"],
            &["A2", "b", "37", "19"],
            &["A3", "c", "80", "0"],
        ]);
        let report = final_borderline(&t, &subjects, &ids, BorderlineRange::default());

        let got: Vec<_> = report
            .rows
            .iter()
            .map(|r| (r.student_id.to_string(), r.payload.to_string()))
            .collect();
        assert_eq!(
            got,
            vec![("A1".to_string(), "39".to_string()), ("A2".to_string(), "37.5".to_string())]
        );
    }
}
