use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analyzers::analyzer::GradedSheet;
use crate::analyzers::grade::FailReason;
use crate::analyzers::grader::{fail_reason_column, total_column};
use crate::analyzers::types::{GradingWarning, ReportSet};
use crate::analyzers::utility::{mean, stddev, subject_label};

/// Flat per-run summary, appendable as one CSV row.
#[derive(Debug, Default, Serialize)]
pub struct ReportStats {
    pub timestamp: DateTime<Utc>,
    pub source: Option<String>,
    pub students: usize,
    pub subjects: usize,
    pub graded: usize,

    // outcome counts over (student, subject) pairs
    pub passed: usize,
    pub low_tee: usize,
    pub low_ica: usize,
    pub both_low: usize,
    pub other_issue: usize,
    pub invalid_marks: usize,

    // report sizes
    pub failure_rows: usize,
    pub tee_borderline_rows: usize,
    pub final_borderline_rows: usize,

    pub weighting_warnings: usize,
}

impl ReportStats {
    pub fn from_graded(graded: &GradedSheet, reports: &ReportSet) -> Self {
        let mut s = ReportStats {
            timestamp: Utc::now(),
            students: graded.table.len(),
            subjects: graded.subjects.len(),
            failure_rows: reports.failures.len(),
            tee_borderline_rows: reports.tee_borderline.len(),
            final_borderline_rows: reports.final_borderline.len(),
            weighting_warnings: graded.warnings.len(),
            ..Default::default()
        };

        for subject in &graded.subjects {
            let fail_col = fail_reason_column(subject);
            for row in 0..graded.table.len() {
                let Some(reason) = graded
                    .table
                    .get(row, &fail_col)
                    .as_str()
                    .and_then(FailReason::from_label)
                else {
                    continue;
                };

                s.graded += 1;
                match reason {
                    FailReason::Pass => s.passed += 1,
                    FailReason::LowTee => s.low_tee += 1,
                    FailReason::LowIca => s.low_ica += 1,
                    FailReason::BothLowTeeImpacted
                    | FailReason::BothLowIcaImpacted
                    | FailReason::BothLowEqual => s.both_low += 1,
                    FailReason::OtherIssue => s.other_issue += 1,
                    FailReason::InvalidMarks => s.invalid_marks += 1,
                }
            }
        }

        s
    }

    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }

    pub fn pass_pct(&self) -> f64 {
        Self::pct(self.passed, self.graded)
    }

    /// Set the input file the stats were computed from
    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }
}

/// Per-subject totals over students with valid marks.
#[derive(Debug, Serialize)]
pub struct SubjectSummary {
    pub subject: String,
    pub students: usize,
    pub passed: usize,
    pub pass_pct: f64,
    pub mean_total: f64,
    pub stddev_total: f64,
}

impl SubjectSummary {
    pub fn from_graded(graded: &GradedSheet, subject: &str) -> Self {
        let total_col = total_column(subject);
        let fail_col = fail_reason_column(subject);

        let totals: Vec<f64> = (0..graded.table.len())
            .filter_map(|row| graded.table.get(row, &total_col).as_number())
            .collect();
        let passed = (0..graded.table.len())
            .filter(|&row| graded.table.get(row, &fail_col).as_str() == Some(FailReason::Pass.label()))
            .count();

        let avg = mean(&totals);
        SubjectSummary {
            subject: subject_label(subject),
            students: totals.len(),
            passed,
            pass_pct: ReportStats::pct(passed, totals.len()),
            mean_total: avg,
            stddev_total: stddev(&totals, avg),
        }
    }
}

/// Everything the `summary` command prints.
#[derive(Debug, Serialize)]
pub struct Summary {
    pub stats: ReportStats,
    pub subjects: Vec<SubjectSummary>,
    pub warnings: Vec<GradingWarning>,
}

impl Summary {
    pub fn new(graded: &GradedSheet, reports: &ReportSet) -> Self {
        Summary {
            stats: ReportStats::from_graded(graded, reports),
            subjects: graded
                .subjects
                .iter()
                .map(|s| SubjectSummary::from_graded(graded, s))
                .collect(),
            warnings: graded.warnings.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::analyzer::{analyze, build_reports};
    use crate::config::ReportConfig;

    const SHEET: &str = "\
Add.ID,Student Name,Math,,Art,
,,TEE,ICA,TEE,ICA
A1,Asha,80,30,60,20
A2,Ben,30,10,AB,20
A3,Cy,20,15,90,40
";

    fn summary() -> Summary {
        let config = ReportConfig::default();
        let graded = analyze(SHEET.as_bytes(), &config).unwrap();
        let reports = build_reports(&graded, &config);
        Summary::new(&graded, &reports)
    }

    #[test]
    fn test_pct_with_zero_total() {
        assert_eq!(ReportStats::pct(10, 0), 0.0);
    }

    #[test]
    fn test_pct_normal_values() {
        assert_eq!(ReportStats::pct(50, 100), 50.0);
        assert_eq!(ReportStats::pct(1, 4), 25.0);
    }

    #[test]
    fn test_stats_counts() {
        let stats = summary().stats;

        assert_eq!(stats.students, 3);
        assert_eq!(stats.subjects, 2);
        assert_eq!(stats.graded, 6);
        assert_eq!(stats.passed, 3);
        assert_eq!(stats.both_low, 2);
        assert_eq!(stats.invalid_marks, 1);
        assert_eq!(stats.failure_rows, 3);
        assert_eq!(stats.pass_pct(), 50.0);
    }

    #[test]
    fn test_subject_summaries() {
        let summary = summary();
        let math = &summary.subjects[0];

        assert_eq!(math.subject, "Math");
        assert_eq!(math.students, 3);
        assert_eq!(math.passed, 1);
        // totals 70, 25, 25
        assert_eq!(math.mean_total, 40.0);

        let art = &summary.subjects[1];
        assert_eq!(art.students, 2);
        assert_eq!(art.passed, 2);
    }

    #[test]
    fn test_with_source() {
        let stats = ReportStats::default().with_source("exam.csv");
        assert_eq!(stats.source.as_deref(), Some("exam.csv"));
    }
}
