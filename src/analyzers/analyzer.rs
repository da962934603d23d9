use tracing::info;

use crate::analyzers::filters::{failures, final_borderline, identity_columns, tee_borderline};
use crate::analyzers::grader::{grade_table, weighting_warnings};
use crate::analyzers::types::{GradingWarning, IdentityColumns, ReportSet};
use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::normalize::{MaxMarks, normalize};
use crate::parser::parse_sheet;
use crate::table::{RawSheet, Table};

/// A normalized and graded sheet, ready for filtering.
#[derive(Debug, Clone)]
pub struct GradedSheet {
    pub table: Table,
    pub subjects: Vec<String>,
    pub max_marks: MaxMarks,
    pub identity: IdentityColumns,
    pub warnings: Vec<GradingWarning>,
}

/// Normalizes and grades an already-parsed sheet.
pub fn grade_sheet(sheet: &RawSheet, config: &ReportConfig) -> Result<GradedSheet, ReportError> {
    let normalized = normalize(sheet)?;
    let mut table = normalized.table;

    let identity = identity_columns(&table, &config.id_suffix, &config.name_suffix)?;
    let subjects = grade_table(&mut table);
    let warnings = weighting_warnings(&subjects, &normalized.max_marks);

    info!(
        subjects = subjects.len(),
        students = table.len(),
        warnings = warnings.len(),
        "Graded sheet"
    );

    Ok(GradedSheet {
        table,
        subjects,
        max_marks: normalized.max_marks,
        identity,
        warnings,
    })
}

/// Parses raw CSV bytes and grades them.
#[tracing::instrument(skip(bytes, config), fields(bytes = bytes.len()))]
pub fn analyze(bytes: &[u8], config: &ReportConfig) -> Result<GradedSheet, ReportError> {
    let sheet = parse_sheet(bytes)?;
    grade_sheet(&sheet, config)
}

/// Builds the failure and borderline reports for a graded sheet.
pub fn build_reports(graded: &GradedSheet, config: &ReportConfig) -> ReportSet {
    let range = config.range();
    let reports = ReportSet {
        failures: failures(&graded.table, &graded.subjects, &graded.identity),
        tee_borderline: tee_borderline(
            &graded.table,
            &graded.subjects,
            &graded.identity,
            range,
            config.tee_basis,
            &graded.max_marks,
        ),
        final_borderline: final_borderline(
            &graded.table,
            &graded.subjects,
            &graded.identity,
            range,
        ),
    };

    info!(
        failures = reports.failures.len(),
        tee_borderline = reports.tee_borderline.len(),
        final_borderline = reports.final_borderline.len(),
        "Reports built"
    );

    reports
}
