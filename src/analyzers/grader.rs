use tracing::{debug, warn};

use crate::analyzers::grade::{FailReason, classify, derive_scores};
use crate::analyzers::types::GradingWarning;
use crate::normalize::MaxMarks;
use crate::table::{Cell, Table};

/// Max TEE marks the fixed weighting assumes.
pub const ASSUMED_TEE_MAX: u32 = 100;

/// Max ICA marks the fixed weighting assumes.
pub const ASSUMED_ICA_MAX: u32 = 50;

/// Prefixes [`grade_table`] gives to the contribution columns. These overlap
/// the raw `TEE_`/`ICA_` prefixes, so a match only counts as derived when the
/// table also holds the `Fail_Reason_` column for the same subject.
static CONTRIBUTION_PREFIXES: &[&str] = &["TEE_Contribution_", "ICA_Contribution_"];

#[derive(Debug, PartialEq, Eq)]
enum ColumnKind<'a> {
    Tee(&'a str),
    Ica(&'a str),
    Derived,
    Other,
}

fn classify_column<'a>(table: &Table, name: &'a str) -> ColumnKind<'a> {
    let derived = CONTRIBUTION_PREFIXES.iter().any(|p| {
        name.strip_prefix(p)
            .is_some_and(|subject| table.has_column(&fail_reason_column(subject)))
    });
    if derived {
        return ColumnKind::Derived;
    }
    if let Some(subject) = name.strip_prefix("TEE_") {
        return ColumnKind::Tee(subject);
    }
    if let Some(subject) = name.strip_prefix("ICA_") {
        return ColumnKind::Ica(subject);
    }
    ColumnKind::Other
}

/// Subjects that have both a `TEE_` and an `ICA_` column, in column order of
/// their TEE column.
pub fn discover_subjects(table: &Table) -> Vec<String> {
    let mut tee = Vec::new();
    let mut ica = Vec::new();

    for name in table.columns() {
        match classify_column(table, name) {
            ColumnKind::Tee(s) if !s.is_empty() && !tee.contains(&s) => tee.push(s),
            ColumnKind::Ica(s) => ica.push(s),
            _ => {}
        }
    }

    tee.into_iter()
        .filter(|s| ica.contains(s))
        .map(str::to_string)
        .collect()
}

pub fn tee_column(subject: &str) -> String {
    format!("TEE_{}", subject)
}

pub fn ica_column(subject: &str) -> String {
    format!("ICA_{}", subject)
}

pub fn total_column(subject: &str) -> String {
    format!("Total_{}", subject)
}

pub fn fail_reason_column(subject: &str) -> String {
    format!("Fail_Reason_{}", subject)
}

/// Grades one subject in place: coerces its marks, appends the derived
/// columns and the `Fail_Reason_` column.
pub fn grade_subject(table: &mut Table, subject: &str) {
    let tee_col = tee_column(subject);
    let ica_col = ica_column(subject);

    let mut tee_cells = Vec::with_capacity(table.len());
    let mut ica_cells = Vec::with_capacity(table.len());
    let mut new_tee = Vec::with_capacity(table.len());
    let mut total = Vec::with_capacity(table.len());
    let mut tee_contribution = Vec::with_capacity(table.len());
    let mut ica_contribution = Vec::with_capacity(table.len());
    let mut reasons = Vec::with_capacity(table.len());

    for row in 0..table.len() {
        let tee = table.get(row, &tee_col).as_number();
        let ica = table.get(row, &ica_col).as_number();
        let scores = derive_scores(tee, ica);
        let reason = classify(&scores);

        tee_cells.push(Cell::number(tee));
        ica_cells.push(Cell::number(ica));
        new_tee.push(Cell::number(scores.new_tee));
        total.push(Cell::number(scores.total));
        tee_contribution.push(Cell::number(scores.tee_contribution));
        ica_contribution.push(Cell::number(scores.ica_contribution));
        reasons.push(Cell::Text(reason.label().to_string()));
    }

    let failed = reasons
        .iter()
        .filter(|c| c.as_str() != Some(FailReason::Pass.label()))
        .count();
    debug!(subject, failed, students = table.len(), "Graded subject");

    table.set_column(&tee_col, tee_cells);
    table.set_column(&ica_col, ica_cells);
    table.set_column(&format!("New_TEE_{}", subject), new_tee);
    table.set_column(&total_column(subject), total);
    table.set_column(&format!("TEE_Contribution_{}", subject), tee_contribution);
    table.set_column(&format!("ICA_Contribution_{}", subject), ica_contribution);
    table.set_column(&fail_reason_column(subject), reasons);
}

/// Compares extracted max marks with the fixed weighting. The formula is not
/// rescaled; a mismatch is only reported.
pub fn weighting_warnings(subjects: &[String], max_marks: &MaxMarks) -> Vec<GradingWarning> {
    let mut warnings = Vec::new();

    for subject in subjects {
        for (component, assumed_max) in [("TEE", ASSUMED_TEE_MAX), ("ICA", ASSUMED_ICA_MAX)] {
            let Some(max) = max_marks.get(&format!("{}_{}", component, subject)) else {
                continue;
            };
            if max != assumed_max {
                warn!(
                    subject = %subject,
                    component,
                    max_marks = max,
                    assumed_max,
                    "Max marks differ from the fixed grading weights; results use the fixed weights"
                );
                warnings.push(GradingWarning {
                    subject: subject.clone(),
                    component: component.to_string(),
                    max_marks: max,
                    assumed_max,
                });
            }
        }
    }

    warnings
}

/// Discovers subjects and grades every one of them in place.
pub fn grade_table(table: &mut Table) -> Vec<String> {
    let subjects = discover_subjects(table);
    for subject in &subjects {
        grade_subject(table, subject);
    }
    subjects
}
