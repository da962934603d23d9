//! What-if recomputation of a single student's total.

use serde::Serialize;
use tracing::{info, warn};

use crate::analyzers::grader::{ASSUMED_TEE_MAX, ica_column, tee_column};
use crate::analyzers::types::IdentityColumns;
use crate::analyzers::utility::subject_key;
use crate::error::ReportError;
use crate::normalize::MaxMarks;
use crate::table::Table;

/// Result of [`simulate`]. `total` is NaN when it cannot be computed.
#[derive(Debug, Clone, Serialize)]
pub struct Simulation {
    pub student_id: String,
    pub subject: String,
    pub tee: Option<f64>,
    pub ica: Option<f64>,
    pub delta: f64,
    pub max_tee: u32,
    pub total: f64,
}

/// Hypothetical total after adding `delta` to a TEE score.
///
/// Only max TEE marks of 100 (halved) and 50 (used as-is) are defined; any
/// other maximum yields NaN.
pub fn simulate_total(tee: f64, ica: f64, delta: f64, max_tee: u32) -> f64 {
    let new_tee = tee + delta;
    match max_tee {
        100 => new_tee / 2.0 + ica,
        50 => new_tee + ica,
        _ => f64::NAN,
    }
}

/// Runs the what-if for one student (matched on the id column text) in one
/// subject. `subject` may use spaces or underscores.
#[tracing::instrument(skip(table, ids, max_marks))]
pub fn simulate(
    table: &Table,
    ids: &IdentityColumns,
    max_marks: &MaxMarks,
    student_id: &str,
    subject: &str,
    delta: f64,
) -> Result<Simulation, ReportError> {
    let subject = subject_key(subject);
    let tee_col = tee_column(&subject);
    let ica_col = ica_column(&subject);
    for column in [&tee_col, &ica_col] {
        if !table.has_column(column) {
            return Err(ReportError::MissingColumn(column.clone()));
        }
    }

    let row = (0..table.len())
        .find(|&r| table.get(r, &ids.id).to_string() == student_id.trim())
        .ok_or_else(|| ReportError::StudentNotFound(student_id.to_string()))?;

    let tee = table.get(row, &tee_col).as_number();
    let ica = table.get(row, &ica_col).as_number();
    let max_tee = max_marks.get(&tee_col).unwrap_or(ASSUMED_TEE_MAX);

    let total = match (tee, ica) {
        (Some(t), Some(i)) => simulate_total(t, i, delta, max_tee),
        _ => f64::NAN,
    };

    if total.is_nan() {
        warn!(max_tee, ?tee, ?ica, "Simulated total is undefined");
    } else {
        info!(total, "Simulated total");
    }

    Ok(Simulation {
        student_id: student_id.trim().to_string(),
        subject,
        tee,
        ica,
        delta,
        max_tee,
        total,
    })
}
