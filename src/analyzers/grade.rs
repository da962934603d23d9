use serde::Serialize;
use std::fmt;

/// Minimum `Total` for a pass.
pub const PASS_MARK: f64 = 40.0;

/// A component contribution below this is considered low.
pub const CONTRIBUTION_FLOOR: f64 = 20.0;

/// Outcome for one (student, subject) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FailReason {
    Pass,
    LowTee,
    LowIca,
    BothLowTeeImpacted,
    BothLowIcaImpacted,
    BothLowEqual,
    OtherIssue,
    InvalidMarks,
}

impl FailReason {
    pub const ALL: [FailReason; 8] = [
        FailReason::Pass,
        FailReason::LowTee,
        FailReason::LowIca,
        FailReason::BothLowTeeImpacted,
        FailReason::BothLowIcaImpacted,
        FailReason::BothLowEqual,
        FailReason::OtherIssue,
        FailReason::InvalidMarks,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FailReason::Pass => "Pass",
            FailReason::LowTee => "Low TEE",
            FailReason::LowIca => "Low ICA",
            FailReason::BothLowTeeImpacted => "Both TEE & ICA Low (TEE impacted more)",
            FailReason::BothLowIcaImpacted => "Both TEE & ICA Low (ICA impacted more)",
            FailReason::BothLowEqual => "Both TEE & ICA Low (Equal impact)",
            FailReason::OtherIssue => "Other Issue",
            FailReason::InvalidMarks => "Invalid Marks",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.label() == label)
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, FailReason::Pass)
    }
}

impl fmt::Display for FailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Derived scores for one subject on one row. `None` means missing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SubjectScores {
    pub new_tee: Option<f64>,
    pub total: Option<f64>,
    pub tee_contribution: Option<f64>,
    pub ica_contribution: Option<f64>,
}

/// Computes the derived fields from coerced TEE and ICA marks.
///
/// TEE is assumed to be out of 100 (halved to 50) and ICA out of 50.
pub fn derive_scores(tee: Option<f64>, ica: Option<f64>) -> SubjectScores {
    let new_tee = tee.map(|t| t / 2.0);
    SubjectScores {
        new_tee,
        total: new_tee.zip(ica).map(|(n, i)| n + i),
        tee_contribution: new_tee.map(|n| 0.2 * (n / 50.0) * 100.0),
        ica_contribution: ica.map(|i| 0.2 * (i / 50.0) * 100.0),
    }
}

/// Classifies a row's derived scores into exactly one [`FailReason`].
///
/// | Condition                               | Reason                       |
/// |-----------------------------------------|------------------------------|
/// | any derived value missing               | Invalid Marks                |
/// | total >= 40                             | Pass                         |
/// | only TEE contribution < 20              | Low TEE                      |
/// | only ICA contribution < 20              | Low ICA                      |
/// | both < 20                               | Both ... (lower one / Equal) |
/// | neither < 20                            | Other Issue                  |
pub fn classify(scores: &SubjectScores) -> FailReason {
    let (Some(total), Some(tee), Some(ica)) =
        (scores.total, scores.tee_contribution, scores.ica_contribution)
    else {
        return FailReason::InvalidMarks;
    };

    if total >= PASS_MARK {
        return FailReason::Pass;
    }

    match (tee < CONTRIBUTION_FLOOR, ica < CONTRIBUTION_FLOOR) {
        (true, false) => FailReason::LowTee,
        (false, true) => FailReason::LowIca,
        (true, true) if tee < ica => FailReason::BothLowTeeImpacted,
        (true, true) if ica < tee => FailReason::BothLowIcaImpacted,
        (true, true) => FailReason::BothLowEqual,
        (false, false) => FailReason::OtherIssue,
    }
}
