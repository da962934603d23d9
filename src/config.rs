use anyhow::{Result, bail};
use serde::Deserialize;

use crate::analyzers::filters::{BorderlineRange, TeeBasis};

/// Report settings.
///
/// Optionally stored as a JSON object on disk; omitted keys keep defaults:
/// ```json
/// {
///   "borderline_low": 37,
///   "borderline_high": 39,
///   "tee_basis": "percent",
///   "id_suffix": "Add.ID",
///   "name_suffix": "Student_Name"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub borderline_low: f64,
    pub borderline_high: f64,
    pub tee_basis: TeeBasis,
    pub id_suffix: String,
    pub name_suffix: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        let range = BorderlineRange::default();
        Self {
            borderline_low: range.low,
            borderline_high: range.high,
            tee_basis: TeeBasis::default(),
            id_suffix: "Add.ID".to_string(),
            name_suffix: "Student_Name".to_string(),
        }
    }
}

impl ReportConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ReportConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies command-line overrides on top of file or default values.
    pub fn with_overrides(
        mut self,
        low: Option<f64>,
        high: Option<f64>,
        tee_basis: Option<TeeBasis>,
    ) -> Result<Self> {
        if let Some(low) = low {
            self.borderline_low = low;
        }
        if let Some(high) = high {
            self.borderline_high = high;
        }
        if let Some(basis) = tee_basis {
            self.tee_basis = basis;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.borderline_low > self.borderline_high {
            bail!(
                "borderline range is empty: low {} > high {}",
                self.borderline_low,
                self.borderline_high
            );
        }
        if self.id_suffix.trim().is_empty() {
            bail!("id_suffix must not be empty");
        }
        Ok(())
    }

    pub fn range(&self) -> BorderlineRange {
        BorderlineRange::new(self.borderline_low, self.borderline_high)
    }
}
