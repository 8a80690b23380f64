use crate::domain::error::AppError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Verdict an operator attaches to a field. There is no "unset" variant:
/// a field without a record has simply not been validated yet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VerdictStatus {
    Pass,
    Fail,
}

impl VerdictStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictStatus::Pass => "pass",
            VerdictStatus::Fail => "fail",
        }
    }
}

impl fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerdictStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pass" => Ok(VerdictStatus::Pass),
            "fail" => Ok(VerdictStatus::Fail),
            other => Err(AppError::ValidationError(format!(
                "Unknown verdict status '{}', expected 'pass' or 'fail'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerdictRecord {
    pub status: VerdictStatus,
    #[serde(default)]
    pub comment: String,
}

impl VerdictRecord {
    pub fn new(status: VerdictStatus, comment: impl Into<String>) -> Self {
        Self {
            status,
            comment: comment.into(),
        }
    }
}

/// Field identifier -> verdict. Keys are caller-chosen and unconstrained.
pub type ValidationResults = BTreeMap<String, VerdictRecord>;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

impl ValidationSummary {
    /// The single counting rule shared by the store and the exporter.
    pub fn from_results(results: &ValidationResults) -> Self {
        let mut summary = ValidationSummary {
            total: results.len(),
            ..Default::default()
        };
        for record in results.values() {
            match record.status {
                VerdictStatus::Pass => summary.passed += 1,
                VerdictStatus::Fail => summary.failed += 1,
            }
        }
        summary
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}
