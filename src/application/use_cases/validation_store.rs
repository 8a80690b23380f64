//! In-memory verdict store for one validation session.
//!
//! Keys are opaque field identifiers chosen by the caller (`product_name`,
//! `media_12`, `departure_7`, ...). A key is created the first time it gets a
//! verdict, overwritten on every later verdict, and only ever removed by
//! [`ValidationStore::clear_all`].

use crate::domain::error::{AppError, Result};
use crate::domain::validation::{
    ValidationResults, ValidationSummary, VerdictRecord, VerdictStatus,
};

#[derive(Debug, Clone, Default)]
pub struct ValidationStore {
    results: ValidationResults,
}

impl ValidationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the verdict for `field`.
    pub fn set_verdict(&mut self, field: &str, status: VerdictStatus, comment: &str) -> &VerdictRecord {
        let record = self
            .results
            .entry(field.to_string())
            .or_insert_with(|| VerdictRecord::new(status, ""));
        record.status = status;
        record.comment = comment.to_string();
        record
    }

    /// Edits the comment of an already validated field, keeping its status.
    pub fn update_comment(&mut self, field: &str, comment: &str) -> Result<&VerdictRecord> {
        let record = self.results.get_mut(field).ok_or_else(|| {
            AppError::NotFound(format!("Field '{}' has no verdict yet", field))
        })?;
        record.comment = comment.to_string();
        Ok(record)
    }

    pub fn clear_all(&mut self) {
        self.results.clear();
    }

    pub fn record(&self, field: &str) -> Option<&VerdictRecord> {
        self.results.get(field)
    }

    pub fn summary(&self) -> ValidationSummary {
        ValidationSummary::from_results(&self.results)
    }

    pub fn results(&self) -> &ValidationResults {
        &self.results
    }

    pub fn snapshot(&self) -> ValidationResults {
        self.results.clone()
    }

    /// Verdicts carrying a non-empty comment, in key order.
    pub fn notes(&self) -> Vec<(&str, &VerdictRecord)> {
        self.results
            .iter()
            .filter(|(_, record)| !record.comment.is_empty())
            .map(|(field, record)| (field.as_str(), record))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
