//! Validation sessions, one per operator tab.
//!
//! Each session owns its own [`ValidationStore`] and the currently selected
//! subject. Every public operation takes the registry lock exactly once, so
//! mutations coming from concurrent HTTP requests never interleave.
//!
//! Selecting another subject keeps the verdicts already recorded; callers
//! that want a fresh slate call [`WorkspaceRegistry::clear`] explicitly.
//!
//! A closed or reloaded tab never tells the server, so sessions idle for
//! longer than the registry TTL are treated as discarded: touching one
//! answers `NotFound`, and `open_session` sweeps them out.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::use_cases::report_exporter::{self, DeliveredReport};
use crate::application::use_cases::validation_store::ValidationStore;
use crate::domain::error::{AppError, Result};
use crate::domain::product::Subject;
use crate::domain::report::ExportReport;
use crate::domain::validation::{
    ValidationResults, ValidationSummary, VerdictRecord, VerdictStatus,
};
use crate::infrastructure::storage::ReportSink;

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(8 * 60 * 60);

#[derive(Debug)]
pub struct ValidationSession {
    pub subject: Subject,
    pub store: ValidationStore,
    last_touched: Instant,
}

impl ValidationSession {
    fn new() -> Self {
        Self {
            subject: Subject::default(),
            store: ValidationStore::new(),
            last_touched: Instant::now(),
        }
    }

    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.last_touched) > ttl
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationNote {
    pub field: String,
    #[serde(flatten)]
    pub record: VerdictRecord,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: String,
    pub subject: Subject,
    pub summary: ValidationSummary,
    pub results: ValidationResults,
    pub notes: Vec<ValidationNote>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictUpdate {
    pub field: String,
    pub record: VerdictRecord,
    pub summary: ValidationSummary,
}

/// Report produced by [`WorkspaceRegistry::export`]. `delivered` is set when
/// a sink (reports directory) was supplied.
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub report: ExportReport,
    pub filename: String,
    pub contents: String,
    pub delivered: Option<DeliveredReport>,
}

#[derive(Clone)]
pub struct WorkspaceRegistry {
    sessions: Arc<Mutex<HashMap<String, ValidationSession>>>,
    ttl: Duration,
}

impl Default for WorkspaceRegistry {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_SESSION_TTL)
    }
}

impl WorkspaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sweeps idle sessions, then registers a fresh one.
    pub fn open_session(&self) -> Result<String> {
        let session_id = Uuid::new_v4().to_string();
        let mut sessions = self.lock()?;

        let now = Instant::now();
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now, self.ttl));
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, "Expired validation sessions discarded");
        }

        sessions.insert(session_id.clone(), ValidationSession::new());
        info!(session_id = %session_id, "Validation session opened");
        Ok(session_id)
    }

    pub fn close_session(&self, session_id: &str) -> Result<()> {
        self.lock()?
            .remove(session_id)
            .map(|_| info!(session_id = %session_id, "Validation session closed"))
            .ok_or_else(|| session_not_found(session_id))
    }

    pub fn session_count(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn select_subject(&self, session_id: &str, subject: Subject) -> Result<SessionView> {
        self.with_session(session_id, |session| {
            session.subject = subject;
            Ok(view_of(session_id, session))
        })
    }

    pub fn set_verdict(
        &self,
        session_id: &str,
        field: &str,
        status: VerdictStatus,
        comment: &str,
    ) -> Result<VerdictUpdate> {
        if field.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Field identifier must not be empty".to_string(),
            ));
        }
        self.with_session(session_id, |session| {
            let record = session.store.set_verdict(field, status, comment).clone();
            Ok(VerdictUpdate {
                field: field.to_string(),
                record,
                summary: session.store.summary(),
            })
        })
    }

    pub fn update_comment(&self, session_id: &str, field: &str, comment: &str) -> Result<VerdictUpdate> {
        self.with_session(session_id, |session| {
            let record = session.store.update_comment(field, comment)?.clone();
            Ok(VerdictUpdate {
                field: field.to_string(),
                record,
                summary: session.store.summary(),
            })
        })
    }

    pub fn clear(&self, session_id: &str) -> Result<ValidationSummary> {
        self.with_session(session_id, |session| {
            session.store.clear_all();
            Ok(session.store.summary())
        })
    }

    pub fn summary(&self, session_id: &str) -> Result<ValidationSummary> {
        self.with_session(session_id, |session| Ok(session.store.summary()))
    }

    pub fn view(&self, session_id: &str) -> Result<SessionView> {
        self.with_session(session_id, |session| Ok(view_of(session_id, session)))
    }

    /// Builds and serializes a report of the current snapshot. An empty
    /// snapshot is refused with [`AppError::EmptyExport`] before the exporter
    /// runs. A failing sink leaves the session untouched.
    pub fn export(
        &self,
        session_id: &str,
        filename_hint: Option<&str>,
        sink: Option<&dyn ReportSink>,
    ) -> Result<ExportOutcome> {
        let (subject, snapshot) = self.with_session(session_id, |session| {
            Ok((session.subject.clone(), session.store.snapshot()))
        })?;

        if snapshot.is_empty() {
            warn!(session_id = %session_id, "Export refused: no validated fields");
            return Err(AppError::EmptyExport);
        }

        let report = report_exporter::build_report(
            subject.product_id,
            subject.product_name.as_deref(),
            snapshot,
        );

        match sink {
            Some(sink) => {
                let delivered = report_exporter::download_report(&report, filename_hint, sink)?;
                Ok(ExportOutcome {
                    filename: delivered.filename.clone(),
                    contents: delivered.contents.clone(),
                    report,
                    delivered: Some(delivered),
                })
            }
            None => {
                let contents = report_exporter::render_report(&report)?;
                let filename = report_exporter::resolve_filename(
                    filename_hint,
                    report.product_id,
                    chrono::Utc::now(),
                );
                Ok(ExportOutcome {
                    report,
                    filename,
                    contents,
                    delivered: None,
                })
            }
        }
    }

    fn with_session<T>(
        &self,
        session_id: &str,
        action: impl FnOnce(&mut ValidationSession) -> Result<T>,
    ) -> Result<T> {
        let mut sessions = self.lock()?;
        let now = Instant::now();
        let expired = sessions
            .get(session_id)
            .ok_or_else(|| session_not_found(session_id))?
            .is_expired(now, self.ttl);
        if expired {
            sessions.remove(session_id);
            info!(session_id = %session_id, "Validation session expired");
            return Err(session_not_found(session_id));
        }

        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| session_not_found(session_id))?;
        session.last_touched = now;
        action(session)
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, ValidationSession>>> {
        self.sessions
            .lock()
            .map_err(|_| AppError::Internal("Validation session registry lock poisoned".to_string()))
    }
}

fn view_of(session_id: &str, session: &ValidationSession) -> SessionView {
    SessionView {
        session_id: session_id.to_string(),
        subject: session.subject.clone(),
        summary: session.store.summary(),
        results: session.store.snapshot(),
        notes: session
            .store
            .notes()
            .into_iter()
            .map(|(field, record)| ValidationNote {
                field: field.to_string(),
                record: record.clone(),
            })
            .collect(),
    }
}

fn session_not_found(session_id: &str) -> AppError {
    AppError::NotFound(format!("Validation session {}", session_id))
}
