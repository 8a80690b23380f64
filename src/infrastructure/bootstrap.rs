use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tracing::{error, info, warn};

use crate::application::WorkspaceRegistry;
use crate::domain::error::AppError;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::storage::{ensure_reports_dir, DirectorySink, ReportSink};
use crate::infrastructure::upstream::{UpstreamApi, UpstreamClient};
use crate::interfaces::http::{add_log, HttpState, SharedLogs};

/// Assembles the server state. A missing or invalid upstream config is kept
/// as an error so the server still starts and reports it per request.
pub fn build_state(config: &AppConfig) -> HttpState {
    let logs: SharedLogs = Arc::new(Mutex::new(VecDeque::new()));

    let upstream = connect_upstream(config, &logs);
    let report_sink = open_report_sink(config, &logs);

    HttpState {
        upstream,
        workspaces: WorkspaceRegistry::with_ttl(config.session_ttl()),
        report_sink,
        logs,
        enable_api_logging: config.enable_api_logging,
    }
}

fn connect_upstream(
    config: &AppConfig,
    logs: &SharedLogs,
) -> std::result::Result<Arc<dyn UpstreamApi>, AppError> {
    match UpstreamClient::new(config.upstream()) {
        Ok(client) => {
            info!(base_url = %config.api_base_url, timeout_ms = config.api_timeout, "Upstream API configured");
            add_log(
                logs,
                "INFO",
                "System",
                &format!("Upstream API: {}", config.api_base_url),
            );
            Ok(Arc::new(client))
        }
        Err(err) => {
            warn!(error = %err, "Upstream API unavailable; proxy and catalog calls will fail");
            add_log(logs, "WARN", "System", &err.to_string());
            Err(err)
        }
    }
}

fn open_report_sink(config: &AppConfig, logs: &SharedLogs) -> Option<Arc<dyn ReportSink>> {
    let dir = config.reports_dir.as_ref()?;
    match ensure_reports_dir(dir) {
        Ok(root) => {
            info!(reports_dir = %root.display(), "Reports will also be written to disk");
            Some(Arc::new(DirectorySink::new(root)))
        }
        Err(err) => {
            error!(
                error = %err,
                reports_dir = %dir.display(),
                "Failed to create reports dir"
            );
            add_log(
                logs,
                "ERROR",
                "System",
                &format!("Failed to create reports dir {}: {}", dir.display(), err),
            );
            None
        }
    }
}
