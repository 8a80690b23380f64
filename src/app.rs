use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::infrastructure::bootstrap::build_state;
use crate::infrastructure::config::AppConfig;
use crate::interfaces::http::{add_log, start_server};

pub async fn run() -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let config = AppConfig::load().map_err(|err| {
        error!(error = %err, "Failed to load configuration");
        std::io::Error::new(std::io::ErrorKind::InvalidInput, err.to_string())
    })?;
    info!(config = ?config, "Configuration loaded");

    let host = config.server_host.clone();
    let port = config.server_port;
    let state = build_state(&config);
    let logs = state.logs.clone();

    let server = start_server(state, &host, port).map_err(|err| {
        error!(error = %err, host = %host, port, "Failed to bind HTTP server");
        err
    })?;

    add_log(
        &logs,
        "INFO",
        "System",
        &format!("HTTP server started on {}:{}", host, port),
    );
    info!(host = %host, port, "HTTP server started");

    server.await
}
