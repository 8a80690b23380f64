mod error;
mod products;
mod proxy;
mod validation;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use actix_cors::Cors;
use actix_web::error::InternalError;
use actix_web::{dev::Server, get, web, App, HttpResponse, HttpServer, Responder};
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::application::{ProductCatalog, WorkspaceRegistry};
use crate::domain::error::{AppError, Result};
use crate::infrastructure::storage::ReportSink;
use crate::infrastructure::upstream::UpstreamApi;

pub use error::ErrorBody;

const MAX_LOG_ENTRIES: usize = 100;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

pub type SharedLogs = Arc<Mutex<VecDeque<LogEntry>>>;

pub struct HttpState {
    pub upstream: std::result::Result<Arc<dyn UpstreamApi>, AppError>,
    pub workspaces: WorkspaceRegistry,
    pub report_sink: Option<Arc<dyn ReportSink>>,
    pub logs: SharedLogs,
    pub enable_api_logging: bool,
}

impl HttpState {
    pub fn upstream(&self) -> Result<Arc<dyn UpstreamApi>> {
        self.upstream.clone()
    }

    pub fn catalog(&self) -> Result<ProductCatalog> {
        self.upstream().map(ProductCatalog::new)
    }
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    let logs: Vec<LogEntry> = match data.logs.lock() {
        Ok(logs) => logs.iter().cloned().collect(),
        Err(_) => Vec::new(),
    };
    HttpResponse::Ok().json(logs)
}

/// Registers every `/api` route. Shared by the server and the handler tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        let body = ErrorBody::new("Invalid request", err.to_string());
        InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    });

    let path_config = web::PathConfig::default().error_handler(|err, _req| {
        let body = ErrorBody::new("Not found", err.to_string());
        InternalError::from_response(err, HttpResponse::NotFound().json(body)).into()
    });

    cfg.app_data(json_config).app_data(path_config).service(
        web::scope("/api")
            .configure(proxy::configure)
            .configure(validation::configure)
            .configure(products::configure)
            .service(get_logs),
    );
}

pub fn add_log_entry(logs: &SharedLogs, level: &str, source: &str, message: &str) -> LogEntry {
    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    if let Ok(mut logs) = logs.lock() {
        logs.push_back(entry.clone());
        while logs.len() > MAX_LOG_ENTRIES {
            logs.pop_front();
        }
    }
    entry
}

pub fn add_log(logs: &SharedLogs, level: &str, source: &str, message: &str) {
    add_log_entry(logs, level, source, message);
}

pub fn start_server(state: HttpState, host: &str, port: u16) -> std::io::Result<Server> {
    let state = web::Data::new(state);

    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // Allow all origins for local tool

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((host, port))?
    .run();

    Ok(server)
}
