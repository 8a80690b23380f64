use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};

use crate::domain::error::AppError;

/// `{ "error": ..., "message": ... }`, the body of every failed request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

fn error_label(err: &AppError) -> &'static str {
    match err {
        AppError::Internal(_) | AppError::IoError(_) => "Internal error",
        AppError::NotFound(_) => "Not found",
        AppError::ValidationError(_) => "Invalid request",
        AppError::ConfigError(_) => "Configuration error",
        AppError::EmptyExport => "Nothing to export",
        AppError::Upstream { .. } | AppError::ParseError(_) => "Upstream API error",
        AppError::Timeout(_) => "Request timeout",
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) | AppError::EmptyExport => StatusCode::BAD_REQUEST,
            AppError::Upstream { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|code| code.is_client_error() || code.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            AppError::ParseError(_) => StatusCode::BAD_GATEWAY,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Internal(_) | AppError::ConfigError(_) | AppError::IoError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(ErrorBody::new(error_label(self), self.to_string()))
    }
}
