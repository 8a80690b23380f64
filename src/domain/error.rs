use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum AppError {
    Internal(String),
    NotFound(String),
    ValidationError(String),
    ConfigError(String),
    EmptyExport,
    Upstream { status: u16, message: String },
    Timeout(String),
    ParseError(String),
    IoError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::EmptyExport => write!(
                f,
                "No validations to export. Mark at least one field before exporting."
            ),
            AppError::Upstream { status, message } => {
                write!(f, "Upstream API error ({}): {}", status, message)
            }
            AppError::Timeout(msg) => write!(f, "Request timeout: {}", msg),
            AppError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ParseError(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout(err.to_string())
        } else if let Some(status) = err.status() {
            AppError::Upstream {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            AppError::Internal(format!("Request failed: {}", err))
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_export_message_is_user_facing() {
        let message = AppError::EmptyExport.to_string();
        assert!(message.starts_with("No validations to export"));
    }

    #[test]
    fn test_upstream_display_includes_status() {
        let err = AppError::Upstream {
            status: 404,
            message: "Not Found".to_string(),
        };
        assert_eq!(err.to_string(), "Upstream API error (404): Not Found");
    }

    #[test]
    fn test_io_error_conversion() {
        let err: AppError = std::io::Error::new(std::io::ErrorKind::Other, "disk full").into();
        assert_eq!(err, AppError::IoError("disk full".to_string()));
    }
}
