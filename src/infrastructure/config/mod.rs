use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::Validate;

use crate::domain::error::{AppError, Result};

pub const CONFIG_FILE: &str = "tour-validator.toml";
pub const ENV_PREFIX: &str = "IV_";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_SESSION_TTL_SECS: u64 = 8 * 60 * 60;

#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_base_url: String,
    pub api_key: String,
    pub api_timeout: u64,
    pub enable_api_logging: bool,
    pub server_host: String,
    pub server_port: u16,
    #[serde(default)]
    pub reports_dir: Option<PathBuf>,
    /// Idle time after which a validation session is discarded.
    pub session_ttl_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            api_key: String::new(),
            api_timeout: DEFAULT_TIMEOUT_MS,
            enable_api_logging: false,
            server_host: "127.0.0.1".to_string(),
            server_port: 3001,
            reports_dir: None,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_base_url", &self.api_base_url)
            .field("api_key", &redact(&self.api_key))
            .field("api_timeout", &self.api_timeout)
            .field("enable_api_logging", &self.enable_api_logging)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("reports_dir", &self.reports_dir)
            .field("session_ttl_secs", &self.session_ttl_secs)
            .finish()
    }
}

impl AppConfig {
    /// Loads `.env`, then layers defaults < `tour-validator.toml` < `IV_*` env
    /// vars < `ENABLE_API_LOGGING`.
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded .env file");
        }
        Self::from_figment(Self::figment())
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Env::raw().only(&["ENABLE_API_LOGGING"]))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        figment
            .extract()
            .map_err(|err| AppError::ConfigError(format!("Failed to load configuration: {}", err)))
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs.max(1))
    }

    pub fn upstream(&self) -> UpstreamConfig {
        UpstreamConfig {
            base_url: self.api_base_url.trim().to_string(),
            api_key: self.api_key.trim().to_string(),
            timeout_ms: self.api_timeout,
            enable_logging: self.enable_api_logging,
        }
    }
}

/// Everything the proxy needs to reach the upstream API.
#[derive(Clone, Validate)]
pub struct UpstreamConfig {
    #[validate(url(message = "IV_API_BASE_URL must be an absolute URL"))]
    pub base_url: String,
    #[validate(length(min = 1, message = "IV_API_KEY must not be empty"))]
    pub api_key: String,
    #[validate(range(min = 1, max = 600_000, message = "IV_API_TIMEOUT must be 1..=600000 ms"))]
    pub timeout_ms: u64,
    pub enable_logging: bool,
}

impl fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("timeout_ms", &self.timeout_ms)
            .field("enable_logging", &self.enable_logging)
            .finish()
    }
}

impl UpstreamConfig {
    pub fn ensure_valid(&self) -> Result<()> {
        self.validate()
            .map_err(|err| AppError::ConfigError(format!("Upstream API is not configured: {}", err)))
    }

    pub fn is_valid(&self) -> bool {
        self.ensure_valid().is_ok()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}
