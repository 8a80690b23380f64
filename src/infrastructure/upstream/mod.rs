use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::{info, warn};
use url::Url;

use crate::domain::error::{AppError, Result};
use crate::infrastructure::config::UpstreamConfig;

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl ForwardMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForwardMethod::Get => "GET",
            ForwardMethod::Post => "POST",
            ForwardMethod::Put => "PUT",
            ForwardMethod::Patch => "PATCH",
            ForwardMethod::Delete => "DELETE",
        }
    }

    /// Only these methods forward a request body.
    pub fn carries_body(&self) -> bool {
        matches!(
            self,
            ForwardMethod::Post | ForwardMethod::Put | ForwardMethod::Patch
        )
    }

    fn to_reqwest(self) -> reqwest::Method {
        match self {
            ForwardMethod::Get => reqwest::Method::GET,
            ForwardMethod::Post => reqwest::Method::POST,
            ForwardMethod::Put => reqwest::Method::PUT,
            ForwardMethod::Patch => reqwest::Method::PATCH,
            ForwardMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for ForwardMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ForwardMethod {
    type Err = AppError;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_ascii_uppercase().as_str() {
            "GET" => Ok(ForwardMethod::Get),
            "POST" => Ok(ForwardMethod::Post),
            "PUT" => Ok(ForwardMethod::Put),
            "PATCH" => Ok(ForwardMethod::Patch),
            "DELETE" => Ok(ForwardMethod::Delete),
            other => Err(AppError::ValidationError(format!(
                "Method {} is not forwarded",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub method: ForwardMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<String>,
}

impl ForwardRequest {
    pub fn get(path: impl Into<String>, query: Vec<(String, String)>) -> Self {
        Self {
            method: ForwardMethod::Get,
            path: path.into(),
            query,
            body: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamBody {
    Json(Value),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: UpstreamBody,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait UpstreamApi: Send + Sync {
    async fn forward(&self, request: ForwardRequest) -> Result<UpstreamResponse>;
}

pub struct UpstreamClient {
    client: reqwest::Client,
    config: UpstreamConfig,
}

impl UpstreamClient {
    pub fn new(config: UpstreamConfig) -> Result<Self> {
        config.ensure_valid()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut api_key = HeaderValue::from_str(&config.api_key).map_err(|err| {
            AppError::ConfigError(format!("IV_API_KEY is not a valid header value: {}", err))
        })?;
        api_key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, api_key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| AppError::Internal(format!("Failed to build HTTP client: {}", err)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    /// `<base>/<path>` with every query pair appended in order.
    pub fn target_url(&self, path: &str, query: &[(String, String)]) -> Result<Url> {
        let joined = format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let mut url = Url::parse(&joined)
            .map_err(|err| AppError::ValidationError(format!("Invalid target URL {}: {}", joined, err)))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl UpstreamApi for UpstreamClient {
    async fn forward(&self, request: ForwardRequest) -> Result<UpstreamResponse> {
        let url = self.target_url(&request.path, &request.query)?;
        if self.config.enable_logging {
            info!(method = %request.method, url = %url, "[API Proxy] forwarding request");
        }

        let mut builder = self.client.request(request.method.to_reqwest(), url.clone());
        if request.method.carries_body() {
            if let Some(body) = request.body.filter(|body| !body.is_empty()) {
                builder = builder.body(body);
            }
        }

        let response = builder.send().await.map_err(|err| {
            warn!(error = %err, url = %url, "Upstream request failed");
            AppError::from(err)
        })?;

        let status = response.status().as_u16();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.contains("application/json"))
            .unwrap_or(false);

        let text = response.text().await.map_err(AppError::from)?;
        let body = if is_json && !text.trim().is_empty() {
            UpstreamBody::Json(serde_json::from_str(&text).map_err(|err| {
                AppError::ParseError(format!("Upstream returned invalid JSON: {}", err))
            })?)
        } else {
            UpstreamBody::Text(text)
        };

        if self.config.enable_logging {
            info!(status, url = %url, "[API Proxy] response received");
        }

        Ok(UpstreamResponse { status, body })
    }
}
