use std::sync::Arc;

use serde_json::Value;
use tracing::error;

use crate::domain::error::{AppError, Result};
use crate::domain::product::{EntityKind, ProductFilters};
use crate::infrastructure::upstream::{ForwardRequest, UpstreamApi, UpstreamBody};

pub const PRODUCTS_ENDPOINT: &str = "products";

/// Read-only access to the upstream product API. Records stay opaque JSON.
pub struct ProductCatalog {
    upstream: Arc<dyn UpstreamApi>,
}

impl ProductCatalog {
    pub fn new(upstream: Arc<dyn UpstreamApi>) -> Self {
        Self { upstream }
    }

    pub async fn list_products(&self, filters: &ProductFilters) -> Result<Vec<Value>> {
        let value = self
            .get_json(PRODUCTS_ENDPOINT, filters.to_query_pairs())
            .await?;
        into_list(value)
    }

    pub async fn get_product(&self, product_id: i64) -> Result<Value> {
        self.get_json(&format!("{}/{}", PRODUCTS_ENDPOINT, product_id), Vec::new())
            .await
    }

    pub async fn list_entities(&self, kind: EntityKind, product_id: i64) -> Result<Vec<Value>> {
        let value = self
            .get_json(
                kind.endpoint(),
                vec![("product_id".to_string(), product_id.to_string())],
            )
            .await?;
        into_list(value)
    }

    pub async fn list_departures(&self, product_id: i64) -> Result<Vec<Value>> {
        self.list_entities(EntityKind::Departure, product_id).await
    }

    pub async fn list_itineraries(&self, product_id: i64) -> Result<Vec<Value>> {
        self.list_entities(EntityKind::ItineraryDay, product_id).await
    }

    pub async fn list_media_assets(&self, product_id: i64) -> Result<Vec<Value>> {
        self.list_entities(EntityKind::MediaAsset, product_id).await
    }

    async fn get_json(&self, path: &str, query: Vec<(String, String)>) -> Result<Value> {
        let response = self
            .upstream
            .forward(ForwardRequest::get(path, query))
            .await
            .map_err(|err| {
                error!(error = %err, path = %path, "Catalog fetch failed");
                err
            })?;

        if !response.is_success() {
            let message = match &response.body {
                UpstreamBody::Json(value) => value
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| value.to_string()),
                UpstreamBody::Text(text) => text.clone(),
            };
            return Err(AppError::Upstream {
                status: response.status,
                message,
            });
        }

        match response.body {
            UpstreamBody::Json(value) => Ok(value),
            UpstreamBody::Text(text) => Err(AppError::ParseError(format!(
                "Expected JSON from /{}, got text: {}",
                path,
                text.chars().take(120).collect::<String>()
            ))),
        }
    }
}

/// Accepts either a bare array or an object wrapping it under `data`.
fn into_list(value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(AppError::ParseError(
                "Invalid response format: missing data array".to_string(),
            )),
        },
        _ => Err(AppError::ParseError(
            "Invalid response format: expected a list".to_string(),
        )),
    }
}

/// Case-insensitive match on `product_name` or `country`. An empty query
/// keeps every product.
pub fn filter_local<'a>(products: &'a [Value], query: &str) -> Vec<&'a Value> {
    let needle = query.trim().to_lowercase();
    products
        .iter()
        .filter(|product| {
            if needle.is_empty() {
                return true;
            }
            ["product_name", "country"].iter().any(|key| {
                product
                    .get(*key)
                    .and_then(Value::as_str)
                    .map(|text| text.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
        })
        .collect()
}
