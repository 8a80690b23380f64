use serde::{Deserialize, Serialize};

pub const MAX_PAGE_SIZE: u32 = 100;

/// Product currently under validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub product_id: Option<i64>,
    pub product_name: Option<String>,
}

/// Listing filters forwarded to the upstream `/products` endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilters {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub store: Option<String>,
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

impl ProductFilters {
    /// Query pairs in upstream naming, for the filters the caller supplied.
    /// Blank strings are dropped and a supplied page size is clamped to
    /// `1..=MAX_PAGE_SIZE`.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        let text_filters = [
            ("search", &self.search),
            ("category", &self.category),
            ("status", &self.status),
            ("store", &self.store),
        ];
        for (key, value) in text_filters {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                pairs.push((key.to_string(), value.to_string()));
            }
        }
        if let Some(min_price) = self.min_price {
            pairs.push(("minPrice".to_string(), min_price.to_string()));
        }
        if let Some(max_price) = self.max_price {
            pairs.push(("maxPrice".to_string(), max_price.to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.max(1).to_string()));
        }
        if let Some(per_page) = self.per_page {
            pairs.push(("perPage".to_string(), per_page.clamp(1, MAX_PAGE_SIZE).to_string()));
        }
        pairs
    }
}

/// Repeatable sub-entities of a product. Each instance is validated under a
/// namespaced key, see [`EntityKind::field_key`]. The serialized slug is the
/// upstream endpoint name and is used by every route that names a kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EntityKind {
    #[serde(rename = "departures")]
    Departure,
    #[serde(rename = "itineraries")]
    ItineraryDay,
    #[serde(rename = "media-assets")]
    MediaAsset,
}

impl EntityKind {
    pub fn key_prefix(&self) -> &'static str {
        match self {
            EntityKind::Departure => "departure",
            EntityKind::ItineraryDay => "itinerary_day",
            EntityKind::MediaAsset => "media",
        }
    }

    pub fn endpoint(&self) -> &'static str {
        match self {
            EntityKind::Departure => "departures",
            EntityKind::ItineraryDay => "itineraries",
            EntityKind::MediaAsset => "media-assets",
        }
    }

    pub fn field_key(&self, id: impl std::fmt::Display) -> String {
        format!("{}_{}", self.key_prefix(), id)
    }
}
