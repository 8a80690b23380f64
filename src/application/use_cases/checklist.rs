use serde::Serialize;
use serde_json::Value;

use crate::domain::error::{AppError, Result};
use crate::domain::product::EntityKind;

const MISSING_VALUE: &str = "N/A";

struct SectionSpec {
    title: &'static str,
    optional: bool,
    fields: &'static [(&'static str, &'static str)],
}

const SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        title: "Basic Information",
        optional: false,
        fields: &[
            ("product_id", "Product ID"),
            ("product_name", "Product Name"),
            ("product_code", "Product Code"),
            ("status", "Status"),
            ("store", "Store"),
        ],
    },
    SectionSpec {
        title: "Tour Details",
        optional: false,
        fields: &[
            ("country", "Country"),
            ("length", "Length (days)"),
            ("pace", "Pace"),
            ("escorted_type", "Escorted Type"),
        ],
    },
    SectionSpec {
        title: "Pricing",
        optional: false,
        fields: &[
            ("lead_in_price", "Lead In Price"),
            ("regular_price", "Regular Price"),
            ("sales_price", "Sales Price"),
        ],
    },
    SectionSpec {
        title: "Destinations",
        optional: true,
        fields: &[("tour_places", "Destinations")],
    },
    SectionSpec {
        title: "Links & Media",
        optional: false,
        fields: &[
            ("product_url", "Product URL"),
            ("banner", "Banner Image"),
            ("cdn_link", "CDN Link"),
        ],
    },
];

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChecklistField {
    pub field: String,
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChecklistSection {
    pub title: String,
    pub fields: Vec<ChecklistField>,
}

/// Lays a product record out as the reviewable fields of the workspace.
/// Sections marked optional are skipped when none of their fields is present.
pub fn build_checklist(product: &Value) -> Result<Vec<ChecklistSection>> {
    let record = product.as_object().ok_or_else(|| {
        AppError::ValidationError("Product record must be a JSON object".to_string())
    })?;

    let sections = SECTIONS
        .iter()
        .filter(|spec| {
            !spec.optional || spec.fields.iter().any(|(key, _)| is_present(record.get(*key)))
        })
        .map(|spec| ChecklistSection {
            title: spec.title.to_string(),
            fields: spec
                .fields
                .iter()
                .map(|(key, label)| ChecklistField {
                    field: key.to_string(),
                    label: label.to_string(),
                    value: display_value(record.get(*key)),
                })
                .collect(),
        })
        .collect();

    Ok(sections)
}

/// One checklist entry per sub-entity, keyed `<prefix>_<id>`. Entities
/// without an `id` are skipped since they cannot be addressed stably.
pub fn entity_fields(kind: EntityKind, entities: &[Value]) -> Vec<ChecklistField> {
    entities
        .iter()
        .filter_map(|entity| {
            let id = entity.get("id").filter(|id| is_present(Some(id)))?;
            let id = display_value(Some(id));
            let label = ["name", "title", "departure_date", "url"]
                .iter()
                .find_map(|key| entity.get(*key).and_then(Value::as_str))
                .map(str::to_string)
                .unwrap_or_else(|| format!("{} {}", kind.key_prefix(), id));
            Some(ChecklistField {
                field: kind.field_key(&id),
                label,
                value: display_value(Some(entity)),
            })
        })
        .collect()
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(text)) => !text.is_empty(),
        Some(_) => true,
    }
}

fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => MISSING_VALUE.to_string(),
        Some(Value::String(text)) if text.is_empty() => MISSING_VALUE.to_string(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(other) => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}
