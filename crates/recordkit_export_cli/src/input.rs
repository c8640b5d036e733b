//! JSON adapter: record documents and resolver tables → export models.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use recordkit_export_xlsx::{
    EnumRawValue, MapFileResolver, MapTermResolver, SpecFieldDescriptor, SpecFieldSettings,
    SpecRecord,
};
use serde::Deserialize;
use serde_json::Value;

/// Keys probed, in order, when a field item is an object.
const TUP_ITEM_VALUE_KEYS: [&str; 4] = ["value", "target_id", "fid", "url"];

#[derive(Debug, Deserialize)]
struct InputRecord {
    id: Value,
    #[serde(default)]
    title: String,
    #[serde(alias = "bundle")]
    category: String,
    #[serde(default)]
    fields: Vec<InputField>,
}

#[derive(Debug, Deserialize)]
struct InputField {
    name: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(rename = "type")]
    type_tag: String,
    #[serde(default)]
    settings: InputFieldSettings,
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Default, Deserialize)]
struct InputFieldSettings {
    #[serde(default)]
    target_type: Option<String>,
    #[serde(default)]
    target_bundles: Vec<String>,
}

/// Resolver tables: file id → URL and term id → name.
#[derive(Debug, Default, Deserialize)]
pub struct InputResolvers {
    #[serde(default)]
    files: BTreeMap<String, String>,
    #[serde(default)]
    terms: BTreeMap<String, String>,
}

impl InputResolvers {
    /// Split into map-backed resolvers.
    pub fn into_resolvers(self) -> (MapFileResolver, MapTermResolver) {
        (
            MapFileResolver::from(self.files),
            MapTermResolver::from(self.terms),
        )
    }
}

/// Parse a record document.
pub fn parse_record(text: &str) -> Result<SpecRecord> {
    let input: InputRecord = serde_json::from_str(text).context("Invalid record JSON")?;
    let c_id = match &input.id {
        Value::String(val) => val.clone(),
        Value::Number(val) => val.to_string(),
        other => bail!("Record id must be a string or number, got {other}"),
    };

    let mut record = SpecRecord::new(c_id, input.title, input.category);
    for field in input.fields {
        let mut descriptor = SpecFieldDescriptor::new(field.name, field.type_tag);
        descriptor.label = field.label;
        descriptor.settings = SpecFieldSettings {
            target_type: field.settings.target_type,
            target_bundles: field.settings.target_bundles,
        };
        record.push_field(descriptor, derive_raw_value(&field.value));
    }
    Ok(record)
}

/// Parse resolver tables.
pub fn parse_resolvers(text: &str) -> Result<InputResolvers> {
    serde_json::from_str(text).context("Invalid resolver JSON")
}

/// Read and parse a record file.
pub fn load_record(path: &Path) -> Result<SpecRecord> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read record file {}", path.display()))?;
    parse_record(&text).with_context(|| format!("Failed to load {}", path.display()))
}

/// Read and parse a resolver file; empty tables when `path` is `None`.
pub fn load_resolvers(path: Option<&Path>) -> Result<InputResolvers> {
    let Some(path) = path else {
        return Ok(InputResolvers::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read resolver file {}", path.display()))?;
    parse_resolvers(&text).with_context(|| format!("Failed to load {}", path.display()))
}

/// Convert a JSON field value; item objects contribute their main property.
pub fn derive_raw_value(value: &Value) -> EnumRawValue {
    match value {
        Value::Null => EnumRawValue::Null,
        Value::Bool(val) => EnumRawValue::Boolean(*val),
        Value::Number(val) => match val.as_i64() {
            Some(n) => EnumRawValue::Integer(n),
            None => val
                .as_f64()
                .map(EnumRawValue::Float)
                .unwrap_or(EnumRawValue::Null),
        },
        Value::String(val) => EnumRawValue::String(val.clone()),
        Value::Array(items) => EnumRawValue::List(items.iter().map(derive_raw_value).collect()),
        Value::Object(dict_item) => TUP_ITEM_VALUE_KEYS
            .iter()
            .find_map(|c_key| dict_item.get(*c_key))
            .map(derive_raw_value)
            .unwrap_or(EnumRawValue::Null),
    }
}
