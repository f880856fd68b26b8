// Reference template and the merge that projects records onto it
//
// The template's top-level keys form a flat namespace of field names. A field
// is matched wherever it appears in the record, at any depth; nested template
// values are opaque defaults and are never searched.

use serde_json::{Map, Value as JsonValue};
use std::str::FromStr;

use crate::error::TransformError;
use crate::record::RecordValue;

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    fields: Map<String, JsonValue>,
}

impl Template {
    pub fn from_fields(fields: Map<String, JsonValue>) -> Self {
        Self { fields }
    }

    /// Build a template from a parsed JSON document, which must be an object.
    pub fn from_value(value: JsonValue) -> Result<Self, TransformError> {
        match value {
            JsonValue::Object(fields) => Ok(Self { fields }),
            other => Err(TransformError::TemplateNotObject {
                found: json_kind(&other),
            }),
        }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, TransformError> {
        let value = serde_json::from_slice(bytes).map_err(TransformError::InvalidJson)?;
        Self::from_value(value)
    }

    pub fn fields(&self) -> &Map<String, JsonValue> {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Project `record` onto a fresh copy of the template.
    ///
    /// The result always has exactly the template's keys, in template order.
    /// Record entries are visited depth first in document order and the last
    /// scalar seen for a field wins. The template itself is left untouched.
    pub fn merge(&self, record: &RecordValue) -> Map<String, JsonValue> {
        let mut merged = self.fields.clone();
        overlay(&mut merged, record);
        merged
    }
}

impl FromStr for Template {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_slice(s.as_bytes())
    }
}

fn overlay(target: &mut Map<String, JsonValue>, record: &RecordValue) {
    match record {
        RecordValue::Mapping(entries) => {
            for (key, value) in entries {
                match value {
                    RecordValue::Mapping(_) => overlay(target, value),
                    RecordValue::Scalar(scalar) => {
                        if let Some(slot) = target.get_mut(key) {
                            *slot = scalar.clone();
                        }
                    }
                }
            }
        }
        // A bare scalar record is malformed input. A string naming a template
        // field is written to that field; anything else is ignored.
        RecordValue::Scalar(JsonValue::String(key)) => {
            if let Some(slot) = target.get_mut(key.as_str()) {
                *slot = JsonValue::String(key.clone());
            }
        }
        RecordValue::Scalar(_) => {}
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
