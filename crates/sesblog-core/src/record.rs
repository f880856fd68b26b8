// Tagged representation of a decoded input record
//
// The merge only distinguishes mappings (JSON objects) from everything else,
// so the decoded JSON is folded into two variants at the parse boundary.
// Arrays count as scalars: they are copied whole, never searched.

use serde_json::Value as JsonValue;

use crate::error::TransformError;

#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    Scalar(JsonValue),
    /// Object entries in document order
    Mapping(Vec<(String, RecordValue)>),
}

impl RecordValue {
    /// Convert parsed JSON, rejecting objects nested deeper than `max_depth`.
    ///
    /// The root object counts as depth 1.
    pub fn from_json(value: JsonValue, max_depth: usize) -> Result<Self, TransformError> {
        from_json_at(value, 1, max_depth)
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, Self::Mapping(_))
    }

    /// Deepest level of object nesting; scalars are depth 0.
    pub fn depth(&self) -> usize {
        match self {
            Self::Scalar(_) => 0,
            Self::Mapping(entries) => {
                1 + entries
                    .iter()
                    .map(|(_, value)| value.depth())
                    .max()
                    .unwrap_or(0)
            }
        }
    }
}

fn from_json_at(
    value: JsonValue,
    depth: usize,
    max_depth: usize,
) -> Result<RecordValue, TransformError> {
    match value {
        JsonValue::Object(map) => {
            if depth > max_depth {
                return Err(TransformError::DepthLimitExceeded { limit: max_depth });
            }
            let entries = map
                .into_iter()
                .map(|(key, child)| Ok((key, from_json_at(child, depth + 1, max_depth)?)))
                .collect::<Result<Vec<_>, TransformError>>()?;
            Ok(RecordValue::Mapping(entries))
        }
        JsonValue::Array(items) => {
            for item in &items {
                check_array_item(item, depth, max_depth)?;
            }
            Ok(RecordValue::Scalar(JsonValue::Array(items)))
        }
        other => Ok(RecordValue::Scalar(other)),
    }
}

// Arrays stay scalars but objects inside them still count toward the depth.
fn check_array_item(
    value: &JsonValue,
    depth: usize,
    max_depth: usize,
) -> Result<(), TransformError> {
    match value {
        JsonValue::Object(map) => {
            if depth > max_depth {
                return Err(TransformError::DepthLimitExceeded { limit: max_depth });
            }
            map.values()
                .try_for_each(|child| check_array_item(child, depth + 1, max_depth))
        }
        JsonValue::Array(items) => items
            .iter()
            .try_for_each(|item| check_array_item(item, depth, max_depth)),
        _ => Ok(()),
    }
}
