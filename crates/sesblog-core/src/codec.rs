//! Payload codec for Firehose records.
//!
//! Firehose hands records to the transformation function as base64 text and
//! expects the same encoding back. Output records are newline-terminated so
//! the delivered objects are JSON Lines.

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use serde_json::{Map, Value as JsonValue};

use crate::error::TransformError;
use crate::record::RecordValue;

/// Object nesting accepted in a record when no limit is configured
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Largest usable object nesting limit.
///
/// serde_json refuses documents nested 128 containers deep, so any larger
/// guard would never fire.
pub const MAX_DEPTH_LIMIT: usize = 127;

/// Decode a base64 JSON payload into a tagged record.
///
/// `max_depth` is clamped to [`MAX_DEPTH_LIMIT`]. Nesting is checked on the
/// raw text before parsing, so an over-deep record fails with
/// `DepthLimitExceeded` however deep it goes. Arrays do not count toward the
/// object depth but still count toward the parser's own limit.
pub fn decode_payload(data: &str, max_depth: usize) -> Result<RecordValue, TransformError> {
    let max_depth = max_depth.min(MAX_DEPTH_LIMIT);
    let bytes = BASE64_STANDARD.decode(data.trim().as_bytes())?;
    if exceeds_object_depth(&bytes, max_depth) {
        return Err(TransformError::DepthLimitExceeded { limit: max_depth });
    }
    let value: JsonValue = serde_json::from_slice(&bytes).map_err(TransformError::InvalidJson)?;
    RecordValue::from_json(value, max_depth)
}

// Brackets inside string literals are skipped. Malformed text is left for the
// parser to reject.
fn exceeds_object_depth(bytes: &[u8], max_depth: usize) -> bool {
    let mut open: Vec<bool> = Vec::new();
    let mut objects = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for &byte in bytes {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => {
                open.push(true);
                objects += 1;
                if objects > max_depth {
                    return true;
                }
            }
            b'[' => open.push(false),
            b'}' | b']' => {
                if open.pop() == Some(true) {
                    objects -= 1;
                }
            }
            _ => {}
        }
    }
    false
}

/// Serialize a merged record as one JSON line and base64-encode it.
pub fn encode_record(record: &Map<String, JsonValue>) -> Result<String, TransformError> {
    let mut line = serde_json::to_vec(record).map_err(TransformError::Serialize)?;
    line.push(b'\n');
    Ok(BASE64_STANDARD.encode(line))
}
