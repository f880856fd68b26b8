// Batch transformation of Firehose records
//
// Wire types follow the Firehose data-transformation contract. They are
// defined here rather than taken from an events crate so that payloads stay
// plain strings until the per-record decode step, which is what lets one bad
// record fail on its own instead of failing event deserialization.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

use crate::codec::{decode_payload, encode_record, DEFAULT_MAX_DEPTH};
use crate::error::{RecordError, TransformError};
use crate::template::Template;

/// Transformation invocation sent by Firehose
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirehoseEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_stream_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default)]
    pub records: Vec<FirehoseRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirehoseRecord {
    pub record_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approximate_arrival_timestamp: Option<i64>,
    /// Base64 payload; empty for connectivity probes
    #[serde(default)]
    pub data: String,
}

impl FirehoseRecord {
    pub fn is_probe(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FirehoseResponse {
    pub records: Vec<FirehoseResponseRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirehoseResponseRecord {
    pub record_id: String,
    pub result: RecordStatus,
    pub data: String,
}

impl FirehoseResponseRecord {
    pub fn ok(record_id: impl Into<String>, data: String) -> Self {
        Self {
            record_id: record_id.into(),
            result: RecordStatus::Ok,
            data,
        }
    }

    pub fn failed(record_id: impl Into<String>, data: String) -> Self {
        Self {
            record_id: record_id.into(),
            result: RecordStatus::ProcessingFailed,
            data,
        }
    }
}

/// Per-record result reported back to Firehose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordStatus {
    Ok,
    /// Defined by Firehose; never produced by this transformer
    Dropped,
    ProcessingFailed,
}

/// What to do when a single record cannot be transformed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Abort the whole invocation on the first bad record
    Strict,
    /// Mark the record `ProcessingFailed`, echo its payload, keep going
    #[default]
    Isolate,
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailurePolicy::Strict => write!(f, "strict"),
            FailurePolicy::Isolate => write!(f, "isolate"),
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(FailurePolicy::Strict),
            "isolate" | "isolated" => Ok(FailurePolicy::Isolate),
            _ => Err(format!(
                "Unsupported failure policy: {}. Supported: strict, isolate",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformOptions {
    pub max_depth: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// Projects Firehose batches onto a shared, immutable template.
#[derive(Debug, Clone)]
pub struct Transformer {
    template: Arc<Template>,
    options: TransformOptions,
}

impl Transformer {
    pub fn new(template: Arc<Template>, options: TransformOptions) -> Self {
        Self { template, options }
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn options(&self) -> TransformOptions {
        self.options
    }

    /// Decode, merge and re-encode one payload.
    pub fn transform_payload(&self, data: &str) -> Result<String, TransformError> {
        let record = decode_payload(data, self.options.max_depth)?;
        let merged = self.template.merge(&record);
        encode_record(&merged)
    }

    /// Transform every non-probe record, keeping input order.
    ///
    /// Under [`FailurePolicy::Strict`] the first failing record aborts the
    /// batch; under [`FailurePolicy::Isolate`] it is reported as
    /// `ProcessingFailed` with its original data.
    pub fn transform_batch(&self, event: &FirehoseEvent) -> Result<FirehoseResponse, RecordError> {
        let mut records = Vec::with_capacity(event.records.len());
        let mut failed = 0usize;
        let probes = event.records.iter().filter(|r| r.is_probe()).count();

        for record in event.records.iter().filter(|r| !r.is_probe()) {
            match self.transform_payload(&record.data) {
                Ok(data) => records.push(FirehoseResponseRecord::ok(&record.record_id, data)),
                Err(err) => match self.options.failure_policy {
                    FailurePolicy::Strict => {
                        tracing::error!(
                            record_id = %record.record_id,
                            error_kind = err.kind(),
                            "Failed to transform record: {}",
                            err
                        );
                        return Err(RecordError {
                            record_id: record.record_id.clone(),
                            source: err,
                        });
                    }
                    FailurePolicy::Isolate => {
                        tracing::warn!(
                            record_id = %record.record_id,
                            error_kind = err.kind(),
                            "Marking record as ProcessingFailed: {}",
                            err
                        );
                        failed += 1;
                        records.push(FirehoseResponseRecord::failed(
                            &record.record_id,
                            record.data.clone(),
                        ));
                    }
                },
            }
        }

        tracing::info!(
            processed = records.len() - failed,
            failed,
            probes,
            "Successfully processed {} records",
            records.len() - failed
        );

        Ok(FirehoseResponse { records })
    }
}
