//! Record transformation for SES engagement events delivered through Firehose.
//!
//! Each record is decoded from base64 JSON, projected onto a fixed reference
//! template, and re-encoded as a newline-terminated JSON line. The crate is
//! runtime-agnostic: the Lambda adapter owns the event loop, this crate only
//! provides pure functions over in-memory batches.

pub mod codec;
pub mod error;
pub mod processor;
pub mod record;
pub mod template;

pub use codec::{decode_payload, encode_record, DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT};
pub use error::{RecordError, TransformError};
pub use processor::{
    FailurePolicy, FirehoseEvent, FirehoseRecord, FirehoseResponse, FirehoseResponseRecord,
    RecordStatus, TransformOptions, Transformer,
};
pub use record::RecordValue;
pub use template::Template;
