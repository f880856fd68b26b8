use thiserror::Error;

/// Failure to turn one encoded payload into a projected record.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("payload is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("payload is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("record nesting exceeds the limit of {limit} levels")]
    DepthLimitExceeded { limit: usize },

    #[error("template must be a JSON object, found {found}")]
    TemplateNotObject { found: &'static str },

    #[error("failed to serialize merged record: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl TransformError {
    /// Short classification used in structured log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidBase64(_) => "InvalidBase64",
            Self::InvalidJson(_) => "InvalidJson",
            Self::DepthLimitExceeded { .. } => "DepthLimitExceeded",
            Self::TemplateNotObject { .. } => "TemplateNotObject",
            Self::Serialize(_) => "Serialize",
        }
    }
}

/// A [`TransformError`] tied to the Firehose record that produced it.
#[derive(Debug, Error)]
#[error("record {record_id}: {source}")]
pub struct RecordError {
    pub record_id: String,
    #[source]
    pub source: TransformError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;

    #[test]
    fn test_error_kinds() {
        let err = base64::engine::general_purpose::STANDARD
            .decode("!!!")
            .unwrap_err();
        let err = TransformError::from(err);
        assert_eq!(err.kind(), "InvalidBase64");

        let err = TransformError::DepthLimitExceeded { limit: 4 };
        assert_eq!(err.kind(), "DepthLimitExceeded");
        assert!(err.to_string().contains('4'));

        let err = TransformError::TemplateNotObject { found: "array" };
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn test_record_error_message() {
        let err = RecordError {
            record_id: "49546986683135544286507457936321625675700192471156785154".into(),
            source: TransformError::DepthLimitExceeded { limit: 2 },
        };
        let message = err.to_string();
        assert!(message.starts_with("record 4954698668"));
        assert!(message.contains("2 levels"));
    }
}
