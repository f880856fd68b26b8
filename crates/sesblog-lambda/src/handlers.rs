// Firehose invocation handling
//
// Thin layer between the Lambda event and the transformer: adds invocation
// context to the logs and leaves all record semantics to sesblog-core.

use sesblog_core::{FirehoseEvent, FirehoseResponse, RecordError};

use crate::LambdaState;

pub(crate) fn handle_firehose(
    event: &FirehoseEvent,
    state: &LambdaState,
) -> Result<FirehoseResponse, RecordError> {
    let span = tracing::info_span!(
        "firehose_invocation",
        invocation_id = event.invocation_id.as_deref().unwrap_or("unknown"),
        delivery_stream = event.delivery_stream_arn.as_deref().unwrap_or("unknown"),
        records = event.records.len(),
    );
    let _enter = span.enter();

    state.transformer.transform_batch(event)
}
