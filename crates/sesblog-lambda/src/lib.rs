// AWS Lambda runtime adapter
//
// Serves Firehose data-transformation invocations. Configuration and the
// reference template are loaded once per cold start; every invocation shares
// the same immutable template through the transformer.

use lambda_runtime::{service_fn, Error, LambdaEvent};
use sesblog_config::RuntimeConfig;
use sesblog_core::{FirehoseEvent, FirehoseResponse, Template, TransformOptions, Transformer};
use std::sync::Arc;

mod handlers;
mod init;

pub use init::{init_tracing, load_template};

/// Lambda handler for Firehose transformation events
async fn handle_request(
    event: LambdaEvent<FirehoseEvent>,
    state: Arc<LambdaState>,
) -> Result<FirehoseResponse, Error> {
    let (request, context) = event.into_parts();
    tracing::debug!(request_id = %context.request_id, "Received transformation request");

    Ok(handlers::handle_firehose(&request, &state)?)
}

#[derive(Debug, Clone)]
pub(crate) struct LambdaState {
    pub transformer: Transformer,
}

impl LambdaState {
    pub(crate) fn new(template: Template, options: TransformOptions) -> Self {
        Self {
            transformer: Transformer::new(Arc::new(template), options),
        }
    }
}

/// Lambda runtime entry point
pub async fn run() -> Result<(), Error> {
    let config = RuntimeConfig::load()
        .map_err(|e| Error::from(format!("Failed to load configuration: {:#}", e)))?;
    init_tracing(&config);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        git_hash = env!("GIT_HASH"),
        built_at = env!("BUILD_TIMESTAMP"),
        "Starting SES record transformer"
    );

    let template = load_template(&config.template)
        .map_err(|e| Error::from(format!("Failed to load template: {:#}", e)))?;
    let options = config.transform.options();
    tracing::info!(
        fields = template.len(),
        max_depth = options.max_depth,
        failure_policy = %options.failure_policy,
        "Template loaded"
    );

    let state = Arc::new(LambdaState::new(template, options));

    lambda_runtime::run(service_fn(move |event: LambdaEvent<FirehoseEvent>| {
        let state = state.clone();
        async move { handle_request(event, state).await }
    }))
    .await
}
