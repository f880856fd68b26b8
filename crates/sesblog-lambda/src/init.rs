// Cold-start initialization
//
// Logging setup and reference template loading

use anyhow::{Context, Result};
use sesblog_config::{LogFormat, RuntimeConfig, TemplateConfig, TemplateSource};
use sesblog_core::Template;

/// Initialize tracing/logging from RuntimeConfig
pub fn init_tracing(config: &RuntimeConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // CloudWatch stamps every line already and does not render ANSI colours
    let layer = fmt::layer().with_ansi(false).without_time();

    // Try to set the global subscriber; ignore error if already set (idempotent)
    let _ = match config.logging.format {
        LogFormat::Json => tracing::subscriber::set_global_default(registry.with(layer.json())),
        LogFormat::Text => tracing::subscriber::set_global_default(registry.with(layer)),
    };
}

/// Read and parse the reference template named by the configuration
pub fn load_template(config: &TemplateConfig) -> Result<Template> {
    match config.source() {
        Some(TemplateSource::Inline(document)) => document
            .parse::<Template>()
            .context("Failed to parse inline template"),
        Some(TemplateSource::Path(path)) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read template file: {}", path))?;
            Template::from_slice(&bytes)
                .with_context(|| format!("Failed to parse template file: {}", path))
        }
        None => anyhow::bail!("No template source configured"),
    }
}
