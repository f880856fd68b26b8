// Configuration validation
//
// Validates that required fields are present and values are sensible

use crate::*;
use anyhow::{bail, Result};
use sesblog_core::MAX_DEPTH_LIMIT;
use tracing::warn;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

pub fn validate_config(config: &RuntimeConfig) -> Result<()> {
    validate_template_config(&config.template)?;
    validate_transform_config(&config.transform)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

fn validate_template_config(config: &TemplateConfig) -> Result<()> {
    if config.source().is_none() {
        bail!("template.path or template.inline must be set");
    }
    Ok(())
}

fn validate_transform_config(config: &TransformConfig) -> Result<()> {
    if config.max_depth == 0 {
        bail!("transform.max_depth must be greater than 0");
    }

    if config.max_depth > MAX_DEPTH_LIMIT {
        bail!(
            "transform.max_depth must be at most {} (got {})",
            MAX_DEPTH_LIMIT,
            config.max_depth
        );
    }

    // Arrays count toward the parser's limit but not toward max_depth
    if config.max_depth > 100 {
        warn!(
            max_depth = config.max_depth,
            "transform.max_depth is close to the JSON parser limit; records mixing deep arrays and objects may fail as invalid JSON"
        );
    }

    Ok(())
}

fn validate_logging_config(config: &LoggingConfig) -> Result<()> {
    if config.level.trim().is_empty() {
        bail!("logging.level must not be empty");
    }

    // Directives like "sesblog_core=debug" are passed through to the filter
    for directive in config.level.split(',') {
        let level = directive.rsplit('=').next().unwrap_or(directive).trim();
        if !LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
            bail!(
                "logging.level '{}' is not a valid level (expected one of: {})",
                config.level,
                LOG_LEVELS.join(", ")
            );
        }
    }

    Ok(())
}
