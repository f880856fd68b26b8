// sesblog-config - Runtime configuration for the record transformer
//
// Supports configuration from multiple sources:
// 1. Environment variables (highest priority)
// 2. Config file path from SESBLOG_CONFIG env var
// 3. Config file contents from SESBLOG_CONFIG_CONTENT env var
// 4. Default config file location (./config.toml)
// 5. Built-in defaults (lowest priority)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sesblog_core::{FailurePolicy, TransformOptions, DEFAULT_MAX_DEPTH};

mod env_overrides;
mod sources;
mod validation;

pub use env_overrides::{apply_env_overrides, EnvSource, ENV_PREFIX};
pub use sources::{load_with_env, StdEnvSource};

/// Main runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub template: TemplateConfig,

    #[serde(default)]
    pub transform: TransformConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the reference template document comes from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    #[serde(
        default = "default_template_path",
        skip_serializing_if = "Option::is_none"
    )]
    pub path: Option<String>,

    /// Inline JSON document; takes precedence over `path`.
    /// `SESBLOG_TEMPLATE_PATH` clears an inline document read from a file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline: Option<String>,
}

fn default_template_path() -> Option<String> {
    Some("schema.json".to_string())
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            path: default_template_path(),
            inline: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateSource<'a> {
    Inline(&'a str),
    Path(&'a str),
}

impl TemplateConfig {
    pub fn source(&self) -> Option<TemplateSource<'_>> {
        if let Some(inline) = self.inline.as_deref().filter(|s| !s.trim().is_empty()) {
            return Some(TemplateSource::Inline(inline));
        }
        self.path
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(TemplateSource::Path)
    }
}

/// Record transformation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformConfig {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl TransformConfig {
    pub fn options(&self) -> TransformOptions {
        TransformOptions {
            max_depth: self.max_depth,
            failure_policy: self.failure_policy,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Unsupported log format: {}. Supported: text, json", s),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from all sources with priority
    pub fn load() -> Result<Self> {
        sources::load_with_env(&StdEnvSource)
    }

    /// Parse a TOML document on top of the defaults (no env overrides)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs() {
        let config = RuntimeConfig::default();
        assert_eq!(
            config.template.source(),
            Some(TemplateSource::Path("schema.json"))
        );
        assert_eq!(config.transform.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.transform.failure_policy, FailurePolicy::Isolate);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Text);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let config = RuntimeConfig::from_toml_str(
            r#"
            [template]
            inline = '{"eventType": ""}'

            [transform]
            failure_policy = "strict"

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.template.source(),
            Some(TemplateSource::Inline(r#"{"eventType": ""}"#))
        );
        assert_eq!(config.transform.failure_policy, FailurePolicy::Strict);
        assert_eq!(config.transform.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_inline_template_wins_over_path() {
        let template = TemplateConfig {
            path: Some("schema.json".into()),
            inline: Some("{}".into()),
        };
        assert_eq!(template.source(), Some(TemplateSource::Inline("{}")));

        let template = TemplateConfig {
            path: None,
            inline: Some("   ".into()),
        };
        assert_eq!(template.source(), None);
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("TEXT".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_transform_options() {
        let config = TransformConfig {
            max_depth: 12,
            failure_policy: FailurePolicy::Strict,
        };
        let options = config.options();
        assert_eq!(options.max_depth, 12);
        assert_eq!(options.failure_policy, FailurePolicy::Strict);
    }
}
