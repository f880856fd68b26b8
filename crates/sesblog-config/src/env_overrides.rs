use super::{LogFormat, RuntimeConfig};
use anyhow::{anyhow, Result};
use sesblog_core::FailurePolicy;

pub const ENV_PREFIX: &str = "SESBLOG_";

/// Abstraction over environment-variable lookups so tests can supply their
/// own source of overrides.
pub trait EnvSource {
    /// Get a variable by its key without the SESBLOG_ prefix
    fn get(&self, key: &str) -> Option<String>;
}

/// Apply environment-variable overrides (highest priority) to the runtime config.
pub fn apply_env_overrides<E: EnvSource>(config: &mut RuntimeConfig, env: &E) -> Result<()> {
    // Template source. An env path replaces any file-level inline document;
    // an env inline document still wins over both.
    if let Some(path) = get_env_string(env, "TEMPLATE_PATH") {
        config.template.path = Some(path);
        config.template.inline = None;
    }
    if let Some(inline) = get_env_string(env, "TEMPLATE_INLINE") {
        config.template.inline = Some(inline);
    }

    // Transform configuration
    if let Some(val) = get_env_usize(env, "MAX_DEPTH")? {
        config.transform.max_depth = val;
    }
    if let Some(policy) = get_env_string(env, "FAILURE_POLICY") {
        config.transform.failure_policy = policy
            .parse::<FailurePolicy>()
            .map_err(|e| anyhow!("Invalid {}FAILURE_POLICY value: {}", ENV_PREFIX, e))?;
    }

    // Logging
    if let Some(level) = get_env_string(env, "LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(format) = get_env_string(env, "LOG_FORMAT") {
        config.logging.format = format
            .parse::<LogFormat>()
            .map_err(|e| anyhow!("Invalid {}LOG_FORMAT value: {}", ENV_PREFIX, e))?;
    }

    Ok(())
}

fn get_env_string<E: EnvSource>(env: &E, key: &str) -> Option<String> {
    env.get(key).filter(|val| !val.is_empty())
}

fn get_env_usize<E: EnvSource>(env: &E, key: &str) -> Result<Option<usize>> {
    match get_env_string(env, key) {
        Some(val) => {
            let parsed = val
                .parse::<usize>()
                .map_err(|e| anyhow!("Failed to parse {}{}: {}", ENV_PREFIX, key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::TemplateSource;
    use std::collections::HashMap;

    #[derive(Default)]
    pub(crate) struct MapEnv(pub HashMap<String, String>);

    impl MapEnv {
        pub(crate) fn with(mut self, key: &str, value: &str) -> Self {
            self.0.insert(key.to_string(), value.to_string());
            self
        }
    }

    impl EnvSource for MapEnv {
        fn get(&self, key: &str) -> Option<String> {
            self.0.get(key).cloned()
        }
    }

    #[test]
    fn test_overrides_applied() {
        let env = MapEnv::default()
            .with("TEMPLATE_PATH", "/opt/schema.json")
            .with("MAX_DEPTH", "16")
            .with("FAILURE_POLICY", "strict")
            .with("LOG_LEVEL", "debug")
            .with("LOG_FORMAT", "json");

        let mut config = RuntimeConfig::default();
        apply_env_overrides(&mut config, &env).unwrap();

        assert_eq!(config.template.path.as_deref(), Some("/opt/schema.json"));
        assert_eq!(config.transform.max_depth, 16);
        assert_eq!(config.transform.failure_policy, FailurePolicy::Strict);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_env_template_path_replaces_file_inline() {
        let mut config = RuntimeConfig::from_toml_str(
            "[template]\ninline = '{\"eventType\": \"\"}'\n",
        )
        .unwrap();
        let env = MapEnv::default().with("TEMPLATE_PATH", "/opt/schema.json");
        apply_env_overrides(&mut config, &env).unwrap();
        assert_eq!(
            config.template.source(),
            Some(TemplateSource::Path("/opt/schema.json"))
        );

        let env = env.with("TEMPLATE_INLINE", "{\"messageId\": \"\"}");
        apply_env_overrides(&mut config, &env).unwrap();
        assert_eq!(
            config.template.source(),
            Some(TemplateSource::Inline("{\"messageId\": \"\"}"))
        );
    }

    #[test]
    fn test_empty_values_ignored() {
        let env = MapEnv::default().with("TEMPLATE_PATH", "");
        let mut config = RuntimeConfig::default();
        apply_env_overrides(&mut config, &env).unwrap();
        assert_eq!(config.template.path.as_deref(), Some("schema.json"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = RuntimeConfig::default();
        let err = apply_env_overrides(&mut config, &MapEnv::default().with("MAX_DEPTH", "deep"))
            .unwrap_err();
        assert!(err.to_string().contains("SESBLOG_MAX_DEPTH"));

        let err = apply_env_overrides(
            &mut config,
            &MapEnv::default().with("FAILURE_POLICY", "retry"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("FAILURE_POLICY"));
    }
}
