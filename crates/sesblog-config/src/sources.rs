// Configuration source loading
//
// Priority order:
// 1. Environment variables (SESBLOG_* prefix)
// 2. Config file path from SESBLOG_CONFIG
// 3. Inline config content from SESBLOG_CONFIG_CONTENT
// 4. Default config file (./config.toml)
// 5. Built-in defaults

use crate::env_overrides::{self, EnvSource, ENV_PREFIX};
use crate::RuntimeConfig;
use anyhow::{Context, Result};
use std::env;
use std::path::Path;

const DEFAULT_CONFIG_FILE: &str = "./config.toml";

/// Load configuration using `env` for every variable lookup.
pub fn load_with_env<E: EnvSource>(env: &E) -> Result<RuntimeConfig> {
    let mut config = load_from_file(env)?.unwrap_or_default();
    env_overrides::apply_env_overrides(&mut config, env)?;
    config.validate()?;
    Ok(config)
}

fn load_from_file<E: EnvSource>(env: &E) -> Result<Option<RuntimeConfig>> {
    if let Some(path) = env.get("CONFIG").filter(|p| !p.is_empty()) {
        return read_config_file(Path::new(&path)).map(Some);
    }

    if let Some(content) = env.get("CONFIG_CONTENT").filter(|c| !c.is_empty()) {
        let config: RuntimeConfig = toml::from_str(&content).with_context(|| {
            format!(
                "Failed to parse inline config from {}CONFIG_CONTENT",
                ENV_PREFIX
            )
        })?;
        return Ok(Some(config));
    }

    let default_path = Path::new(DEFAULT_CONFIG_FILE);
    if default_path.exists() {
        return read_config_file(default_path).map(Some);
    }

    Ok(None)
}

fn read_config_file(path: &Path) -> Result<RuntimeConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Process environment, keys looked up with the SESBLOG_ prefix
pub struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(format!("{}{}", ENV_PREFIX, key)).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env_overrides::tests::MapEnv;
    use crate::LogFormat;
    use sesblog_core::FailurePolicy;

    #[test]
    fn test_inline_content_then_env() {
        let env = MapEnv::default()
            .with(
                "CONFIG_CONTENT",
                "[transform]\nmax_depth = 8\nfailure_policy = \"strict\"\n",
            )
            .with("MAX_DEPTH", "10");

        let config = load_with_env(&env).unwrap();
        assert_eq!(config.transform.max_depth, 10);
        assert_eq!(config.transform.failure_policy, FailurePolicy::Strict);
    }

    #[test]
    fn test_config_file_path() {
        let path = std::env::temp_dir().join(format!(
            "sesblog-config-test-{}.toml",
            std::process::id()
        ));
        std::fs::write(
            &path,
            "[template]\npath = \"/var/task/schema.json\"\n[logging]\nformat = \"json\"\n",
        )
        .unwrap();

        let env = MapEnv::default().with("CONFIG", path.to_str().unwrap());
        let config = load_with_env(&env).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(
            config.template.path.as_deref(),
            Some("/var/task/schema.json")
        );
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let env = MapEnv::default().with("CONFIG", "/nonexistent/sesblog.toml");
        let err = load_with_env(&env).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read config file"));
    }

    #[test]
    fn test_invalid_result_fails_validation() {
        let env = MapEnv::default().with("CONFIG_CONTENT", "[transform]\nmax_depth = 0\n");
        assert!(load_with_env(&env).is_err());
    }
}
