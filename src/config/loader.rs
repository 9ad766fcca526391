use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::Deserialize;

use super::{Config, ConfigRaw, defaults};
use crate::config::ConfigError;

const DEFAULT_CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "XABI_";

#[derive(Debug, Deserialize)]
struct EnvironmentConfig {
    environment: Option<String>,
}

/// Load configuration from typed defaults, `config.toml`, `XABI_*`
/// environment variables and an optional custom file (lowest to highest
/// priority).
pub(crate) fn initialize_configuration(custom_config_path: Option<&Path>) -> Config {
    load_configuration(custom_config_path).expect("Failed to load configuration")
}

pub(crate) fn load_configuration(custom_config_path: Option<&Path>) -> Result<Config, ConfigError> {
    let environment = resolve_environment(custom_config_path)?;

    let mut figment = Figment::from(Serialized::defaults(defaults::config_for(&environment)?));

    if Path::new(DEFAULT_CONFIG_FILE).exists() {
        figment = figment.merge(Toml::file(DEFAULT_CONFIG_FILE));
    }

    figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__").ignore(&["ENV"]));

    if let Some(config_path) = custom_config_path {
        figment = figment.merge(Toml::file(config_path));
    }

    let config: ConfigRaw = figment.extract().map_err(Box::new)?;
    if config.environment != environment {
        return Err(ConfigError::UnknownEnvironment(format!(
            "config environment '{}' does not match selected '{}'",
            config.environment, environment
        )));
    }

    config.resolve()
}

/// Environment named by the custom file, then `config.toml`, then `XABI_ENV`.
/// Defaults to `development`.
fn resolve_environment(custom_config_path: Option<&Path>) -> Result<String, ConfigError> {
    let from_files = custom_config_path
        .and_then(read_environment_from)
        .or_else(|| read_environment_from(Path::new(DEFAULT_CONFIG_FILE)));

    let environment = from_files
        .or_else(|| std::env::var(format!("{ENV_PREFIX}ENV")).ok())
        .map(normalize_env)
        .unwrap_or_else(|| "development".to_string());

    if !defaults::ENVIRONMENTS.contains(&environment.as_str()) {
        return Err(ConfigError::UnknownEnvironment(environment));
    }

    Ok(environment)
}

fn read_environment_from(path: &Path) -> Option<String> {
    if !path.exists() {
        return None;
    }

    Figment::from(Toml::file(path))
        .extract::<EnvironmentConfig>()
        .ok()
        .and_then(|config| config.environment)
        .map(normalize_env)
}

fn normalize_env(env: String) -> String {
    env.trim().to_lowercase()
}
