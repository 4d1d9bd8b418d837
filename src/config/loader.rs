use std::path::{Path, PathBuf};

use drip_blockchain::EnvironmentKey;
use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};
use serde::Deserialize;

use super::{Config, ConfigRaw, defaults};
use crate::config::ConfigError;

const DEFAULT_CONFIG_FILE: &str = "config.toml";
const DEFAULT_ENVIRONMENT: EnvironmentKey = EnvironmentKey::BaseSepolia;

/// Where the configuration comes from, as given on the command line.
#[derive(Debug, Clone, Default)]
pub(crate) struct ConfigSource {
    /// Custom TOML file merged over `config.toml`.
    pub custom_path: Option<PathBuf>,
    /// Environment override; wins over `environment` in any file.
    pub environment: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EnvironmentConfig {
    environment: Option<String>,
}

pub(crate) fn load_configuration(source: &ConfigSource) -> Result<Config, ConfigError> {
    if let Some(path) = &source.custom_path
        && !path.exists()
    {
        return Err(ConfigError::MissingConfig(path.display().to_string()));
    }

    let environment = resolve_environment(source)?;
    tracing::info!("Loading configuration for environment: {}", environment);

    // Layered sources, lowest priority first
    let mut figment = Figment::from(Serialized::defaults(defaults::config_for(environment)));

    if Path::new(DEFAULT_CONFIG_FILE).exists() {
        figment = figment.merge(Toml::file(DEFAULT_CONFIG_FILE));
    }

    if let Some(path) = &source.custom_path {
        tracing::info!("Loading custom config file: {}", path.display());
        figment = figment.merge(Toml::file(path));
    }

    let config = extract(figment, environment)?.resolve()?;
    tracing::info!("Configuration loaded successfully");
    Ok(config)
}

/// Extracts the raw config with `environment` pinned as the selected one.
fn extract(figment: Figment, environment: EnvironmentKey) -> Result<ConfigRaw, ConfigError> {
    let figment = figment.merge(Serialized::default("environment", environment));
    Ok(figment.extract().map_err(Box::new)?)
}

/// `--env`, then the custom file, then `config.toml`, then the default.
fn resolve_environment(source: &ConfigSource) -> Result<EnvironmentKey, ConfigError> {
    let from_files = || {
        source
            .custom_path
            .as_deref()
            .and_then(read_environment_from)
            .or_else(|| read_environment_from(Path::new(DEFAULT_CONFIG_FILE)))
    };

    match source.environment.clone().or_else(from_files) {
        Some(name) => name.parse().map_err(ConfigError::UnknownEnvironment),
        None => Ok(DEFAULT_ENVIRONMENT),
    }
}

fn read_environment_from(path: &Path) -> Option<String> {
    if !path.exists() {
        return None;
    }

    Figment::from(Toml::file(path))
        .extract::<EnvironmentConfig>()
        .ok()
        .and_then(|config| config.environment)
}
