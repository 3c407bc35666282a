use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use anyhow::Context;

/// A required setting was absent or blank after every source was applied.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("missing required environment variable: {variable}")]
pub struct MissingConfigurationError {
    pub variable: String,
}

impl MissingConfigurationError {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }
}

/// Unwraps a layered value, treating blank strings as unset.
pub fn require(
    value: Option<String>,
    variable: &str,
) -> Result<String, MissingConfigurationError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| MissingConfigurationError::new(variable))
}

#[derive(thiserror::Error, Debug)]
pub enum EnvError {
    #[error("any error: {0:#}")]
    EnvError(#[source] anyhow::Error),
}

pub trait Env {
    fn set_from_lookup(&mut self, lookup: &dyn Fn(&str) -> Option<String>)
        -> Result<(), EnvError>;

    fn set_from_env(&mut self) -> Result<(), EnvError> {
        self.set_from_lookup(&|key| std::env::var(key).ok())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigFileError {
    #[error("any error: {0:#}")]
    ConfigFileError(#[source] anyhow::Error),
}

pub trait ConfigFile {
    fn set_from_entries(&mut self, entries: &HashMap<String, String>);

    fn set_from_config_file(&mut self, config_file: &Path) -> Result<(), ConfigFileError> {
        let entries = read_config_entries(config_file)?;
        self.set_from_entries(&entries);

        Ok(())
    }
}

pub fn config_home() -> Option<PathBuf> {
    std::env::var("HWBOT_CONFIG_HOME")
        .map(PathBuf::from)
        .ok()
        .or_else(|| {
            directories::ProjectDirs::from("io", "hwbot", "hwbot")
                .map(|project| project.config_dir().to_path_buf())
        })
}

pub fn default_config_file() -> Option<PathBuf> {
    config_home().map(|home| home.join("hwbot.kdl"))
}

pub fn read_config_entries(config_file: &Path) -> Result<HashMap<String, String>, ConfigFileError> {
    tracing::trace!("looking for kdl config at: {}", config_file.display());
    let file_content = std::fs::read_to_string(config_file)
        .context("failed to read config file")
        .map_err(ConfigFileError::ConfigFileError)?;

    parse_config_entries(&file_content)
}

/// Reads the string children of the top-level `config` node.
///
/// ```kdl
/// config {
///     practicum_token "..."
///     telegram_chat_id "12345"
/// }
/// ```
///
/// On a single line every node needs its `;`, the last one included:
/// `config { practicum_token "..."; telegram_chat_id "12345"; }`.
///
/// Integer values are accepted and kept in their decimal form, since chat ids
/// are often written unquoted.
pub fn parse_config_entries(content: &str) -> Result<HashMap<String, String>, ConfigFileError> {
    let doc: kdl::KdlDocument = content
        .parse()
        .context("failed to parse kdl config file")
        .map_err(ConfigFileError::ConfigFileError)?;

    let mut entries = HashMap::new();

    let Some(config) = doc.get("config").and_then(|c| c.children()) else {
        tracing::debug!("config file has no config block");
        return Ok(entries);
    };

    for node in config.nodes() {
        let Some(value) = node.entries().first().map(|e| e.value()) else {
            continue;
        };

        let value = match value {
            kdl::KdlValue::String(s) | kdl::KdlValue::RawString(s) => s.clone(),
            other => match other.as_i64() {
                Some(i) => i.to_string(),
                None => {
                    tracing::warn!("ignoring non-string config value for {}", node.name().value());
                    continue;
                }
            },
        };

        tracing::debug!("found config item: {}", node.name().value());
        entries.insert(node.name().value().to_string(), value);
    }

    Ok(entries)
}
