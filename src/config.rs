use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::ranker::DEFAULT_LIMIT;
use crate::render::OutputFormat;

const APP_NAME: &str = "tactician";
const CONFIG_FILE: &str = "config.json";
/// Overrides the config file location.
pub const CONFIG_ENV: &str = "TACTICIAN_CONFIG";

/// User preferences. Command-line flags take precedence over every field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output format when `--output` is not given.
    pub output: OutputFormat,
    /// Result count for `search` when `--limit` is not given.
    pub search_limit: usize,
    /// Node type for `node add` when `--type` is not given.
    pub default_node_type: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: OutputFormat::Text,
            search_limit: DEFAULT_LIMIT,
            default_node_type: "project_artifact".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `$TACTICIAN_CONFIG` or the user's config
    /// directory. Returns defaults if the file doesn't exist or fails to parse.
    pub fn load() -> Self {
        match Self::try_load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        }
    }

    fn try_load() -> Result<Self> {
        let config_path = get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &std::path::Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path).context("Failed to read config file")?;

        let config = serde_json::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }
}

fn get_config_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }
    let mut path =
        config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"output": "json"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.output, OutputFormat::Json);
        assert_eq!(config.search_limit, 20);
        assert_eq!(config.default_node_type, "project_artifact");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
