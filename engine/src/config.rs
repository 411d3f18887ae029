//! Typed configuration, loaded with a fallback chain (§10.4).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Mirrors §6's enumerated configuration keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub documents_dir: PathBuf,
    pub store_root: PathBuf,
    pub max_parallel_tasks: usize,
    pub task_timeout_seconds: Option<u64>,
    pub default_model: Option<String>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            documents_dir: dirs::document_dir().unwrap_or_else(|| PathBuf::from(".")),
            store_root: PathBuf::from(".agentforge/store"),
            max_parallel_tasks: 1,
            task_timeout_seconds: None,
            default_model: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Fallback chain: explicit path, then `.agentforge.yml` in the current
    /// directory, then `~/.config/agentforge/agentforge.yml`, then defaults.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".agentforge.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => warn!(error = %e, path = %local_config.display(), "failed to load local config"),
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("agentforge").join("agentforge.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => warn!(error = %e, path = %user_config.display(), "failed to load user config"),
                }
            }
        }

        info!("no config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.max_parallel_tasks, 1);
        assert_eq!(config.log_level, "info");
        assert!(config.task_timeout_seconds.is_none());
    }

    #[test]
    fn partial_yaml_falls_back_to_defaults_for_the_rest() {
        let yaml = "max_parallel_tasks: 4\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.max_parallel_tasks, 4);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn missing_file_path_surfaces_a_read_error() {
        let err = Config::load(Some(Path::new("/nonexistent/agentforge.yml")));
        assert!(matches!(err, Err(ConfigError::Read { .. })));
    }
}
