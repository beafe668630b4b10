use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid config file at {config_path}: {reason}")]
    ConfigInvalidError { config_path: PathBuf, reason: String },
}

/// Persisted view settings. Missing keys fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Highlight every cell equal to the value under the caret.
    pub highlight_current_value: bool,
    pub bytes_per_value: usize,
    pub bytes_per_line: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            highlight_current_value: true,
            bytes_per_value: 1,
            bytes_per_line: 16,
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        config
            .validate()
            .map_err(|reason| ConfigError::ConfigInvalidError {
                config_path: config_path.to_path_buf(),
                reason,
            })?;

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/hexmark");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Check the line geometry is something a hex view can lay out.
    pub fn validate(&self) -> Result<(), String> {
        if !matches!(self.bytes_per_value, 1 | 2 | 4 | 8) {
            return Err(format!(
                "bytes_per_value must be 1, 2, 4 or 8, got {}",
                self.bytes_per_value
            ));
        }
        if self.bytes_per_line == 0 || self.bytes_per_line % self.bytes_per_value != 0 {
            return Err(format!(
                "bytes_per_line must be a non-zero multiple of bytes_per_value ({}), got {}",
                self.bytes_per_value, self.bytes_per_line
            ));
        }
        Ok(())
    }
}
