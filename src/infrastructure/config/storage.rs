//! Reading and writing `config.toml`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use super::app_config::AppConfig;

/// File name of the configuration inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration loading errors.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum ConfigError {
    #[error("failed to determine config directory")]
    ConfigDirNotFound,

    #[error("cannot access config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config file {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },

    #[error("toml serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Owns the location of the halcyon configuration file.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    /// Uses `path_override` when given, else [`AppConfig::default_config_path`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ConfigDirNotFound`] if no override is given and the
    /// user config directory cannot be determined.
    pub fn locate(path_override: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path_override {
            Some(path) => path.to_path_buf(),
            None => AppConfig::default_config_path().ok_or(ConfigError::ConfigDirNotFound)?,
        };
        Ok(Self::at(path))
    }

    /// Manager for the file at `path`.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the configuration file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and validates the configuration, writing the defaults when the
    /// file does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] for values halcyon cannot run with. The file is
    /// left untouched in both cases.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut config = if self.path.exists() {
            let content = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
            let config: AppConfig =
                toml::from_str(&content).map_err(|source| ConfigError::Parse {
                    path: self.path.clone(),
                    source,
                })?;
            config.validate().map_err(|reason| ConfigError::Invalid {
                path: self.path.clone(),
                reason,
            })?;
            debug!(path = %self.path.display(), "Configuration loaded");
            config
        } else {
            info!(path = %self.path.display(), "Config file not found, creating default");
            let config = AppConfig::default();
            self.save(&config)?;
            config
        };
        config.config = Some(self.path.clone());
        Ok(config)
    }

    /// Writes `config` atomically, creating the parent directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be serialized or written.
    pub fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(config)?;
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;

        let mut temp_file =
            tempfile::NamedTempFile::new_in(parent).map_err(|e| self.io_error(e))?;
        temp_file
            .write_all(content.as_bytes())
            .map_err(|e| self.io_error(e))?;
        temp_file
            .persist(&self.path)
            .map_err(|e| self.io_error(e.error))?;
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> ConfigError {
        ConfigError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
