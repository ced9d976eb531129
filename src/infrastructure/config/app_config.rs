//! Application configuration.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use super::args::CliArgs;
use crate::domain::entities::{ExpirationExtending, StorageExpiration};
use crate::infrastructure::storage::DiskStorageConfig;

const APP_NAME: &str = "halcyon";
const APP_QUALIFIER: &str = "dev";
const APP_ORGANIZATION: &str = "halcyon";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Converts to tracing level.
    #[must_use]
    pub const fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration, read from `config.toml` and merged with CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[serde(skip)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Downloader configuration.
    #[serde(default)]
    pub downloader: DownloaderSection,

    /// Disk cache configuration.
    #[serde(default)]
    pub disk_cache: DiskCacheSection,
}

/// `[downloader]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloaderSection {
    /// Name of the downloader, used in logs.
    #[serde(default = "default_downloader_name")]
    pub name: String,

    /// Transfer timeout in seconds.
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,

    /// Hosts whose certificates are trusted even if they do not validate.
    #[serde(default)]
    pub trusted_hosts: Vec<String>,
}

impl DownloaderSection {
    /// Transfer timeout as a duration.
    #[must_use]
    pub const fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

impl Default for DownloaderSection {
    fn default() -> Self {
        Self {
            name: default_downloader_name(),
            download_timeout_secs: default_download_timeout(),
            trusted_hosts: Vec::new(),
        }
    }
}

/// `[disk_cache]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskCacheSection {
    /// Storage name, appended to the cache namespace.
    #[serde(default = "default_cache_name")]
    pub name: String,

    /// Size limit in bytes, `0` for unlimited.
    #[serde(default)]
    pub size_limit: u64,

    /// How expiration is extended on access.
    #[serde(default)]
    pub expiration_extending: ExpirationExtending,

    /// Extension appended to cache file names.
    #[serde(default)]
    pub path_extension: Option<String>,

    /// Hash keys into file names.
    #[serde(default = "default_true")]
    pub uses_hashed_file_name: bool,

    /// Base directory for the cache. Defaults to the user cache directory.
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Default expiration of stored images.
    #[serde(default)]
    pub expiration: StorageExpiration,
}

impl DiskCacheSection {
    /// Builds the storage configuration for this section.
    #[must_use]
    pub fn to_storage_config(&self) -> DiskStorageConfig {
        let mut config = DiskStorageConfig::new(self.name.clone(), self.size_limit)
            .with_expiration(self.expiration);
        config.expiration_extending = self.expiration_extending;
        config.path_extension.clone_from(&self.path_extension);
        config.uses_hashed_file_name = self.uses_hashed_file_name;
        config.directory.clone_from(&self.directory);
        config
    }
}

impl Default for DiskCacheSection {
    fn default() -> Self {
        Self {
            name: default_cache_name(),
            size_limit: 0,
            expiration_extending: ExpirationExtending::default(),
            path_extension: None,
            uses_hashed_file_name: true,
            directory: None,
            expiration: StorageExpiration::default(),
        }
    }
}

fn default_downloader_name() -> String {
    "default".to_string()
}

fn default_cache_name() -> String {
    "default".to_string()
}

const fn default_download_timeout() -> u64 {
    15
}

const fn default_true() -> bool {
    true
}

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(config_path) = &args.config {
            self.config = Some(config_path.clone());
        }
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(cache_dir) = &args.cache_dir {
            self.disk_cache.directory = Some(cache_dir.clone());
        }
        if let Some(size_limit) = args.size_limit {
            self.disk_cache.size_limit = size_limit;
        }
        if let Some(timeout) = args.timeout {
            self.downloader.download_timeout_secs = timeout;
        }
    }

    /// Checks values that parse but cannot drive a downloader or a cache.
    ///
    /// # Errors
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.downloader.name.is_empty() {
            return Err("downloader.name must not be empty".to_string());
        }
        if self.downloader.download_timeout_secs == 0 {
            return Err("downloader.download_timeout_secs must be positive".to_string());
        }
        if self.disk_cache.name.is_empty() {
            return Err("disk_cache.name must not be empty".to_string());
        }
        Ok(())
    }

    /// Returns default config directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns default config file path.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        Self::default_config_dir().map(|dir| dir.join(super::storage::CONFIG_FILE_NAME))
    }

    /// Returns default log file path.
    #[must_use]
    pub fn default_log_path() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.data_dir().join("halcyon.log"))
    }

    /// Returns effective config path.
    #[must_use]
    pub fn effective_config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(Self::default_config_path)
    }

    /// Returns effective log path.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone().or_else(Self::default_log_path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config: None,
            log_path: None,
            log_level: LogLevel::Info,
            downloader: DownloaderSection::default(),
            disk_cache: DiskCacheSection::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_sections() {
        let toml_content = r#"
            log_level = "debug"

            [downloader]
            download_timeout_secs = 30
            trusted_hosts = ["images.internal"]

            [disk_cache]
            size_limit = 1048576
            expiration = { seconds = 600 }
            expiration_extending = "none"
            path_extension = "img"
        "#;

        let config: AppConfig = toml::from_str(toml_content).expect("Failed to parse config");

        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.downloader.download_timeout(), Duration::from_secs(30));
        assert_eq!(config.downloader.trusted_hosts, vec!["images.internal"]);
        assert_eq!(config.disk_cache.size_limit, 1_048_576);
        assert_eq!(config.disk_cache.expiration, StorageExpiration::Seconds(600));
        assert_eq!(
            config.disk_cache.expiration_extending,
            ExpirationExtending::None
        );
        assert!(config.disk_cache.uses_hashed_file_name);
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.downloader.download_timeout(), Duration::from_secs(15));
        assert_eq!(config.disk_cache.expiration, StorageExpiration::Days(7));
        assert_eq!(config.disk_cache.size_limit, 0);
    }

    #[test]
    fn test_validate_rejects_empty_names() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        config.disk_cache.name.clear();
        assert_eq!(
            config.validate().unwrap_err(),
            "disk_cache.name must not be empty"
        );
    }

    #[test]
    fn test_storage_config_from_section() {
        let section = DiskCacheSection {
            name: "avatars".to_string(),
            size_limit: 500,
            path_extension: Some("png".to_string()),
            ..DiskCacheSection::default()
        };

        let config = section.to_storage_config();

        assert_eq!(config.name, "avatars");
        assert_eq!(config.size_limit, 500);
        assert_eq!(config.path_extension.as_deref(), Some("png"));
        assert_eq!(config.expiration, StorageExpiration::Days(7));
    }

    #[test]
    fn test_cli_overrides_file_values() {
        let mut config = AppConfig::default();
        let args = CliArgs::parse_from([
            "halcyon",
            "--size-limit",
            "2048",
            "--timeout",
            "5",
            "--log-level",
            "trace",
            "sweep",
        ]);

        config.merge_with_args(&args);

        assert_eq!(config.disk_cache.size_limit, 2048);
        assert_eq!(config.downloader.download_timeout_secs, 5);
        assert_eq!(config.log_level, LogLevel::Trace);
    }
}
