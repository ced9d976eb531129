//! Infrastructure layer with adapters for the file system, network and configuration.

/// Application configuration.
pub mod config;
/// Image data providers.
pub mod image;
/// HTTP session adapters.
pub mod network;
/// Disk storage.
pub mod storage;

pub use config::{AppConfig, CliArgs, ConfigManager, LogLevel};
pub use network::ReqwestSession;
pub use storage::{DiskStorage, DiskStorageConfig};
