use super::app_config::LogLevel;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "halcyon",
    version,
    about = "Download images with request coalescing and manage the on-disk cache",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH", global = true)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    /// Base directory of the disk cache.
    #[arg(long, value_name = "PATH", global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Disk cache size limit in bytes.
    #[arg(long, global = true)]
    pub size_limit: Option<u64>,

    /// Download timeout in seconds.
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

/// Operations available from the command line.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Download images (or read local files) and store them in the disk cache.
    Fetch {
        /// URLs or local file paths.
        #[arg(required = true)]
        sources: Vec<String>,

        /// Cache key, only valid with a single source.
        #[arg(long)]
        key: Option<String>,

        /// Ignore the disk cache and always download.
        #[arg(long)]
        force: bool,
    },
    /// Remove expired entries from the disk cache.
    Sweep,
    /// Evict least recently used entries over the size limit.
    Trim,
    /// Remove every entry from the disk cache.
    Clear,
}
