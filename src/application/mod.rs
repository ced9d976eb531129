//! Application layer: the download pipeline and its DTOs.

/// Data transfer objects.
pub mod dto;
/// Download, coalescing and processing services.
pub mod services;

pub use dto::{DownloadOptions, DownloadProgress, ImageLoadingResult, ProgressBlock};
pub use services::{
    CompletionHandler, DownloadTask, DownloaderConfig, ImageDataProcessor, ImageDownloader,
    SessionRegistry,
};
