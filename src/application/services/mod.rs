//! Download pipeline services.

mod image_data_processor;
mod image_downloader;
mod session_registry;
mod session_task;

pub use image_data_processor::ImageDataProcessor;
pub use image_downloader::{DEFAULT_DOWNLOAD_TIMEOUT, DownloaderConfig, ImageDownloader};
pub use session_registry::{DownloadTask, SessionRegistry};
pub use session_task::{
    CompletionHandler, SessionDataTask, TaskCallback, TaskDoneHandler, TaskOutcome,
};
