//! Data transfer objects for the application layer.

mod download_options;
mod loading_result;

pub use download_options::{DownloadOptions, DownloadProgress, ProgressBlock};
pub use loading_result::ImageLoadingResult;
