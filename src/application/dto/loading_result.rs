//! Result of a successful image download.

use std::sync::Arc;

use bytes::Bytes;
use reqwest::Url;

use crate::domain::entities::ImageArtifact;

/// A downloaded and processed image.
#[derive(Debug, Clone)]
pub struct ImageLoadingResult {
    /// The processed image.
    pub image: Arc<ImageArtifact>,
    /// The URL the image was requested from.
    pub url: Url,
    /// The raw downloaded data.
    pub original_data: Bytes,
}
