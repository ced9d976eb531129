//! Port for supplying image data from sources other than the network.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Failure reported by a data provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("data provider for {cache_key} failed: {message}")]
pub struct DataProviderError {
    /// Cache key of the failing provider.
    pub cache_key: String,
    /// Description of the failure.
    pub message: String,
}

/// Supplies raw image data for a cache key.
#[async_trait]
pub trait ImageDataProvider: Send + Sync {
    /// The key the provided image is cached under.
    fn cache_key(&self) -> &str;

    /// Loads the image data.
    async fn data(&self) -> Result<Bytes, DataProviderError>;
}
