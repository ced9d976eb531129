//! Image data providers for local files, base64 text and in-memory bytes.

use std::path::PathBuf;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use reqwest::Url;

use crate::domain::ports::{DataProviderError, ImageDataProvider};

/// Reads image data from a local file.
#[derive(Debug, Clone)]
pub struct LocalFileImageDataProvider {
    path: PathBuf,
    cache_key: String,
}

impl LocalFileImageDataProvider {
    /// Creates a provider. The cache key defaults to the file URL of `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, cache_key: Option<String>) -> Self {
        let path = path.into();
        let cache_key = cache_key.unwrap_or_else(|| {
            Url::from_file_path(&path)
                .map_or_else(|()| path.display().to_string(), |url| url.to_string())
        });
        Self { path, cache_key }
    }
}

#[async_trait]
impl ImageDataProvider for LocalFileImageDataProvider {
    fn cache_key(&self) -> &str {
        &self.cache_key
    }

    async fn data(&self) -> Result<Bytes, DataProviderError> {
        tokio::fs::read(&self.path)
            .await
            .map(Bytes::from)
            .map_err(|e| DataProviderError {
                cache_key: self.cache_key.clone(),
                message: format!("cannot read {}: {e}", self.path.display()),
            })
    }
}

/// Decodes image data from a base64 string.
#[derive(Debug, Clone)]
pub struct Base64ImageDataProvider {
    base64: String,
    cache_key: String,
}

impl Base64ImageDataProvider {
    /// Creates a provider for `base64` cached under `cache_key`.
    #[must_use]
    pub fn new(base64: impl Into<String>, cache_key: impl Into<String>) -> Self {
        Self {
            base64: base64.into(),
            cache_key: cache_key.into(),
        }
    }
}

#[async_trait]
impl ImageDataProvider for Base64ImageDataProvider {
    fn cache_key(&self) -> &str {
        &self.cache_key
    }

    async fn data(&self) -> Result<Bytes, DataProviderError> {
        general_purpose::STANDARD
            .decode(self.base64.trim())
            .map(Bytes::from)
            .map_err(|e| DataProviderError {
                cache_key: self.cache_key.clone(),
                message: format!("invalid base64: {e}"),
            })
    }
}

/// Serves image data already held in memory.
#[derive(Debug, Clone)]
pub struct RawImageDataProvider {
    data: Bytes,
    cache_key: String,
}

impl RawImageDataProvider {
    /// Creates a provider for `data` cached under `cache_key`.
    #[must_use]
    pub fn new(data: Bytes, cache_key: impl Into<String>) -> Self {
        Self {
            data,
            cache_key: cache_key.into(),
        }
    }
}

#[async_trait]
impl ImageDataProvider for RawImageDataProvider {
    fn cache_key(&self) -> &str {
        &self.cache_key
    }

    async fn data(&self) -> Result<Bytes, DataProviderError> {
        Ok(self.data.clone())
    }
}
