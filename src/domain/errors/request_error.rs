//! Errors raised while building or tracking a download request.

use thiserror::Error;

use crate::domain::entities::CancelToken;

/// Request error variants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum RequestError {
    #[error("request modifier returned no request")]
    EmptyRequest,

    #[error("invalid request url: {url}")]
    InvalidUrl { url: String },

    #[error("download of {url} cancelled for token {token}")]
    TaskCancelled { url: String, token: CancelToken },

    #[error("downloader name must not be empty")]
    EmptyDownloaderName,
}

impl RequestError {
    /// Creates invalid url error.
    #[must_use]
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates task cancelled error.
    #[must_use]
    pub fn task_cancelled(url: impl Into<String>, token: CancelToken) -> Self {
        Self::TaskCancelled {
            url: url.into(),
            token,
        }
    }
}
