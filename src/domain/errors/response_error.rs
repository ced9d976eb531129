//! Errors raised by the network transfer of an image.

use thiserror::Error;

/// Response error variants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum ResponseError {
    #[error("response for {url} has invalid status code {status}")]
    InvalidHttpStatusCode { url: String, status: u16 },

    #[error("transfer of {url} failed: {message}")]
    SessionError { url: String, message: String },

    #[error("downloaded data for {url} was rejected")]
    DataModifyingFailed { url: String },

    #[error("transfer of {url} finished without a response")]
    NoUrlResponse { url: String },
}

impl ResponseError {
    /// Creates invalid status code error.
    #[must_use]
    pub fn invalid_status(url: impl Into<String>, status: u16) -> Self {
        Self::InvalidHttpStatusCode {
            url: url.into(),
            status,
        }
    }

    /// Creates session (transport) error.
    #[must_use]
    pub fn session(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SessionError {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates data modifying failed error.
    #[must_use]
    pub fn data_modifying_failed(url: impl Into<String>) -> Self {
        Self::DataModifyingFailed { url: url.into() }
    }

    /// Creates no response error.
    #[must_use]
    pub fn no_response(url: impl Into<String>) -> Self {
        Self::NoUrlResponse { url: url.into() }
    }
}
