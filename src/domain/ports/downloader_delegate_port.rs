//! Observation and policy hooks consulted by the image downloader.

use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;
use reqwest::Url;

use crate::domain::entities::{DownloadRequest, ImageArtifact, ResponseMeta};
use crate::domain::errors::HalcyonError;

use super::ChallengeDisposition;

/// Hooks for observing downloads and adjusting their policy.
///
/// Every method has a default body; implementors override what they need.
#[cfg_attr(test, mockall::automock)]
pub trait ImageDownloaderDelegate: Send + Sync {
    /// Called before a new transfer is started for `url`.
    fn will_download(&self, _url: &Url, _request: &DownloadRequest) {}

    /// Called after every transfer finishes, successfully or not.
    fn did_finish_downloading<'r, 'e>(
        &self,
        _url: &Url,
        _response: Option<&'r ResponseMeta>,
        _error: Option<&'e HalcyonError>,
    ) {
    }

    /// Called for each successfully processed image of a transfer.
    fn did_download_image<'r>(
        &self,
        _image: &Arc<ImageArtifact>,
        _url: &Url,
        _response: Option<&'r ResponseMeta>,
    ) {
    }

    /// Decides whether a status code counts as success.
    fn is_valid_status_code(&self, code: u16) -> bool {
        (200..400).contains(&code)
    }

    /// Rewrites downloaded data before processing. Returning `None` fails the transfer.
    fn did_download_data(&self, data: Bytes, _url: &Url) -> Option<Bytes> {
        Some(data)
    }
}

/// Delegate that keeps every default.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDownloaderDelegate;

impl ImageDownloaderDelegate for DefaultDownloaderDelegate {}

/// Decides how TLS authentication challenges are answered.
pub trait AuthenticationChallengeResponder: Send + Sync {
    /// Returns the disposition for a challenge from `host`.
    fn did_receive_challenge(&self, host: &str) -> ChallengeDisposition;
}

/// Trusts the configured hosts and handles everything else normally.
#[derive(Debug, Clone, Default)]
pub struct DefaultChallengeResponder {
    trusted_hosts: HashSet<String>,
}

impl DefaultChallengeResponder {
    /// Creates a responder trusting the given hosts.
    #[must_use]
    pub fn new(trusted_hosts: impl IntoIterator<Item = String>) -> Self {
        Self {
            trusted_hosts: trusted_hosts.into_iter().collect(),
        }
    }
}

impl AuthenticationChallengeResponder for DefaultChallengeResponder {
    fn did_receive_challenge(&self, host: &str) -> ChallengeDisposition {
        if self.trusted_hosts.contains(host) {
            ChallengeDisposition::UseCredential
        } else {
            ChallengeDisposition::PerformDefaultHandling
        }
    }
}
