//! Request and response values exchanged with the network session.

use std::time::Duration;

use reqwest::Url;
use reqwest::header::{
    AUTHORIZATION, COOKIE, HeaderMap, HeaderName, HeaderValue, PROXY_AUTHORIZATION,
    WWW_AUTHENTICATE,
};

/// Headers dropped when a redirect leaves the origin of the request.
const CREDENTIAL_HEADERS: [HeaderName; 4] =
    [AUTHORIZATION, COOKIE, PROXY_AUTHORIZATION, WWW_AUTHENTICATE];

/// Identifies one waiter within a download task.
pub type CancelToken = u64;

/// A request for image data.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    /// Target URL.
    pub url: Url,
    /// Extra request headers.
    pub headers: HeaderMap,
    /// Per-request timeout enforced by the network session.
    pub timeout: Duration,
}

impl DownloadRequest {
    /// Creates a request without extra headers.
    #[must_use]
    pub fn new(url: Url, timeout: Duration) -> Self {
        Self {
            url,
            headers: HeaderMap::new(),
            timeout,
        }
    }

    /// Adds a header to the request.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Returns the same request pointed at a new URL.
    ///
    /// Credential headers are kept only when `url` has the scheme, host and
    /// port of the current request.
    #[must_use]
    pub fn redirected_to(&self, url: Url) -> Self {
        let mut headers = self.headers.clone();
        if !same_origin(&self.url, &url) {
            for name in CREDENTIAL_HEADERS {
                headers.remove(name);
            }
        }
        Self {
            url,
            headers,
            timeout: self.timeout,
        }
    }
}

fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
}

/// Metadata of a response received from the network session.
#[derive(Debug, Clone)]
pub struct ResponseMeta {
    /// The URL the response was served from.
    pub url: Url,
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Declared body length, if any.
    pub content_length: Option<u64>,
}

impl ResponseMeta {
    /// Returns the declared content type.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }
}
