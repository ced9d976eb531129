//! Port definitions for request modification and redirect handling.

use crate::domain::entities::{DownloadRequest, ResponseMeta};

/// Modifies a request before it is sent.
pub trait RequestModifier: Send + Sync {
    /// Returns the request to send, or `None` to reject it.
    fn modified(&self, request: DownloadRequest) -> Option<DownloadRequest>;
}

type ModifyFn = dyn Fn(DownloadRequest) -> Option<DownloadRequest> + Send + Sync;

/// A request modifier backed by a closure.
pub struct AnyModifier {
    modify: Box<ModifyFn>,
}

impl AnyModifier {
    /// Creates a modifier from a closure.
    pub fn new<F>(modify: F) -> Self
    where
        F: Fn(DownloadRequest) -> Option<DownloadRequest> + Send + Sync + 'static,
    {
        Self {
            modify: Box::new(modify),
        }
    }
}

impl RequestModifier for AnyModifier {
    fn modified(&self, request: DownloadRequest) -> Option<DownloadRequest> {
        (self.modify)(request)
    }
}

/// Decides what happens when a transfer is redirected.
pub trait RedirectHandler: Send + Sync {
    /// Returns the request to follow, or `None` to stop at the redirect response.
    fn handle_redirection(
        &self,
        response: &ResponseMeta,
        new_request: DownloadRequest,
    ) -> Option<DownloadRequest>;
}

type RedirectFn = dyn Fn(&ResponseMeta, DownloadRequest) -> Option<DownloadRequest> + Send + Sync;

/// A redirect handler backed by a closure.
pub struct AnyRedirectHandler {
    handle: Box<RedirectFn>,
}

impl AnyRedirectHandler {
    /// Creates a redirect handler from a closure.
    pub fn new<F>(handle: F) -> Self
    where
        F: Fn(&ResponseMeta, DownloadRequest) -> Option<DownloadRequest> + Send + Sync + 'static,
    {
        Self {
            handle: Box::new(handle),
        }
    }
}

impl RedirectHandler for AnyRedirectHandler {
    fn handle_redirection(
        &self,
        response: &ResponseMeta,
        new_request: DownloadRequest,
    ) -> Option<DownloadRequest> {
        (self.handle)(response, new_request)
    }
}
