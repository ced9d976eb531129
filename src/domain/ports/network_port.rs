//! Port definition for the network session that performs transfers.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::domain::entities::{DownloadRequest, ResponseMeta};

/// Failures reported by a network session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {message}")]
    Connect { message: String },

    #[error("http error: {message}")]
    Http { message: String },

    #[error("response with status {status} was not accepted")]
    Rejected { status: u16 },

    #[error("redirect limit of {limit} exceeded")]
    TooManyRedirects { limit: usize },

    #[error("authentication challenge for {host} was cancelled")]
    ChallengeCancelled { host: String },
}

/// Decision taken for a server authentication challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChallengeDisposition {
    /// Let the session validate the server normally.
    #[default]
    PerformDefaultHandling,
    /// Trust the server even if its certificate does not validate.
    UseCredential,
    /// Abort the request.
    CancelChallenge,
}

/// Receives the events of one transfer.
///
/// Calls for one transfer are made sequentially, in the order events happen.
pub trait TransferSink: Send + Sync {
    /// Called with the final response before its body is read.
    /// Returning false stops the transfer.
    fn should_allow_response(&self, response: &ResponseMeta) -> bool;

    /// Called for every body chunk, in arrival order.
    fn did_receive_data(&self, chunk: Bytes);

    /// Called before a redirect is followed. `None` stops at the redirect response.
    fn will_redirect(
        &self,
        response: &ResponseMeta,
        new_request: DownloadRequest,
    ) -> Option<DownloadRequest>;

    /// Called before connecting to a TLS host.
    fn did_receive_challenge(&self, host: &str) -> ChallengeDisposition;
}

/// Port for performing HTTP transfers.
#[async_trait]
pub trait NetworkSession: Send + Sync {
    /// Executes the request, streaming events into `sink`.
    ///
    /// Resolves with the final response metadata once the body is complete.
    /// `Ok(None)` means the transfer finished without producing a response.
    async fn execute(
        &self,
        request: DownloadRequest,
        sink: Arc<dyn TransferSink>,
    ) -> Result<Option<ResponseMeta>, TransportError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use reqwest::Url;
    use reqwest::header::HeaderMap;
    use tokio::sync::Notify;

    /// Sets the flag when dropped before `disarm` is called.
    struct AbortMarker<'a> {
        flag: &'a AtomicBool,
        armed: bool,
    }

    impl AbortMarker<'_> {
        fn disarm(mut self) {
            self.armed = false;
        }
    }

    impl Drop for AbortMarker<'_> {
        fn drop(&mut self) {
            if self.armed {
                self.flag.store(true, Ordering::SeqCst);
            }
        }
    }

    /// Network session answering every request with a fixed script.
    pub struct ScriptedSession {
        status: u16,
        chunks: Vec<Bytes>,
        failure: Option<TransportError>,
        redirect: Option<Url>,
        gate: Option<Notify>,
        executions: AtomicUsize,
        aborted: AtomicBool,
    }

    impl ScriptedSession {
        /// Responds with `status` and the body split into `chunks`.
        pub fn responding(status: u16, chunks: Vec<Bytes>) -> Self {
            Self {
                status,
                chunks,
                failure: None,
                redirect: None,
                gate: None,
                executions: AtomicUsize::new(0),
                aborted: AtomicBool::new(false),
            }
        }

        /// Responds with 200 and a single-chunk body.
        pub fn ok(body: Bytes) -> Self {
            Self::responding(200, vec![body])
        }

        /// Fails every request.
        pub fn failing(error: TransportError) -> Self {
            let mut session = Self::responding(200, Vec::new());
            session.failure = Some(error);
            session
        }

        /// Holds every transfer until [`Self::release`] is called.
        pub fn gated(mut self) -> Self {
            self.gate = Some(Notify::new());
            self
        }

        /// Answers the first hop with a 302 to `target`.
        pub fn redirecting_to(mut self, target: Url) -> Self {
            self.redirect = Some(target);
            self
        }

        /// Lets one held transfer continue.
        pub fn release(&self) {
            if let Some(gate) = &self.gate {
                gate.notify_one();
            }
        }

        /// Number of transfers started.
        pub fn executions(&self) -> usize {
            self.executions.load(Ordering::SeqCst)
        }

        /// Whether a transfer was dropped before finishing.
        pub fn was_aborted(&self) -> bool {
            self.aborted.load(Ordering::SeqCst)
        }

        fn meta(&self, url: Url, status: u16) -> ResponseMeta {
            let length = self.chunks.iter().map(|c| c.len() as u64).sum();
            ResponseMeta {
                url,
                status,
                headers: HeaderMap::new(),
                content_length: Some(length),
            }
        }
    }

    #[async_trait]
    impl NetworkSession for ScriptedSession {
        async fn execute(
            &self,
            request: DownloadRequest,
            sink: Arc<dyn TransferSink>,
        ) -> Result<Option<ResponseMeta>, TransportError> {
            self.executions.fetch_add(1, Ordering::SeqCst);
            let marker = AbortMarker {
                flag: &self.aborted,
                armed: true,
            };

            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if let Some(failure) = &self.failure {
                marker.disarm();
                return Err(failure.clone());
            }

            let mut meta = self.meta(request.url.clone(), self.status);
            if let Some(target) = &self.redirect {
                let hop = self.meta(request.url.clone(), 302);
                match sink.will_redirect(&hop, request.redirected_to(target.clone())) {
                    Some(next) => meta = self.meta(next.url, self.status),
                    None => {
                        marker.disarm();
                        if !sink.should_allow_response(&hop) {
                            return Err(TransportError::Rejected { status: 302 });
                        }
                        return Ok(Some(hop));
                    }
                }
            }

            if !sink.should_allow_response(&meta) {
                marker.disarm();
                return Err(TransportError::Rejected {
                    status: meta.status,
                });
            }
            for chunk in &self.chunks {
                tokio::task::yield_now().await;
                sink.did_receive_data(chunk.clone());
            }
            marker.disarm();
            Ok(Some(meta))
        }
    }
}
