//! [`NetworkSession`] backed by reqwest with manual redirect handling.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use reqwest::redirect::Policy;
use tracing::{debug, trace};

use crate::domain::entities::{DownloadRequest, ResponseMeta};
use crate::domain::ports::{ChallengeDisposition, NetworkSession, TransferSink, TransportError};

/// Maximum number of redirects followed for one transfer.
pub const MAX_REDIRECTS: usize = 10;

/// HTTP session that streams response bodies into a [`TransferSink`].
///
/// Automatic redirects are disabled so every hop can be inspected by the sink.
#[derive(Debug, Clone)]
pub struct ReqwestSession {
    client: reqwest::Client,
    trusting_client: reqwest::Client,
}

impl ReqwestSession {
    /// Creates the session.
    ///
    /// # Errors
    /// Returns error if the HTTP clients cannot be built.
    pub fn new() -> Result<Self, TransportError> {
        Ok(Self {
            client: build_client(false)?,
            trusting_client: build_client(true)?,
        })
    }

    fn client_for(
        &self,
        url: &Url,
        sink: &dyn TransferSink,
    ) -> Result<&reqwest::Client, TransportError> {
        if url.scheme() != "https" {
            return Ok(&self.client);
        }
        let host = url.host_str().unwrap_or_default();
        match sink.did_receive_challenge(host) {
            ChallengeDisposition::PerformDefaultHandling => Ok(&self.client),
            ChallengeDisposition::UseCredential => {
                debug!(host = %host, "Trusting server for challenge");
                Ok(&self.trusting_client)
            }
            ChallengeDisposition::CancelChallenge => Err(TransportError::ChallengeCancelled {
                host: host.to_owned(),
            }),
        }
    }
}

fn build_client(accept_invalid_certs: bool) -> Result<reqwest::Client, TransportError> {
    reqwest::Client::builder()
        .redirect(Policy::none())
        .danger_accept_invalid_certs(accept_invalid_certs)
        .build()
        .map_err(|e| TransportError::Http {
            message: format!("Failed to create HTTP client: {e}"),
        })
}

fn map_reqwest_error(error: &reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_connect() {
        TransportError::Connect {
            message: error.to_string(),
        }
    } else {
        TransportError::Http {
            message: error.to_string(),
        }
    }
}

fn response_meta(response: &reqwest::Response) -> ResponseMeta {
    ResponseMeta {
        url: response.url().clone(),
        status: response.status().as_u16(),
        headers: response.headers().clone(),
        content_length: response.content_length(),
    }
}

fn redirect_target(meta: &ResponseMeta) -> Option<Url> {
    if !(300..400).contains(&meta.status) {
        return None;
    }
    let location = meta
        .headers
        .get(reqwest::header::LOCATION)?
        .to_str()
        .ok()?;
    meta.url.join(location).ok()
}

#[async_trait]
impl NetworkSession for ReqwestSession {
    async fn execute(
        &self,
        request: DownloadRequest,
        sink: Arc<dyn TransferSink>,
    ) -> Result<Option<ResponseMeta>, TransportError> {
        let mut request = request;
        let mut redirects = 0;

        loop {
            let client = self.client_for(&request.url, sink.as_ref())?;
            trace!(url = %request.url, "Sending request");
            let mut response = client
                .get(request.url.clone())
                .headers(request.headers.clone())
                .timeout(request.timeout)
                .send()
                .await
                .map_err(|e| map_reqwest_error(&e))?;
            let meta = response_meta(&response);

            if let Some(target) = redirect_target(&meta) {
                if redirects >= MAX_REDIRECTS {
                    return Err(TransportError::TooManyRedirects {
                        limit: MAX_REDIRECTS,
                    });
                }
                if let Some(next) = sink.will_redirect(&meta, request.redirected_to(target)) {
                    redirects += 1;
                    debug!(from = %meta.url, to = %next.url, "Following redirect");
                    request = next;
                    continue;
                }
            }

            if !sink.should_allow_response(&meta) {
                return Err(TransportError::Rejected {
                    status: meta.status,
                });
            }

            while let Some(chunk) = response.chunk().await.map_err(|e| map_reqwest_error(&e))? {
                sink.did_receive_data(chunk);
            }
            return Ok(Some(meta));
        }
    }
}
