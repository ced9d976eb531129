//! Coalesces requests for the same URL into one transfer.
//!
//! The registry maps each URL to at most one pending [`SessionDataTask`]. Lock
//! order is registry map first, then the task's own state.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use reqwest::Url;
use tokio::runtime::Handle;
use tracing::{debug, trace, warn};

use super::session_task::{SessionDataTask, TaskCallback, TaskDoneHandler};
use crate::application::dto::DownloadProgress;
use crate::domain::entities::{CancelToken, DownloadRequest, ResponseMeta};
use crate::domain::errors::{HalcyonError, RequestError, ResponseError};
use crate::domain::ports::{
    AuthenticationChallengeResponder, ChallengeDisposition, ImageDownloaderDelegate,
    NetworkSession, TransferSink, TransportError,
};

/// A caller's handle on one request within a shared transfer.
#[derive(Clone)]
pub struct DownloadTask {
    registry: Arc<SessionRegistry>,
    task: Arc<SessionDataTask>,
    token: CancelToken,
}

impl DownloadTask {
    /// Cancels this request. Other requests sharing the transfer are not affected.
    pub fn cancel(&self) {
        self.registry.cancel(&self.task, self.token);
    }

    /// Token of this request within its transfer.
    #[must_use]
    pub const fn token(&self) -> CancelToken {
        self.token
    }

    /// The transfer this request is attached to.
    #[must_use]
    pub const fn session_task(&self) -> &Arc<SessionDataTask> {
        &self.task
    }
}

impl fmt::Debug for DownloadTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadTask")
            .field("url", &self.task.url().as_str())
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

/// Delegate slot read at the time each event is reported.
pub type DelegateCell = Arc<RwLock<Arc<dyn ImageDownloaderDelegate>>>;

/// Owns the pending transfers, keyed by URL.
pub struct SessionRegistry {
    tasks: Mutex<HashMap<Url, Arc<SessionDataTask>>>,
    session: Arc<dyn NetworkSession>,
    runtime: Handle,
    delegate: DelegateCell,
    challenge_responder: Arc<dyn AuthenticationChallengeResponder>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(
        session: Arc<dyn NetworkSession>,
        runtime: Handle,
        delegate: Arc<dyn ImageDownloaderDelegate>,
        challenge_responder: Arc<dyn AuthenticationChallengeResponder>,
    ) -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
            session,
            runtime,
            delegate: Arc::new(RwLock::new(delegate)),
            challenge_responder,
        }
    }

    /// The current delegate.
    #[must_use]
    pub fn delegate(&self) -> Arc<dyn ImageDownloaderDelegate> {
        Arc::clone(&*self.delegate.read())
    }

    /// Replaces the delegate. Pending transfers report later events to it.
    pub fn set_delegate(&self, delegate: Arc<dyn ImageDownloaderDelegate>) {
        *self.delegate.write() = delegate;
    }

    /// Shares the delegate slot with handlers that outlive a single call.
    #[must_use]
    pub fn delegate_cell(&self) -> DelegateCell {
        Arc::clone(&self.delegate)
    }

    /// Returns the pending task for `url`.
    #[must_use]
    pub fn task(&self, url: &Url) -> Option<Arc<SessionDataTask>> {
        self.tasks.lock().get(url).cloned()
    }

    /// Number of pending transfers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Whether no transfer is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }

    /// Attaches `callback` to the pending transfer for the request's URL, or
    /// creates and starts a new one with the handler built by `make_done`.
    ///
    /// Returns the caller's handle and whether a new transfer was started.
    pub fn start_or_join<F>(
        self: &Arc<Self>,
        request: DownloadRequest,
        callback: TaskCallback,
        make_done: F,
    ) -> (DownloadTask, bool)
    where
        F: FnOnce() -> TaskDoneHandler,
    {
        let url = request.url.clone();
        let (task, token, is_new) = {
            let mut tasks = self.tasks.lock();
            if let Some(task) = tasks.get(&url) {
                let token = task.add_callback(callback);
                (Arc::clone(task), token, false)
            } else {
                let task = Arc::new(SessionDataTask::new(url.clone(), make_done()));
                let token = task.add_callback(callback);
                tasks.insert(url.clone(), Arc::clone(&task));
                (task, token, true)
            }
        };

        if is_new {
            debug!(url = %url, task = task.id(), "Starting transfer");
            self.delegate().will_download(&url, &request);
            self.resume(&task, request);
        } else {
            trace!(url = %url, task = task.id(), token = token, "Joined pending transfer");
        }

        (
            DownloadTask {
                registry: Arc::clone(self),
                task,
                token,
            },
            is_new,
        )
    }

    fn resume(self: &Arc<Self>, task: &Arc<SessionDataTask>, request: DownloadRequest) {
        let registry = Arc::clone(self);
        let session = Arc::clone(&self.session);
        let running = Arc::clone(task);
        let sink: Arc<dyn TransferSink> = Arc::new(TaskSink {
            registry: Arc::clone(self),
            task: Arc::clone(task),
        });
        task.resume(&self.runtime, async move {
            let result = session.execute(request, sink).await;
            registry.did_complete(&running, result);
        });
    }

    fn remove_if_current(tasks: &mut HashMap<Url, Arc<SessionDataTask>>, task: &Arc<SessionDataTask>) {
        if tasks
            .get(task.url())
            .is_some_and(|current| Arc::ptr_eq(current, task))
        {
            tasks.remove(task.url());
        }
    }

    /// Cancels the request identified by `token`.
    ///
    /// The cancelled request receives [`RequestError::TaskCancelled`]. If it was the
    /// last request of the transfer, the transfer is aborted. Cancelling a request
    /// that already completed does nothing.
    pub fn cancel(&self, task: &Arc<SessionDataTask>, token: CancelToken) {
        let (callback, now_empty) = {
            let mut tasks = self.tasks.lock();
            let Some(callback) = task.remove_callback(token) else {
                return;
            };
            let now_empty = task.is_empty();
            if now_empty {
                Self::remove_if_current(&mut tasks, task);
            }
            (callback, now_empty)
        };

        if now_empty && task.abort() {
            debug!(url = %task.url(), task = task.id(), "Last request cancelled, transfer aborted");
        }

        let error = RequestError::task_cancelled(task.url().as_str(), token).into();
        (task.on_done)(Err(error), vec![callback]);
    }

    /// Cancels every request of every pending transfer.
    pub fn cancel_all(&self) {
        let tasks: Vec<_> = self.tasks.lock().drain().map(|(_, task)| task).collect();
        for task in tasks {
            Self::force_cancel(&task);
        }
    }

    /// Cancels every request of the pending transfer for `url`.
    pub fn cancel_url(&self, url: &Url) {
        let task = self.tasks.lock().remove(url);
        if let Some(task) = task {
            Self::force_cancel(&task);
        }
    }

    fn force_cancel(task: &Arc<SessionDataTask>) {
        task.abort();
        let Some((_, callbacks)) = task.take_completion() else {
            return;
        };
        debug!(url = %task.url(), count = callbacks.len(), "Force cancelling transfer");
        for (token, callback) in callbacks {
            let error = RequestError::task_cancelled(task.url().as_str(), token).into();
            (task.on_done)(Err(error), vec![callback]);
        }
    }

    /// Finishes `task` with the outcome of its transfer.
    ///
    /// The task leaves the registry before its waiters are handed to the done handler.
    pub fn did_complete(
        &self,
        task: &Arc<SessionDataTask>,
        result: Result<Option<ResponseMeta>, TransportError>,
    ) {
        task.mark_finished();
        Self::remove_if_current(&mut self.tasks.lock(), task);

        let Some((data, callbacks)) = task.take_completion() else {
            return;
        };
        if callbacks.is_empty() {
            return;
        }
        let callbacks = callbacks.into_iter().map(|(_, callback)| callback).collect();

        let url = task.url();
        let outcome = match result {
            Ok(Some(response)) => match self.delegate().did_download_data(data, url) {
                Some(data) => Ok((data, Some(response))),
                None => {
                    warn!(url = %url, "Downloaded data rejected by delegate");
                    Err(ResponseError::data_modifying_failed(url.as_str()).into())
                }
            },
            Ok(None) => Err(ResponseError::no_response(url.as_str()).into()),
            Err(TransportError::Rejected { status }) => {
                Err(ResponseError::invalid_status(url.as_str(), status).into())
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Transfer failed");
                Err(ResponseError::session(url.as_str(), e.to_string()).into())
            }
        };
        (task.on_done)(outcome, callbacks);
    }

    fn fail(&self, task: &Arc<SessionDataTask>, error: HalcyonError) {
        Self::remove_if_current(&mut self.tasks.lock(), task);
        let Some((_, callbacks)) = task.take_completion() else {
            return;
        };
        let callbacks = callbacks.into_iter().map(|(_, callback)| callback).collect();
        (task.on_done)(Err(error), callbacks);
    }
}

impl fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("pending", &self.len())
            .finish_non_exhaustive()
    }
}

/// Routes the events of one transfer to its task.
struct TaskSink {
    registry: Arc<SessionRegistry>,
    task: Arc<SessionDataTask>,
}

impl TransferSink for TaskSink {
    fn should_allow_response(&self, response: &ResponseMeta) -> bool {
        self.task.set_expected_length(response.content_length);
        if self.registry.delegate().is_valid_status_code(response.status) {
            return true;
        }
        debug!(url = %self.task.url(), status = response.status, "Invalid status code");
        let error = ResponseError::invalid_status(self.task.url().as_str(), response.status);
        self.registry.fail(&self.task, error.into());
        false
    }

    fn did_receive_data(&self, chunk: Bytes) {
        let (received_size, total_size, blocks) = self.task.append(&chunk);
        if blocks.is_empty() {
            return;
        }
        let progress = DownloadProgress {
            chunk,
            received_size,
            total_size,
        };
        for block in blocks {
            block(&progress);
        }
    }

    fn will_redirect(
        &self,
        response: &ResponseMeta,
        new_request: DownloadRequest,
    ) -> Option<DownloadRequest> {
        match self.task.redirect_handler() {
            Some(handler) => handler.handle_redirection(response, new_request),
            None => Some(new_request),
        }
    }

    fn did_receive_challenge(&self, host: &str) -> ChallengeDisposition {
        self.registry.challenge_responder.did_receive_challenge(host)
    }
}
