//! One in-flight transfer shared by every request for the same URL.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use reqwest::Url;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::trace;

use crate::application::dto::{DownloadOptions, ImageLoadingResult, ProgressBlock};
use crate::domain::dispatch::CallbackQueue;
use crate::domain::entities::{CancelToken, ResponseMeta};
use crate::domain::errors::HalcyonError;
use crate::domain::ports::RedirectHandler;

/// Receives the final result of one request.
pub type CompletionHandler = Box<dyn FnOnce(Result<ImageLoadingResult, HalcyonError>) + Send>;

/// Downloaded data and response, or the failure shared by every waiter.
pub type TaskOutcome = Result<(Bytes, Option<ResponseMeta>), HalcyonError>;

/// Called once a task is done with the waiters it was done for.
pub type TaskDoneHandler = Arc<dyn Fn(TaskOutcome, Vec<TaskCallback>) + Send + Sync>;

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// A waiter attached to a task.
pub struct TaskCallback {
    /// Completion of the request, if the caller asked for one.
    pub on_completed: Option<CompletionHandler>,
    /// Options the request was made with.
    pub options: DownloadOptions,
    /// Where the completion is delivered.
    pub callback_queue: CallbackQueue,
}

impl TaskCallback {
    /// Creates a waiter.
    #[must_use]
    pub fn new(
        on_completed: Option<CompletionHandler>,
        options: DownloadOptions,
        callback_queue: CallbackQueue,
    ) -> Self {
        Self {
            on_completed,
            options,
            callback_queue,
        }
    }

    /// Delivers `result` on the waiter's callback queue.
    pub fn complete(self, result: Result<ImageLoadingResult, HalcyonError>) {
        if let Some(handler) = self.on_completed {
            self.callback_queue.execute(move || handler(result));
        }
    }
}

impl fmt::Debug for TaskCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskCallback")
            .field("has_completion", &self.on_completed.is_some())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct TaskState {
    data: BytesMut,
    callbacks: BTreeMap<CancelToken, TaskCallback>,
    next_token: CancelToken,
    expected_length: Option<u64>,
    completed: bool,
}

enum TransferState {
    Pending,
    Running(AbortHandle),
    Aborted,
    Finished,
}

/// Shared state of one transfer: received bytes and the waiters attached to it.
pub struct SessionDataTask {
    id: u64,
    url: Url,
    state: Mutex<TaskState>,
    transfer: Mutex<TransferState>,
    pub(super) on_done: TaskDoneHandler,
}

impl SessionDataTask {
    /// Creates a pending task for `url`.
    #[must_use]
    pub fn new(url: Url, on_done: TaskDoneHandler) -> Self {
        Self {
            id: NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed),
            url,
            state: Mutex::new(TaskState::default()),
            transfer: Mutex::new(TransferState::Pending),
            on_done,
        }
    }

    /// Unique id, distinguishing tasks created for the same URL over time.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// The URL this task downloads.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Attaches a waiter and returns its cancel token.
    pub fn add_callback(&self, callback: TaskCallback) -> CancelToken {
        let mut state = self.state.lock();
        let token = state.next_token;
        state.next_token += 1;
        state.callbacks.insert(token, callback);
        token
    }

    /// Detaches the waiter for `token`, if it is still attached.
    pub fn remove_callback(&self, token: CancelToken) -> Option<TaskCallback> {
        self.state.lock().callbacks.remove(&token)
    }

    /// Number of attached waiters.
    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.state.lock().callbacks.len()
    }

    /// Whether no waiter is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().callbacks.is_empty()
    }

    /// Redirect handler of the most recently attached waiter.
    #[must_use]
    pub fn redirect_handler(&self) -> Option<Arc<dyn RedirectHandler>> {
        self.state
            .lock()
            .callbacks
            .values()
            .next_back()
            .and_then(|callback| callback.options.redirect_handler.clone())
    }

    pub(super) fn set_expected_length(&self, length: Option<u64>) {
        self.state.lock().expected_length = length;
    }

    /// Appends a chunk. Returns the cumulative size, the declared length and the
    /// progress blocks of the current waiters.
    pub(super) fn append(&self, chunk: &Bytes) -> (u64, Option<u64>, Vec<ProgressBlock>) {
        let mut state = self.state.lock();
        state.data.extend_from_slice(chunk);
        let blocks = state
            .callbacks
            .values()
            .filter_map(|callback| callback.options.on_progress.clone())
            .collect();
        (state.data.len() as u64, state.expected_length, blocks)
    }

    /// Marks the task completed and takes its data and waiters.
    ///
    /// Returns `None` if the task was already completed.
    pub(super) fn take_completion(&self) -> Option<(Bytes, Vec<(CancelToken, TaskCallback)>)> {
        let mut state = self.state.lock();
        if state.completed {
            return None;
        }
        state.completed = true;
        let data = std::mem::take(&mut state.data).freeze();
        let callbacks = std::mem::take(&mut state.callbacks).into_iter().collect();
        Some((data, callbacks))
    }

    /// Starts the transfer on `runtime`. Only the first call has an effect.
    pub fn resume<F>(&self, runtime: &Handle, transfer: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut state = self.transfer.lock();
        if !matches!(*state, TransferState::Pending) {
            return false;
        }
        let handle = runtime.spawn(transfer);
        *state = TransferState::Running(handle.abort_handle());
        trace!(task = self.id, url = %self.url, "Transfer started");
        true
    }

    /// Whether the transfer has been started.
    #[must_use]
    pub fn started(&self) -> bool {
        !matches!(*self.transfer.lock(), TransferState::Pending)
    }

    /// Aborts the transfer. Returns true only for the call that aborted it.
    pub fn abort(&self) -> bool {
        let mut state = self.transfer.lock();
        match std::mem::replace(&mut *state, TransferState::Aborted) {
            TransferState::Running(handle) => {
                handle.abort();
                trace!(task = self.id, url = %self.url, "Transfer aborted");
                true
            }
            TransferState::Pending => true,
            previous @ TransferState::Finished => {
                *state = previous;
                false
            }
            TransferState::Aborted => false,
        }
    }

    /// Whether the transfer was aborted.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        matches!(*self.transfer.lock(), TransferState::Aborted)
    }

    pub(super) fn mark_finished(&self) {
        let mut state = self.transfer.lock();
        if !matches!(*state, TransferState::Aborted) {
            *state = TransferState::Finished;
        }
    }
}

impl fmt::Debug for SessionDataTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionDataTask")
            .field("id", &self.id)
            .field("url", &self.url.as_str())
            .field("callbacks", &self.callback_count())
            .finish_non_exhaustive()
    }
}
