//! Execution contexts used to deliver callbacks and run background work.

use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{error, trace, warn};

type Job = Box<dyn FnOnce() + Send + 'static>;

struct QueueInner {
    label: String,
    sender: mpsc::UnboundedSender<Job>,
    thread_id: ThreadId,
}

/// A serial queue backed by one dedicated thread.
///
/// Jobs run in submission order. The thread exits once every clone of the
/// queue has been dropped and the pending jobs have drained.
#[derive(Clone)]
pub struct DispatchQueue {
    inner: Arc<QueueInner>,
}

impl DispatchQueue {
    /// Spawns the worker thread for a new queue.
    ///
    /// # Errors
    /// Returns error if the thread cannot be spawned.
    pub fn new(label: impl Into<String>) -> io::Result<Self> {
        let label = label.into();
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();
        let thread_label = label.clone();

        let handle = thread::Builder::new()
            .name(label.clone())
            .spawn(move || {
                while let Some(job) = receiver.blocking_recv() {
                    if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                        error!(queue = %thread_label, "Dispatched job panicked");
                    }
                }
                trace!(queue = %thread_label, "Dispatch queue drained");
            })?;

        Ok(Self {
            inner: Arc::new(QueueInner {
                label,
                sender,
                thread_id: handle.thread().id(),
            }),
        })
    }

    /// Returns the queue label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Enqueues a job. Returns false if the worker thread is gone.
    pub fn execute<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        if self.inner.sender.send(Box::new(job)).is_err() {
            warn!(queue = %self.inner.label, "Dispatch queue is closed, job dropped");
            return false;
        }
        true
    }

    /// Returns true if called from this queue's worker thread.
    #[must_use]
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.inner.thread_id
    }

    /// Blocks until every job enqueued before this call has run.
    ///
    /// Returns immediately when called from the queue itself.
    pub fn wait_until_idle(&self) {
        if self.is_current() {
            return;
        }
        let (tx, rx) = std::sync::mpsc::channel();
        if self.execute(move || {
            let _ = tx.send(());
        }) {
            let _ = rx.recv();
        }
    }
}

impl fmt::Debug for DispatchQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchQueue")
            .field("label", &self.inner.label)
            .finish_non_exhaustive()
    }
}

/// Where a callback is delivered.
#[derive(Clone, Debug)]
pub enum CallbackQueue {
    /// Run on whatever thread delivers the event.
    Untouch,
    /// Always enqueue on the given serial queue.
    Async(DispatchQueue),
    /// Run inline when already on the given queue, otherwise enqueue.
    CurrentOrAsync(DispatchQueue),
    /// Spawn on a tokio runtime.
    Runtime(Handle),
}

impl CallbackQueue {
    /// Runs `job` according to the variant.
    pub fn execute<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        match self {
            Self::Untouch => job(),
            Self::Async(queue) => {
                queue.execute(job);
            }
            Self::CurrentOrAsync(queue) => {
                if queue.is_current() {
                    job();
                } else {
                    queue.execute(job);
                }
            }
            Self::Runtime(handle) => {
                handle.spawn(async move { job() });
            }
        }
    }
}

/// Shared execution contexts handed to the components that need them.
#[derive(Clone, Debug)]
pub struct DispatchContexts {
    /// Runtime that transfers are spawned on.
    pub runtime: Handle,
    /// Default queue for delivering completions.
    pub callback_queue: DispatchQueue,
    /// Default queue for decoding and processing downloaded data.
    pub processing_queue: DispatchQueue,
}

impl DispatchContexts {
    /// Creates the default callback and processing queues on top of `runtime`.
    ///
    /// # Errors
    /// Returns error if a queue thread cannot be spawned.
    pub fn new(runtime: Handle) -> io::Result<Self> {
        Ok(Self {
            runtime,
            callback_queue: DispatchQueue::new("halcyon.callback")?,
            processing_queue: DispatchQueue::new("halcyon.processing")?,
        })
    }

    /// Creates contexts on the runtime of the calling task.
    ///
    /// # Errors
    /// Returns error if called outside a tokio runtime or a queue thread cannot be spawned.
    pub fn current() -> io::Result<Self> {
        let runtime = Handle::try_current().map_err(io::Error::other)?;
        Self::new(runtime)
    }

    /// Default delivery for completions: inline on the callback queue, else enqueued.
    #[must_use]
    pub fn default_callback_queue(&self) -> CallbackQueue {
        CallbackQueue::CurrentOrAsync(self.callback_queue.clone())
    }

    /// Default queue for processing downloaded data.
    #[must_use]
    pub fn default_processing_queue(&self) -> CallbackQueue {
        CallbackQueue::Async(self.processing_queue.clone())
    }
}
