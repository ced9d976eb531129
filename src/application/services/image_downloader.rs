//! Public entry point for downloading images.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use tokio::sync::oneshot;
use tracing::{debug, info};

use super::image_data_processor::ImageDataProcessor;
use super::session_registry::{DownloadTask, SessionRegistry};
use super::session_task::{CompletionHandler, TaskCallback, TaskDoneHandler, TaskOutcome};
use crate::application::dto::{DownloadOptions, ImageLoadingResult};
use crate::domain::dispatch::{CallbackQueue, DispatchContexts};
use crate::domain::entities::DownloadRequest;
use crate::domain::errors::{HalcyonError, RequestError, ResponseError};
use crate::domain::ports::{
    AuthenticationChallengeResponder, DefaultChallengeResponder, DefaultDownloaderDelegate,
    ImageDownloaderDelegate, NetworkSession,
};
use crate::infrastructure::network::ReqwestSession;

/// Default timeout of one transfer.
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(15);

/// Settings shared by every download of one downloader.
#[derive(Clone)]
pub struct DownloaderConfig {
    /// Timeout applied to each transfer.
    pub download_timeout: Duration,
    /// Hosts whose certificates are trusted without validation.
    pub trusted_hosts: Vec<String>,
    /// Replaces the responder built from `trusted_hosts`.
    pub challenge_responder: Option<Arc<dyn AuthenticationChallengeResponder>>,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
            trusted_hosts: Vec::new(),
            challenge_responder: None,
        }
    }
}

impl fmt::Debug for DownloaderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloaderConfig")
            .field("download_timeout", &self.download_timeout)
            .field("trusted_hosts", &self.trusted_hosts)
            .field("challenge_responder", &self.challenge_responder.is_some())
            .finish()
    }
}

/// Downloads and processes images, sharing one transfer between concurrent
/// requests for the same URL.
pub struct ImageDownloader {
    name: String,
    config: DownloaderConfig,
    contexts: DispatchContexts,
    registry: Arc<SessionRegistry>,
}

impl ImageDownloader {
    /// Creates a downloader backed by a [`ReqwestSession`].
    ///
    /// # Errors
    /// Returns error if the name is empty or the HTTP client cannot be built.
    pub fn new(
        name: impl Into<String>,
        config: DownloaderConfig,
        contexts: &DispatchContexts,
    ) -> Result<Self, HalcyonError> {
        let name = name.into();
        let session = ReqwestSession::new()
            .map_err(|e| ResponseError::session(format!("downloader {name}"), e.to_string()))?;
        Self::with_session(name, config, contexts, Arc::new(session))
    }

    /// Creates a downloader on top of an existing network session.
    ///
    /// # Errors
    /// Returns [`RequestError::EmptyDownloaderName`] if `name` is empty.
    pub fn with_session(
        name: impl Into<String>,
        config: DownloaderConfig,
        contexts: &DispatchContexts,
        session: Arc<dyn NetworkSession>,
    ) -> Result<Self, HalcyonError> {
        let name = name.into();
        if name.is_empty() {
            return Err(RequestError::EmptyDownloaderName.into());
        }

        let challenge_responder = config.challenge_responder.clone().unwrap_or_else(|| {
            Arc::new(DefaultChallengeResponder::new(config.trusted_hosts.clone()))
        });
        let registry = Arc::new(SessionRegistry::new(
            session,
            contexts.runtime.clone(),
            Arc::new(DefaultDownloaderDelegate),
            challenge_responder,
        ));

        info!(downloader = %name, timeout = ?config.download_timeout, "Image downloader created");
        Ok(Self {
            name,
            config,
            contexts: contexts.clone(),
            registry,
        })
    }

    /// Replaces the delegate, see [`Self::set_delegate`].
    #[must_use]
    pub fn with_delegate(self, delegate: Arc<dyn ImageDownloaderDelegate>) -> Self {
        self.set_delegate(delegate);
        self
    }

    /// Replaces the delegate. Transfers in flight stay pending and report
    /// their remaining events to the new delegate.
    pub fn set_delegate(&self, delegate: Arc<dyn ImageDownloaderDelegate>) {
        self.registry.set_delegate(delegate);
    }

    /// The current delegate.
    #[must_use]
    pub fn delegate(&self) -> Arc<dyn ImageDownloaderDelegate> {
        self.registry.delegate()
    }

    /// Name of the downloader.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Settings of the downloader.
    #[must_use]
    pub const fn config(&self) -> &DownloaderConfig {
        &self.config
    }

    /// Number of transfers in flight.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.registry.len()
    }

    /// Starts downloading `url`, or joins the transfer already running for it.
    ///
    /// Returns `None` if the request could not be built; `completion` then
    /// receives the error on the request's callback queue.
    pub fn download_image(
        &self,
        url: Url,
        options: DownloadOptions,
        completion: Option<CompletionHandler>,
    ) -> Option<DownloadTask> {
        let callback_queue = options
            .callback_queue
            .clone()
            .unwrap_or_else(|| self.contexts.default_callback_queue());

        let mut request = DownloadRequest::new(url, self.config.download_timeout);
        if let Some(modifier) = options.request_modifier.clone() {
            let Some(modified) = modifier.modified(request) else {
                debug!(downloader = %self.name, "Request modifier rejected the request");
                TaskCallback::new(completion, options, callback_queue)
                    .complete(Err(RequestError::EmptyRequest.into()));
                return None;
            };
            request = modified;
        }

        if !matches!(request.url.scheme(), "http" | "https") {
            debug!(downloader = %self.name, url = %request.url, "Unsupported url scheme");
            let error = RequestError::invalid_url(request.url.as_str()).into();
            TaskCallback::new(completion, options, callback_queue).complete(Err(error));
            return None;
        }

        let processing_queue = options
            .processing_queue
            .clone()
            .unwrap_or_else(|| self.contexts.default_processing_queue());
        let task_url = request.url.clone();
        let callback = TaskCallback::new(completion, options, callback_queue);
        let (task, _) = self.registry.start_or_join(request, callback, || {
            self.make_done_handler(task_url, processing_queue)
        });
        Some(task)
    }

    /// Downloads `url` and waits for the result.
    ///
    /// The completion is delivered inline unless `options` names a callback
    /// queue. Dropping the future cancels the request.
    ///
    /// # Errors
    /// Returns the error the request failed with.
    pub async fn retrieve_image(
        &self,
        url: Url,
        options: DownloadOptions,
    ) -> Result<ImageLoadingResult, HalcyonError> {
        let options = if options.callback_queue.is_none() {
            options.with_callback_queue(CallbackQueue::Untouch)
        } else {
            options
        };

        let (tx, rx) = oneshot::channel();
        let no_response = ResponseError::no_response(url.as_str());
        let task = self.download_image(
            url,
            options,
            Some(Box::new(move |result| {
                let _ = tx.send(result);
            })),
        );
        let _guard = CancelOnDrop(task);

        rx.await.map_err(|_| HalcyonError::from(no_response))?
    }

    /// Cancels every request of every transfer in flight.
    pub fn cancel_all(&self) {
        self.registry.cancel_all();
    }

    /// Cancels every request for `url`.
    pub fn cancel(&self, url: &Url) {
        self.registry.cancel_url(url);
    }

    fn make_done_handler(&self, url: Url, processing_queue: CallbackQueue) -> TaskDoneHandler {
        let delegate_cell = self.registry.delegate_cell();
        Arc::new(move |outcome: TaskOutcome, callbacks: Vec<TaskCallback>| {
            let delegate = Arc::clone(&*delegate_cell.read());
            match outcome {
                Ok((data, response)) => {
                    delegate.did_finish_downloading(&url, response.as_ref(), None);
                    let delegate = Arc::clone(&delegate);
                    let url = url.clone();
                    let original_data = data.clone();
                    ImageDataProcessor::new(data, callbacks, processing_queue.clone()).process(
                        move |result, callback| {
                            let result = result.map(|image| {
                                delegate.did_download_image(&image, &url, response.as_ref());
                                ImageLoadingResult {
                                    image,
                                    url: url.clone(),
                                    original_data: original_data.clone(),
                                }
                            });
                            callback.complete(result);
                        },
                    );
                }
                Err(error) => {
                    delegate.did_finish_downloading(&url, None, Some(&error));
                    for callback in callbacks {
                        callback.complete(Err(error.clone()));
                    }
                }
            }
        })
    }
}

impl fmt::Debug for ImageDownloader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageDownloader")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

struct CancelOnDrop(Option<DownloadTask>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if let Some(task) = self.0.take() {
            task.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bytes::Bytes;
    use tokio::sync::mpsc;

    use crate::domain::entities::{ImageArtifact, ProcessItem, ResponseMeta};
    use crate::domain::ports::mocks::{MockImageDownloaderDelegate, ScriptedSession};
    use crate::domain::ports::{
        AnyImageModifier, AnyModifier, AnyRedirectHandler, GeneralProcessor, ImageProcessor,
    };
    use crate::domain::services::fixtures;

    type Results = mpsc::UnboundedReceiver<Result<ImageLoadingResult, HalcyonError>>;

    fn url() -> Url {
        Url::parse("https://example.com/avatar.png").unwrap()
    }

    fn downloader(session: &Arc<ScriptedSession>) -> ImageDownloader {
        let contexts = DispatchContexts::current().unwrap();
        let session: Arc<dyn NetworkSession> = session.clone();
        ImageDownloader::with_session("test", DownloaderConfig::default(), &contexts, session)
            .unwrap()
    }

    fn options() -> DownloadOptions {
        DownloadOptions::default().with_callback_queue(CallbackQueue::Untouch)
    }

    fn start(
        downloader: &ImageDownloader,
        options: DownloadOptions,
    ) -> (Option<DownloadTask>, Results) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = downloader.download_image(
            url(),
            options,
            Some(Box::new(move |result| {
                let _ = tx.send(result);
            })),
        );
        (task, rx)
    }

    async fn next(results: &mut Results) -> Result<ImageLoadingResult, HalcyonError> {
        tokio::time::timeout(Duration::from_secs(5), results.recv())
            .await
            .expect("result delivered in time")
            .expect("completion called")
    }

    fn counting_processor(calls: &Arc<AtomicUsize>) -> Arc<dyn ImageProcessor> {
        let calls = Arc::clone(calls);
        Arc::new(GeneralProcessor::new("counting", move |item, _| {
            calls.fetch_add(1, Ordering::SeqCst);
            match item {
                ProcessItem::Data(data) => image::load_from_memory(&data)
                    .ok()
                    .map(|image| Arc::new(ImageArtifact::new(image))),
                ProcessItem::Image(image) => Some(image),
            }
        }))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_downloads_share_one_transfer() {
        let session = Arc::new(ScriptedSession::ok(fixtures::png(4, 3)).gated());
        let downloader = downloader(&session);

        let mut receivers = Vec::new();
        for _ in 0..3 {
            let (task, rx) = start(&downloader, options());
            assert!(task.is_some());
            receivers.push(rx);
        }
        assert_eq!(downloader.in_flight_count(), 1);
        session.release();

        let mut images = Vec::new();
        for rx in &mut receivers {
            let result = next(rx).await.unwrap();
            assert_eq!(result.url, url());
            assert_eq!(result.original_data, fixtures::png(4, 3));
            images.push(result.image);
        }

        assert_eq!(session.executions(), 1);
        assert!(images.iter().all(|image| Arc::ptr_eq(image, &images[0])));
        assert_eq!(images[0].width(), 4);
        assert_eq!(downloader.in_flight_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancel_one_of_two_waiters() {
        let session = Arc::new(ScriptedSession::ok(fixtures::png(2, 2)).gated());
        let downloader = downloader(&session);

        let (first, mut first_rx) = start(&downloader, options());
        let (_second, mut second_rx) = start(&downloader, options());
        first.unwrap().cancel();

        let cancelled = next(&mut first_rx).await.unwrap_err();
        assert!(cancelled.is_task_cancelled());

        session.release();
        assert!(next(&mut second_rx).await.is_ok());
        assert!(!session.was_aborted());
        assert_eq!(session.executions(), 1);
    }

    fn assert_cancelled(error: &HalcyonError, task: &DownloadTask) {
        assert!(matches!(
            error,
            HalcyonError::Request(RequestError::TaskCancelled { token, .. }) if *token == task.token()
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancel_sole_waiter_aborts_running_transfer() {
        let session = Arc::new(ScriptedSession::ok(fixtures::png(2, 2)).gated());
        let downloader = downloader(&session);

        let (task, mut rx) = start(&downloader, options());
        let task = task.unwrap();
        tokio::time::timeout(Duration::from_secs(5), async {
            while session.executions() == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("transfer started");
        task.cancel();

        assert_cancelled(&next(&mut rx).await.unwrap_err(), &task);
        assert_eq!(downloader.in_flight_count(), 0);
        tokio::time::timeout(Duration::from_secs(5), async {
            while !session.was_aborted() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("transfer aborted");

        session.release();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(session.executions(), 1);
    }

    // Single-threaded runtime: the spawned transfer is not polled before `cancel`.
    #[tokio::test]
    async fn test_cancel_sole_waiter_before_transfer_starts() {
        let session = Arc::new(ScriptedSession::ok(fixtures::png(2, 2)).gated());
        let downloader = downloader(&session);

        let (task, mut rx) = start(&downloader, options());
        let task = task.unwrap();
        task.cancel();

        assert!(task.session_task().is_aborted());
        assert_eq!(downloader.in_flight_count(), 0);
        assert_cancelled(&next(&mut rx).await.unwrap_err(), &task);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(session.executions(), 0);
        assert!(!session.was_aborted());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancel_after_completion_is_noop() {
        let session = Arc::new(ScriptedSession::ok(fixtures::png(2, 2)));
        let downloader = downloader(&session);

        let (task, mut rx) = start(&downloader, options());
        assert!(next(&mut rx).await.is_ok());
        task.unwrap().cancel();

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_processor_runs_once_for_shared_identifier() {
        let session = Arc::new(ScriptedSession::ok(fixtures::png(2, 2)).gated());
        let downloader = downloader(&session);
        let calls = Arc::new(AtomicUsize::new(0));
        let processed = options().with_processor(counting_processor(&calls));

        let (_a, mut a_rx) = start(&downloader, processed.clone());
        let (_b, mut b_rx) = start(&downloader, processed);
        session.release();

        let a = next(&mut a_rx).await.unwrap();
        let b = next(&mut b_rx).await.unwrap();
        assert!(Arc::ptr_eq(&a.image, &b.image));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_rejected_request_fails_before_network() {
        let session = Arc::new(ScriptedSession::ok(fixtures::png(2, 2)));
        let downloader = downloader(&session);
        let rejecting = options().with_request_modifier(Arc::new(AnyModifier::new(|_| None)));

        let (task, mut rx) = start(&downloader, rejecting);

        assert!(task.is_none());
        assert_eq!(
            next(&mut rx).await.unwrap_err(),
            HalcyonError::Request(RequestError::EmptyRequest)
        );
        assert_eq!(session.executions(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_modified_request_with_unsupported_scheme() {
        let session = Arc::new(ScriptedSession::ok(fixtures::png(2, 2)));
        let downloader = downloader(&session);
        let to_ftp = options().with_request_modifier(Arc::new(AnyModifier::new(|request| {
            Some(request.redirected_to(Url::parse("ftp://example.com/a.png").ok()?))
        })));

        let (task, mut rx) = start(&downloader, to_ftp);

        assert!(task.is_none());
        assert!(matches!(
            next(&mut rx).await.unwrap_err(),
            HalcyonError::Request(RequestError::InvalidUrl { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_invalid_status_reaches_delegate() {
        let session = Arc::new(ScriptedSession::responding(
            404,
            vec![Bytes::from_static(b"not found")],
        ));
        let mut delegate = MockImageDownloaderDelegate::new();
        delegate.expect_will_download().times(1).return_const(());
        delegate
            .expect_is_valid_status_code()
            .returning(|code| (200..400).contains(&code));
        delegate
            .expect_did_finish_downloading()
            .withf(|_, response, error| {
                response.is_none()
                    && error.is_some_and(|e| e.is_invalid_response_status_code_of(404))
            })
            .times(1)
            .return_const(());
        let downloader = downloader(&session).with_delegate(Arc::new(delegate));

        let (_task, mut rx) = start(&downloader, options());

        assert!(
            next(&mut rx)
                .await
                .unwrap_err()
                .is_invalid_response_status_code_of(404)
        );
    }

    struct RejectingDelegate;

    impl ImageDownloaderDelegate for RejectingDelegate {
        fn did_download_data(&self, _data: Bytes, _url: &Url) -> Option<Bytes> {
            None
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_data_rejected_by_delegate() {
        let session = Arc::new(ScriptedSession::ok(fixtures::png(2, 2)));
        let downloader = downloader(&session).with_delegate(Arc::new(RejectingDelegate));

        let (_task, mut rx) = start(&downloader, options());

        assert!(matches!(
            next(&mut rx).await.unwrap_err(),
            HalcyonError::Response(ResponseError::DataModifyingFailed { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_image_modifier_is_per_waiter() {
        let session = Arc::new(ScriptedSession::ok(fixtures::png(2, 2)).gated());
        let downloader = downloader(&session);
        let enlarge = Arc::new(AnyImageModifier::new(|_| {
            Some(ImageArtifact::new(image::DynamicImage::new_rgb8(8, 8)))
        }));

        let (_plain, mut plain_rx) = start(&downloader, options());
        let (_modified, mut modified_rx) =
            start(&downloader, options().with_image_modifier(enlarge));
        session.release();

        assert_eq!(next(&mut plain_rx).await.unwrap().image.width(), 2);
        assert_eq!(next(&mut modified_rx).await.unwrap().image.width(), 8);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_last_waiter_decides_redirect() {
        let target = Url::parse("https://cdn.example.com/avatar.png").unwrap();
        let session = Arc::new(
            ScriptedSession::ok(fixtures::png(2, 2))
                .redirecting_to(target)
                .gated(),
        );
        let downloader = downloader(&session);
        let follow = Arc::new(AnyRedirectHandler::new(|_, request| Some(request)));
        let stop = Arc::new(AnyRedirectHandler::new(|_, _| None));

        let (_a, mut a_rx) = start(&downloader, options().with_redirect_handler(follow));
        let (_b, mut b_rx) = start(&downloader, options().with_redirect_handler(stop));
        session.release();

        // Stopping at the 302 leaves an empty body for every waiter.
        for rx in [&mut a_rx, &mut b_rx] {
            assert!(matches!(
                next(rx).await.unwrap_err(),
                HalcyonError::Process(_)
            ));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_progress_reports_chunks() {
        let png = fixtures::png(3, 3);
        let (head, tail) = (png.slice(..10), png.slice(10..));
        let session = Arc::new(ScriptedSession::responding(200, vec![head, tail]));
        let downloader = downloader(&session);
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        let tracked = options().with_progress(move |progress| {
            recorder
                .lock()
                .push((progress.chunk.len(), progress.received_size, progress.total_size));
        });

        let (_task, mut rx) = start(&downloader, tracked);
        assert!(next(&mut rx).await.is_ok());

        let total = png.len() as u64;
        assert_eq!(
            *seen.lock(),
            vec![
                (10, 10, Some(total)),
                (png.len() - 10, total, Some(total)),
            ]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_retrieve_image() {
        let session = Arc::new(ScriptedSession::ok(fixtures::png(5, 1)));
        let downloader = downloader(&session);

        let result = downloader
            .retrieve_image(url(), DownloadOptions::default())
            .await
            .unwrap();

        assert_eq!(result.image.width(), 5);
        assert_eq!(downloader.in_flight_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancel_all_cancels_every_waiter() {
        let session = Arc::new(ScriptedSession::ok(fixtures::png(2, 2)).gated());
        let downloader = downloader(&session);

        let (_a, mut a_rx) = start(&downloader, options());
        let (_b, mut b_rx) = start(&downloader, options());
        downloader.cancel_all();

        assert!(next(&mut a_rx).await.unwrap_err().is_task_cancelled());
        assert!(next(&mut b_rx).await.unwrap_err().is_task_cancelled());
        assert_eq!(downloader.in_flight_count(), 0);
    }

    #[derive(Default)]
    struct CountingDelegate {
        finished: AtomicUsize,
    }

    impl ImageDownloaderDelegate for CountingDelegate {
        fn did_finish_downloading(
            &self,
            _url: &Url,
            _response: Option<&ResponseMeta>,
            _error: Option<&HalcyonError>,
        ) {
            self.finished.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_set_delegate_keeps_transfers_in_flight() {
        let session = Arc::new(ScriptedSession::ok(fixtures::png(2, 2)).gated());
        let downloader = downloader(&session);
        let before = Arc::new(CountingDelegate::default());
        let after = Arc::new(CountingDelegate::default());
        downloader.set_delegate(before.clone());

        let (_task, mut rx) = start(&downloader, options());
        downloader.set_delegate(after.clone());

        assert_eq!(downloader.in_flight_count(), 1);
        downloader.cancel_all();
        assert!(next(&mut rx).await.unwrap_err().is_task_cancelled());
        assert_eq!(downloader.in_flight_count(), 0);
        assert_eq!(before.finished.load(Ordering::SeqCst), 0);
        assert_eq!(after.finished.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_name_rejected() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let contexts = DispatchContexts::new(runtime.handle().clone()).unwrap();
        let session: Arc<dyn NetworkSession> =
            Arc::new(ScriptedSession::ok(Bytes::from_static(b"x")));

        let result =
            ImageDownloader::with_session("", DownloaderConfig::default(), &contexts, session);

        assert!(matches!(
            result,
            Err(HalcyonError::Request(RequestError::EmptyDownloaderName))
        ));
    }
}
