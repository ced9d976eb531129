//! Turns the data of a finished transfer into one image per waiter.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, trace};

use super::session_task::TaskCallback;
use crate::domain::dispatch::CallbackQueue;
use crate::domain::entities::{ImageArtifact, ProcessItem};
use crate::domain::errors::{HalcyonError, ProcessError};

/// Processes downloaded data for the waiters of one transfer.
///
/// Waiters whose processors share an identifier share one processing run and
/// receive the same `Arc`. Results are not kept beyond this processor.
pub struct ImageDataProcessor {
    data: Bytes,
    callbacks: Vec<TaskCallback>,
    queue: CallbackQueue,
}

impl ImageDataProcessor {
    /// Creates a processor that will run on `queue`.
    #[must_use]
    pub fn new(data: Bytes, callbacks: Vec<TaskCallback>, queue: CallbackQueue) -> Self {
        Self {
            data,
            callbacks,
            queue,
        }
    }

    /// Processes on the queue, calling `on_processed` once per waiter in waiter order.
    pub fn process<F>(self, on_processed: F)
    where
        F: Fn(Result<Arc<ImageArtifact>, HalcyonError>, TaskCallback) + Send + 'static,
    {
        let queue = self.queue.clone();
        queue.execute(move || self.run(&on_processed));
    }

    fn run<F>(self, on_processed: &F)
    where
        F: Fn(Result<Arc<ImageArtifact>, HalcyonError>, TaskCallback),
    {
        let Self { data, callbacks, .. } = self;
        let mut processed: HashMap<String, Option<Arc<ImageArtifact>>> = HashMap::new();

        for callback in callbacks {
            let processor = Arc::clone(&callback.options.processor);
            let identifier = processor.identifier().to_owned();
            let image = processed
                .entry(identifier.clone())
                .or_insert_with(|| {
                    trace!(processor = %identifier, bytes = data.len(), "Running processor");
                    processor.process(
                        ProcessItem::Data(data.clone()),
                        &callback.options.creating_options,
                    )
                })
                .clone();

            let result = match image {
                Some(image) => Ok(match &callback.options.image_modifier {
                    Some(modifier) => modifier.modify(image),
                    None => image,
                }),
                None => {
                    debug!(processor = %identifier, "Processing failed");
                    Err(ProcessError::processing_failed(
                        identifier,
                        ProcessItem::Data(data.clone()),
                    )
                    .into())
                }
            };
            on_processed(result, callback);
        }
    }
}

impl std::fmt::Debug for ImageDataProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageDataProcessor")
            .field("bytes", &self.data.len())
            .field("callbacks", &self.callbacks.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;

    use crate::application::dto::DownloadOptions;
    use crate::domain::ports::{AnyImageModifier, GeneralProcessor, ImageProcessor};
    use crate::domain::services::fixtures;

    type Results = Arc<Mutex<Vec<Result<Arc<ImageArtifact>, HalcyonError>>>>;

    fn counting(identifier: &str, calls: &Arc<AtomicUsize>) -> Arc<dyn ImageProcessor> {
        let calls = Arc::clone(calls);
        Arc::new(GeneralProcessor::new(identifier, move |item, _| {
            calls.fetch_add(1, Ordering::SeqCst);
            match item {
                ProcessItem::Data(data) => {
                    let image = image::load_from_memory(&data).ok()?;
                    Some(Arc::new(ImageArtifact::new(image)))
                }
                ProcessItem::Image(image) => Some(image),
            }
        }))
    }

    fn waiter(options: DownloadOptions) -> TaskCallback {
        TaskCallback::new(None, options, CallbackQueue::Untouch)
    }

    fn run(data: Bytes, callbacks: Vec<TaskCallback>) -> Results {
        let results = Results::default();
        let sink = Arc::clone(&results);
        ImageDataProcessor::new(data, callbacks, CallbackQueue::Untouch)
            .process(move |result, _| sink.lock().push(result));
        results
    }

    #[test]
    fn test_same_identifier_processed_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let options = DownloadOptions::default().with_processor(counting("count", &calls));

        let results = run(
            fixtures::png(3, 2),
            vec![waiter(options.clone()), waiter(options)],
        );

        let results = results.lock();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let first = results[0].as_ref().unwrap();
        let second = results[1].as_ref().unwrap();
        assert!(Arc::ptr_eq(first, second));
        assert_eq!(first.width(), 3);
    }

    #[test]
    fn test_distinct_identifiers_processed_separately() {
        let calls = Arc::new(AtomicUsize::new(0));
        let results = run(
            fixtures::png(2, 2),
            vec![
                waiter(DownloadOptions::default().with_processor(counting("a", &calls))),
                waiter(DownloadOptions::default().with_processor(counting("b", &calls))),
            ],
        );

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(results.lock().iter().all(Result::is_ok));
    }

    #[test]
    fn test_failure_is_isolated_per_waiter() {
        let failing: Arc<dyn ImageProcessor> =
            Arc::new(GeneralProcessor::new("never", |_, _| None));
        let results = run(
            fixtures::png(2, 2),
            vec![
                waiter(DownloadOptions::default().with_processor(failing)),
                waiter(DownloadOptions::default()),
            ],
        );

        let results = results.lock();
        assert!(matches!(
            &results[0],
            Err(HalcyonError::Process(ProcessError::ProcessingFailed { processor, .. })) if processor == "never"
        ));
        assert!(results[1].is_ok());
    }

    #[test]
    fn test_modifier_applies_to_its_waiter_only() {
        let modifier = Arc::new(AnyImageModifier::new(|_| {
            Some(ImageArtifact::new(image::DynamicImage::new_rgb8(9, 9)))
        }));
        let results = run(
            fixtures::png(4, 4),
            vec![
                waiter(DownloadOptions::default().with_image_modifier(modifier)),
                waiter(DownloadOptions::default()),
            ],
        );

        let results = results.lock();
        assert_eq!(results[0].as_ref().unwrap().width(), 9);
        assert_eq!(results[1].as_ref().unwrap().width(), 4);
    }
}
