//! Per-request options of the image downloader.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::domain::dispatch::CallbackQueue;
use crate::domain::entities::ImageCreatingOptions;
use crate::domain::ports::{ImageModifier, ImageProcessor, RedirectHandler, RequestModifier};
use crate::domain::services::DefaultImageProcessor;

/// Progress of a transfer, reported once per received chunk.
#[derive(Debug, Clone)]
pub struct DownloadProgress {
    /// The chunk just received.
    pub chunk: Bytes,
    /// Bytes received so far.
    pub received_size: u64,
    /// Declared body length, if the response carried one.
    pub total_size: Option<u64>,
}

/// Receives progress updates of a transfer.
pub type ProgressBlock = Arc<dyn Fn(&DownloadProgress) + Send + Sync>;

/// Options applied to one download request.
///
/// Defaults: the [`DefaultImageProcessor`], no modifiers, completions delivered
/// on the downloader's callback queue and processing on its processing queue.
#[derive(Clone)]
pub struct DownloadOptions {
    /// Turns the downloaded data into an image.
    pub processor: Arc<dyn ImageProcessor>,
    /// Applied to the processed image of this request only.
    pub image_modifier: Option<Arc<dyn ImageModifier>>,
    /// Rewrites or rejects the request before it is sent.
    pub request_modifier: Option<Arc<dyn RequestModifier>>,
    /// Decides redirects if this request is the last to join its transfer.
    pub redirect_handler: Option<Arc<dyn RedirectHandler>>,
    /// Where the completion is delivered. `None` uses the downloader default.
    pub callback_queue: Option<CallbackQueue>,
    /// Where processing runs when this request starts a transfer.
    pub processing_queue: Option<CallbackQueue>,
    /// Options handed to the processor.
    pub creating_options: ImageCreatingOptions,
    /// Called for every received chunk.
    pub on_progress: Option<ProgressBlock>,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            processor: Arc::new(DefaultImageProcessor),
            image_modifier: None,
            request_modifier: None,
            redirect_handler: None,
            callback_queue: None,
            processing_queue: None,
            creating_options: ImageCreatingOptions::default(),
            on_progress: None,
        }
    }
}

impl DownloadOptions {
    /// Sets the processor.
    #[must_use]
    pub fn with_processor(mut self, processor: Arc<dyn ImageProcessor>) -> Self {
        self.processor = processor;
        self
    }

    /// Sets the image modifier.
    #[must_use]
    pub fn with_image_modifier(mut self, modifier: Arc<dyn ImageModifier>) -> Self {
        self.image_modifier = Some(modifier);
        self
    }

    /// Sets the request modifier.
    #[must_use]
    pub fn with_request_modifier(mut self, modifier: Arc<dyn RequestModifier>) -> Self {
        self.request_modifier = Some(modifier);
        self
    }

    /// Sets the redirect handler.
    #[must_use]
    pub fn with_redirect_handler(mut self, handler: Arc<dyn RedirectHandler>) -> Self {
        self.redirect_handler = Some(handler);
        self
    }

    /// Sets where the completion is delivered.
    #[must_use]
    pub fn with_callback_queue(mut self, queue: CallbackQueue) -> Self {
        self.callback_queue = Some(queue);
        self
    }

    /// Sets where processing runs.
    #[must_use]
    pub fn with_processing_queue(mut self, queue: CallbackQueue) -> Self {
        self.processing_queue = Some(queue);
        self
    }

    /// Sets the progress block.
    #[must_use]
    pub fn with_progress<F>(mut self, on_progress: F) -> Self
    where
        F: Fn(&DownloadProgress) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(on_progress));
        self
    }

    /// Sets the scale images are created for.
    #[must_use]
    pub const fn with_scale(mut self, scale: f32) -> Self {
        self.creating_options.scale = scale;
        self
    }
}

impl fmt::Debug for DownloadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadOptions")
            .field("processor", &self.processor.identifier())
            .field("image_modifier", &self.image_modifier.is_some())
            .field("request_modifier", &self.request_modifier.is_some())
            .field("redirect_handler", &self.redirect_handler.is_some())
            .field("callback_queue", &self.callback_queue)
            .field("processing_queue", &self.processing_queue)
            .field("creating_options", &self.creating_options)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}
