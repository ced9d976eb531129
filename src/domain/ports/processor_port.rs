//! Port definitions for image processors and modifiers.

use std::sync::Arc;

use crate::domain::entities::{ImageArtifact, ImageCreatingOptions, ProcessItem};

/// Turns raw data or an image into a (new) image.
///
/// Two processors are considered equal if their identifiers are equal.
pub trait ImageProcessor: Send + Sync {
    /// Identifies the processor. Results are shared between waiters whose
    /// processors report the same identifier.
    fn identifier(&self) -> &str;

    /// Processes the item, returning `None` on failure.
    fn process(
        &self,
        item: ProcessItem,
        options: &ImageCreatingOptions,
    ) -> Option<Arc<ImageArtifact>>;
}

/// Returns true if both processors have the same identifier.
#[must_use]
pub fn same_processor(left: &dyn ImageProcessor, right: &dyn ImageProcessor) -> bool {
    left.identifier() == right.identifier()
}

type ProcessFn =
    dyn Fn(ProcessItem, &ImageCreatingOptions) -> Option<Arc<ImageArtifact>> + Send + Sync;

/// A processor backed by a closure.
pub struct GeneralProcessor {
    identifier: String,
    process: Box<ProcessFn>,
}

impl GeneralProcessor {
    /// Creates a processor from an identifier and a closure.
    pub fn new<F>(identifier: impl Into<String>, process: F) -> Self
    where
        F: Fn(ProcessItem, &ImageCreatingOptions) -> Option<Arc<ImageArtifact>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            identifier: identifier.into(),
            process: Box::new(process),
        }
    }
}

impl std::fmt::Debug for GeneralProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneralProcessor")
            .field("identifier", &self.identifier)
            .finish_non_exhaustive()
    }
}

impl ImageProcessor for GeneralProcessor {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn process(
        &self,
        item: ProcessItem,
        options: &ImageCreatingOptions,
    ) -> Option<Arc<ImageArtifact>> {
        (self.process)(item, options)
    }
}

/// Composition of shared processors.
pub trait ImageProcessorExt {
    /// Chains `another` after `self`. The result has identifier `"self|>another"`
    /// and fails if either step fails.
    #[must_use]
    fn append(&self, another: Arc<dyn ImageProcessor>) -> Arc<dyn ImageProcessor>;
}

impl ImageProcessorExt for Arc<dyn ImageProcessor> {
    fn append(&self, another: Arc<dyn ImageProcessor>) -> Arc<dyn ImageProcessor> {
        let identifier = format!("{}|>{}", self.identifier(), another.identifier());
        let first = Arc::clone(self);
        Arc::new(GeneralProcessor::new(identifier, move |item, options| {
            let image = first.process(item, options)?;
            another.process(ProcessItem::Image(image), options)
        }))
    }
}

/// Adjusts a processed image before it is handed to a waiter.
pub trait ImageModifier: Send + Sync {
    /// Returns the modified image.
    fn modify(&self, image: Arc<ImageArtifact>) -> Arc<ImageArtifact>;
}

type ModifyFn = dyn Fn(&ImageArtifact) -> Option<ImageArtifact> + Send + Sync;

/// A modifier backed by a closure. A closure returning `None` keeps the input.
pub struct AnyImageModifier {
    modify: Box<ModifyFn>,
}

impl AnyImageModifier {
    /// Creates a modifier from a closure.
    pub fn new<F>(modify: F) -> Self
    where
        F: Fn(&ImageArtifact) -> Option<ImageArtifact> + Send + Sync + 'static,
    {
        Self {
            modify: Box::new(modify),
        }
    }
}

impl ImageModifier for AnyImageModifier {
    fn modify(&self, image: Arc<ImageArtifact>) -> Arc<ImageArtifact> {
        match (self.modify)(&image) {
            Some(modified) => Arc::new(modified),
            None => image,
        }
    }
}
