//! Image processing error types.

use thiserror::Error;

/// Processing error variants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum ProcessError {
    #[error("processor `{processor}` failed on {item}")]
    ProcessingFailed { processor: String, item: String },
}

impl ProcessError {
    /// Creates processing failed error.
    #[must_use]
    pub fn processing_failed(processor: impl Into<String>, item: impl ToString) -> Self {
        Self::ProcessingFailed {
            processor: processor.into(),
            item: item.to_string(),
        }
    }
}
