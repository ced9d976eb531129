//! Top level error type delivered through download results.

use thiserror::Error;

use super::{ProcessError, RequestError, ResponseError, StorageError};

/// Every failure the image pipeline can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum HalcyonError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Response(#[from] ResponseError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Process(#[from] ProcessError),
}

impl HalcyonError {
    /// Returns whether the error reports a cancelled waiter.
    #[must_use]
    pub const fn is_task_cancelled(&self) -> bool {
        matches!(self, Self::Request(RequestError::TaskCancelled { .. }))
    }

    /// Returns whether the error reports a rejected status code.
    #[must_use]
    pub const fn is_invalid_response_status_code(&self) -> bool {
        matches!(
            self,
            Self::Response(ResponseError::InvalidHttpStatusCode { .. })
        )
    }

    /// Returns whether the error reports the given rejected status code.
    #[must_use]
    pub const fn is_invalid_response_status_code_of(&self, code: u16) -> bool {
        matches!(
            self,
            Self::Response(ResponseError::InvalidHttpStatusCode { status, .. }) if *status == code
        )
    }

    /// Returns whether the error comes from the network transfer.
    #[must_use]
    pub const fn is_network_error(&self) -> bool {
        matches!(self, Self::Response(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_is_distinguishable() {
        let cancelled: HalcyonError =
            RequestError::task_cancelled("https://example.com/a.png", 3).into();
        let failed: HalcyonError = ResponseError::session("https://example.com/a.png", "reset").into();

        assert!(cancelled.is_task_cancelled());
        assert!(!failed.is_task_cancelled());
        assert!(failed.is_network_error());
    }

    #[test]
    fn test_status_code_predicates() {
        let error: HalcyonError = ResponseError::invalid_status("https://example.com", 404).into();

        assert!(error.is_invalid_response_status_code());
        assert!(error.is_invalid_response_status_code_of(404));
        assert!(!error.is_invalid_response_status_code_of(500));
    }

    #[test]
    fn test_display_is_transparent() {
        let error: HalcyonError = RequestError::EmptyRequest.into();
        assert_eq!(error.to_string(), "request modifier returned no request");
    }
}
