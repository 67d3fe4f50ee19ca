//! Batch protocol error types.

use thiserror::Error;

/// Errors that abort a batch as a whole.
///
/// Per-operation failures are not represented here; they are collected in
/// [`BatchResultSet::failures`](crate::correlate::BatchResultSet) instead.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Adding another operation would exceed the service limit.
    #[error("Batch is full: at most {max} operations are allowed")]
    BatchFull { max: usize },

    /// A batch with no operations cannot be encoded.
    #[error("Batch contains no operations")]
    EmptyBatch,

    /// The multipart envelope could not be interpreted.
    #[error("Malformed multipart body: {reason}")]
    MalformedBody { reason: String },

    /// A single part could not be parsed as an HTTP response.
    #[error("Malformed sub-response: {reason}")]
    MalformedSubResponse { reason: String },

    /// The service rejected the whole batch inside a single-part envelope.
    #[error("Batch rejected with status {status_code} {status_message}: {body}")]
    BatchRejected {
        status_code: u16,
        status_message: String,
        error_code: Option<String>,
        body: String,
    },

    /// The outer batch response did not carry the expected status.
    #[error("Unexpected batch response status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// A sub-response had no `Content-ID` header.
    #[error("Sub-response at position {position} has no Content-ID")]
    MissingContentId { position: usize },

    /// A sub-response's `Content-ID` was not a non-negative integer.
    #[error("Sub-response Content-ID '{value}' is not a valid index")]
    InvalidContentId { value: String },

    /// A `Content-ID` does not match any operation in the batch.
    #[error("Content-ID {content_id} does not match any of the {operations} batch operations")]
    UnknownContentId { content_id: usize, operations: usize },

    /// Two sub-responses claimed the same operation.
    #[error("Content-ID {content_id} appears more than once in the batch response")]
    DuplicateContentId { content_id: usize },

    /// An operation received no sub-response.
    #[error("No sub-response received for Content-ID {content_id}")]
    MissingSubResponse { content_id: usize },

    /// An inner request could not be built.
    #[error("Invalid sub-request: {0}")]
    InvalidRequest(String),

    /// HTTP transport failure (connection refused, reset, etc.).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The transport gave up waiting for the batch response.
    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// The service answered but the response body could not be read in full.
    /// The batch may already have been applied.
    #[error("Failed to read batch response body: {0}")]
    ResponseBody(String),

    /// A successful sub-response could not be converted into a result.
    #[error("Conversion failed: {0}")]
    Conversion(String),
}

impl BatchError {
    /// Returns `true` if the failure happened before the service processed the
    /// batch and resending the same bytes may succeed.
    ///
    /// Whether resending is *safe* depends on the idempotency of every
    /// sub-operation and is the caller's decision.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Timeout { .. })
    }

    /// Returns `true` if the response could not be attributed to the batch's
    /// operations.
    pub fn is_correlation_error(&self) -> bool {
        matches!(
            self,
            Self::MissingContentId { .. }
                | Self::InvalidContentId { .. }
                | Self::UnknownContentId { .. }
                | Self::DuplicateContentId { .. }
                | Self::MissingSubResponse { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(BatchError::Http("reset".into()).is_retryable());
        assert!(BatchError::Timeout { ms: 100 }.is_retryable());
        assert!(!BatchError::EmptyBatch.is_retryable());
        assert!(!BatchError::ResponseBody("connection reset".into()).is_retryable());
        assert!(!BatchError::UnexpectedStatus { status: 400, body: String::new() }.is_retryable());
    }

    #[test]
    fn correlation_classification() {
        assert!(BatchError::UnknownContentId { content_id: 9, operations: 2 }.is_correlation_error());
        assert!(BatchError::MissingSubResponse { content_id: 0 }.is_correlation_error());
        assert!(!BatchError::BatchFull { max: 256 }.is_correlation_error());
    }

    #[test]
    fn rejected_display_carries_status_and_body() {
        let err = BatchError::BatchRejected {
            status_code: 400,
            status_message: "Bad Request".into(),
            error_code: Some("InvalidInput".into()),
            body: "Invalid batch".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("400"));
        assert!(msg.contains("Invalid batch"));
    }
}
