//! Matching decoded sub-responses back to batch operations.

use std::fmt;

use thiserror::Error;

use crate::error::BatchError;
use crate::response::BatchSubResponse;

/// Failure of a single operation inside an otherwise processed batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("operation {content_id} failed with status {status_code} {status_message}: {message}")]
pub struct SubOperationError {
    pub content_id: usize,
    pub status_code: u16,
    pub status_message: String,
    /// `x-ms-error-code`, when the service sent one.
    pub error_code: Option<String>,
    /// Response body text, or the reason phrase when the body was empty.
    pub message: String,
}

/// Outcome of every operation in a batch, in `Content-ID` order.
#[derive(Debug)]
pub struct BatchResultSet<P, T> {
    pub successes: Vec<(P, T)>,
    pub failures: Vec<(P, SubOperationError)>,
}

impl<P, T> BatchResultSet<P, T> {
    fn with_capacity(n: usize) -> Self {
        Self {
            successes: Vec::with_capacity(n),
            failures: Vec::new(),
        }
    }

    /// Total number of operations accounted for.
    pub fn len(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Result for `parent`, if it succeeded.
    pub fn success_for(&self, parent: &P) -> Option<&T>
    where
        P: PartialEq,
    {
        self.successes.iter().find(|(p, _)| p == parent).map(|(_, t)| t)
    }

    /// Error for `parent`, if it failed.
    pub fn failure_for(&self, parent: &P) -> Option<&SubOperationError>
    where
        P: PartialEq,
    {
        self.failures.iter().find(|(p, _)| p == parent).map(|(_, e)| e)
    }

    /// `Ok` when every operation succeeded, otherwise the whole set as a
    /// [`PartialBatchFailure`].
    pub fn into_result(self) -> Result<Self, PartialBatchFailure<P, T>> {
        if self.failures.is_empty() {
            Ok(self)
        } else {
            Err(PartialBatchFailure {
                successes: self.successes,
                failures: self.failures,
            })
        }
    }
}

/// At least one operation failed. Carries what succeeded as well.
#[derive(Debug)]
pub struct PartialBatchFailure<P, T> {
    pub successes: Vec<(P, T)>,
    pub failures: Vec<(P, SubOperationError)>,
}

impl<P, T> fmt::Display for PartialBatchFailure<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} batch operations failed",
            self.failures.len(),
            self.failures.len() + self.successes.len()
        )?;
        if let Some((_, first)) = self.failures.first() {
            write!(f, " (first: {first})")?;
        }
        Ok(())
    }
}

impl<P: fmt::Debug, T: fmt::Debug> std::error::Error for PartialBatchFailure<P, T> {}

/// Reject the batch as a whole when the service answered with a single
/// envelope part.
///
/// One part for a multi-operation batch, or one part without a `Content-ID`,
/// describes the failure of the entire request even though the outer status
/// was 202.
pub fn detect_batch_rejection(
    responses: &[BatchSubResponse],
    operations: usize,
) -> Result<(), BatchError> {
    let [only] = responses else {
        return Ok(());
    };
    if operations == 1 && only.content_id().is_some() {
        return Ok(());
    }

    let status_code = only.status_code().ok_or_else(|| BatchError::MalformedSubResponse {
        reason: "single-part batch response has no status line".into(),
    })?;

    tracing::warn!(
        status = status_code,
        error_code = only.error_code().unwrap_or(""),
        operations,
        "batch rejected by service"
    );

    Err(BatchError::BatchRejected {
        status_code,
        status_message: only.status_message().to_string(),
        error_code: only.error_code().map(str::to_string),
        body: only.body_text(),
    })
}

/// Attribute each sub-response to its parent via `Content-ID` and classify it.
///
/// `parents[i]` is the operation with `Content-ID` `i`. Any response that
/// cannot be attributed, and any operation left without a response, fails the
/// whole call; a partially attributed result is never returned.
pub fn correlate<P, T>(
    responses: Vec<BatchSubResponse>,
    parents: Vec<P>,
    convert: &dyn Fn(&BatchSubResponse) -> Result<T, BatchError>,
) -> Result<BatchResultSet<P, T>, BatchError> {
    let operations = parents.len();
    let mut slots: Vec<Option<BatchSubResponse>> = (0..operations).map(|_| None).collect();

    for (position, resp) in responses.into_iter().enumerate() {
        let content_id = resp
            .content_id()
            .ok_or(BatchError::MissingContentId { position })??;

        if content_id >= operations {
            return Err(BatchError::UnknownContentId {
                content_id,
                operations,
            });
        }
        if resp.status_code().is_none() {
            return Err(BatchError::MalformedSubResponse {
                reason: format!("part with Content-ID {content_id} has no status line"),
            });
        }
        if slots[content_id].is_some() {
            return Err(BatchError::DuplicateContentId { content_id });
        }
        slots[content_id] = Some(resp);
    }

    let mut set = BatchResultSet::with_capacity(operations);
    for (content_id, (parent, slot)) in parents.into_iter().zip(slots).enumerate() {
        let resp = slot.ok_or(BatchError::MissingSubResponse { content_id })?;
        let status_code = resp.status_code().unwrap_or_default();

        if resp.is_success() {
            match convert(&resp) {
                Ok(value) => set.successes.push((parent, value)),
                Err(e) => set.failures.push((
                    parent,
                    SubOperationError {
                        content_id,
                        status_code,
                        status_message: resp.status_message().to_string(),
                        error_code: None,
                        message: e.to_string(),
                    },
                )),
            }
            continue;
        }

        let body = resp.body_text();
        let message = if body.trim().is_empty() {
            resp.status_message().to_string()
        } else {
            body
        };
        tracing::debug!(
            content_id,
            status = status_code,
            error_code = resp.error_code().unwrap_or(""),
            "batch operation failed"
        );
        set.failures.push((
            parent,
            SubOperationError {
                content_id,
                status_code,
                status_message: resp.status_message().to_string(),
                error_code: resp.error_code().map(str::to_string),
                message,
            },
        ));
    }

    Ok(set)
}
