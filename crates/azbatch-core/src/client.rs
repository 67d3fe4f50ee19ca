//! `BatchClient` — encode, send, decode and correlate in one call.

use std::fmt;
use std::sync::Arc;

use crate::correlate::{BatchResultSet, PartialBatchFailure};
use crate::error::BatchError;
use crate::operation::BatchOperation;
use crate::transport::BatchTransport;

/// Status the service answers a well-formed batch with, whatever the
/// individual outcomes.
pub const BATCH_ACCEPTED: u16 = 202;

/// Error returned by [`BatchClient::submit`].
#[derive(Debug)]
pub enum SubmitError<P, T> {
    /// The batch as a whole failed; no per-operation results exist.
    Batch(BatchError),
    /// The batch was processed but some operations failed.
    Partial(PartialBatchFailure<P, T>),
}

impl<P, T> From<BatchError> for SubmitError<P, T> {
    fn from(e: BatchError) -> Self {
        Self::Batch(e)
    }
}

impl<P, T> fmt::Display for SubmitError<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Batch(e) => write!(f, "{e}"),
            Self::Partial(e) => write!(f, "{e}"),
        }
    }
}

impl<P: fmt::Debug, T: fmt::Debug> std::error::Error for SubmitError<P, T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Batch(e) => Some(e),
            Self::Partial(_) => None,
        }
    }
}

/// Runs batches over a [`BatchTransport`].
///
/// The client performs no retries of its own. Resending a batch is only safe
/// when every sub-operation in it is idempotent, which only the caller knows.
#[derive(Clone)]
pub struct BatchClient {
    transport: Arc<dyn BatchTransport>,
}

impl BatchClient {
    pub fn new(transport: Arc<dyn BatchTransport>) -> Self {
        Self { transport }
    }

    pub fn url(&self) -> &str {
        self.transport.url()
    }

    /// Submit `batch`; any failed operation turns the call into
    /// [`SubmitError::Partial`], which still carries the successes.
    pub async fn submit<P, T>(
        &self,
        batch: BatchOperation<P, T>,
    ) -> Result<BatchResultSet<P, T>, SubmitError<P, T>> {
        let set = self.submit_all(batch).await?;
        set.into_result().map_err(SubmitError::Partial)
    }

    /// Submit `batch` and return every outcome, failed operations included.
    ///
    /// Only batch-wide problems are returned as `Err`.
    pub async fn submit_all<P, T>(
        &self,
        batch: BatchOperation<P, T>,
    ) -> Result<BatchResultSet<P, T>, BatchError> {
        let encoded = batch.encode()?;
        let batch_id = batch.batch_id();

        tracing::info!(
            %batch_id,
            operations = batch.len(),
            bytes = encoded.len(),
            url = %self.transport.url(),
            "sending batch"
        );

        let resp = self.transport.send(encoded).await?;

        if resp.status != BATCH_ACCEPTED {
            let body = String::from_utf8_lossy(&resp.body).into_owned();
            tracing::error!(%batch_id, status = resp.status, "batch not accepted");
            return Err(BatchError::UnexpectedStatus {
                status: resp.status,
                body,
            });
        }

        let content_type = resp
            .header("Content-Type")
            .map(str::to_owned)
            .ok_or_else(|| BatchError::MalformedBody {
                reason: "batch response has no Content-Type".into(),
            })?;

        let set = batch.decode_response(&content_type, resp.body)?;

        tracing::info!(
            %batch_id,
            succeeded = set.successes.len(),
            failed = set.failures.len(),
            "batch complete"
        );
        Ok(set)
    }
}
