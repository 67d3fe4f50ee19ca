//! `BatchOperation` — collects sub-operations and encodes the batch body.
//!
//! # Usage
//! ```rust
//! use azbatch_core::blob::{delete_blob, unit_result};
//! use azbatch_core::BatchOperation;
//!
//! let mut batch = BatchOperation::new(unit_result);
//! batch.add(delete_blob("photos", "a.jpg", None).unwrap(), "a.jpg").unwrap();
//! batch.add(delete_blob("photos", "b.jpg", None).unwrap(), "b.jpg").unwrap();
//! let encoded = batch.encode().unwrap();
//! assert!(encoded.content_type.starts_with("multipart/mixed; boundary=batch_"));
//! ```

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use uuid::Uuid;

use crate::correlate::{self, BatchResultSet};
use crate::error::BatchError;
use crate::multipart;
use crate::request::SubRequest;
use crate::response::BatchSubResponse;

/// Maximum number of sub-operations the service accepts in one batch.
pub const BATCH_MAX_REQUESTS: usize = 256;

/// Turns a successful sub-response into the caller's result type.
pub type Converter<T> = Arc<dyn Fn(&BatchSubResponse) -> Result<T, BatchError> + Send + Sync>;

/// A serialized batch ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBatch {
    /// Value for the outer `Content-Type` header.
    pub content_type: String,
    pub body: Bytes,
}

impl EncodedBatch {
    /// Value for the outer `Content-Length` header.
    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// An ordered set of `(request, parent)` pairs sent as one batch.
///
/// The insertion index of each pair is its `Content-ID`. `P` is whatever the
/// caller wants results keyed by (a blob name, a handle); the batch never
/// inspects it.
///
/// A `BatchOperation` is filled by one owner through `&mut self` and then
/// consumed by [`decode_response`](Self::decode_response); there is no
/// interior mutability.
pub struct BatchOperation<P, T> {
    batch_id: Uuid,
    entries: Vec<(SubRequest, P)>,
    convert: Converter<T>,
}

impl<P, T> BatchOperation<P, T> {
    /// Create an empty batch with a fresh batch id.
    pub fn new<F>(convert: F) -> Self
    where
        F: Fn(&BatchSubResponse) -> Result<T, BatchError> + Send + Sync + 'static,
    {
        Self {
            batch_id: Uuid::new_v4(),
            entries: Vec::new(),
            convert: Arc::new(convert),
        }
    }

    /// Append a sub-operation and return its `Content-ID`.
    ///
    /// Fails without modifying the batch once [`BATCH_MAX_REQUESTS`] is reached.
    pub fn add(&mut self, request: SubRequest, parent: P) -> Result<usize, BatchError> {
        if self.entries.len() >= BATCH_MAX_REQUESTS {
            return Err(BatchError::BatchFull {
                max: BATCH_MAX_REQUESTS,
            });
        }
        self.entries.push((request, parent));
        Ok(self.entries.len() - 1)
    }

    pub fn batch_id(&self) -> Uuid {
        self.batch_id
    }

    /// Multipart boundary of the request body.
    pub fn boundary(&self) -> String {
        format!("batch_{}", self.batch_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parents in `Content-ID` order.
    pub fn parents(&self) -> impl Iterator<Item = &P> {
        self.entries.iter().map(|(_, p)| p)
    }

    /// Sub-requests in `Content-ID` order.
    pub fn requests(&self) -> impl Iterator<Item = &SubRequest> {
        self.entries.iter().map(|(r, _)| r)
    }

    /// Serialize every sub-request into one `multipart/mixed` body.
    pub fn encode(&self) -> Result<EncodedBatch, BatchError> {
        if self.entries.is_empty() {
            return Err(BatchError::EmptyBatch);
        }

        let boundary = self.boundary();
        let mut body = Vec::with_capacity(self.entries.len() * 256);
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());

        for (content_id, (request, _)) in self.entries.iter().enumerate() {
            if content_id > 0 {
                body.extend_from_slice(format!("\r\n--{boundary}\r\n").as_bytes());
            }
            body.extend_from_slice(b"Content-Type: application/http\r\n");
            body.extend_from_slice(b"Content-Transfer-Encoding: binary\r\n");
            body.extend_from_slice(format!("Content-ID: {content_id}\r\n\r\n").as_bytes());
            request.write_to(&mut body);
        }
        body.extend_from_slice(format!("\r\n--{boundary}--").as_bytes());

        tracing::debug!(
            batch_id = %self.batch_id,
            parts = self.entries.len(),
            bytes = body.len(),
            "encoded batch request"
        );

        Ok(EncodedBatch {
            content_type: format!("multipart/mixed; boundary={boundary}"),
            body: Bytes::from(body),
        })
    }

    /// Decode the batch response body and sort every operation into
    /// successes or failures.
    ///
    /// `content_type` is the outer response's `Content-Type`, which carries
    /// the response boundary.
    pub fn decode_response(
        self,
        content_type: &str,
        body: Bytes,
    ) -> Result<BatchResultSet<P, T>, BatchError> {
        let responses = multipart::decode_parts(content_type, &body)?;
        correlate::detect_batch_rejection(&responses, self.entries.len())?;

        let parents = self.entries.into_iter().map(|(_, p)| p).collect();
        correlate::correlate(responses, parents, self.convert.as_ref())
    }
}

impl<P: fmt::Debug, T> fmt::Debug for BatchOperation<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchOperation")
            .field("batch_id", &self.batch_id)
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}
