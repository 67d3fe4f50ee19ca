//! The `BatchTransport` trait — how an encoded batch reaches the service.

use async_trait::async_trait;
use bytes::Bytes;
use indexmap::IndexMap;

use crate::error::BatchError;
use crate::operation::EncodedBatch;

/// The outer HTTP response of a batch call, fully buffered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: IndexMap<String, String>,
    pub body: Bytes,
}

impl RawResponse {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Sends an encoded batch and returns the raw response.
///
/// Implementations own connection handling, authentication of the outer
/// request, timeouts and any retrying. They know nothing about the multipart
/// payload.
///
/// # Object Safety
/// The trait is object-safe and can be stored as `Arc<dyn BatchTransport>`.
#[async_trait]
pub trait BatchTransport: Send + Sync + 'static {
    /// POST the batch body and return the complete response.
    async fn send(&self, batch: EncodedBatch) -> Result<RawResponse, BatchError>;

    /// The endpoint this transport posts to.
    fn url(&self) -> &str;
}
