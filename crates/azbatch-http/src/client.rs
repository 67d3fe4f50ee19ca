//! HTTP batch transport backed by `reqwest`.
//!
//! Features:
//! - Batch endpoint construction (`comp=batch`, optional `restype=container`)
//! - Whole-request timeout
//! - Exponential backoff for batches that never reached the service
//!
//! The outer request is not signed. Pass a URL carrying a SAS token, or put
//! an authenticating proxy in front.

use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;

use azbatch_core::error::BatchError;
use azbatch_core::operation::EncodedBatch;
use azbatch_core::transport::{BatchTransport, RawResponse};

use crate::config::{BatchScope, HttpClientConfig};
use crate::retry::{is_transient_status, RetryPolicy};

/// POSTs encoded batches to a blob service endpoint.
pub struct HttpBatchTransport {
    url: String,
    endpoint: Url,
    http: reqwest::Client,
    api_version: String,
    retry: RetryPolicy,
    request_timeout: Duration,
}

impl HttpBatchTransport {
    /// Create a transport for the account or container `url` (SAS query allowed).
    pub fn new(url: impl Into<String>, config: HttpClientConfig) -> Result<Self, BatchError> {
        let url = url.into();
        let endpoint = batch_endpoint(&url, config.scope)?;
        let request_timeout = config.request_timeout();

        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| BatchError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            url,
            endpoint,
            http,
            api_version: config.api_version,
            retry: RetryPolicy::new(config.retry),
            request_timeout,
        })
    }

    /// Create with default configuration.
    pub fn default_for(url: impl Into<String>) -> Result<Self, BatchError> {
        Self::new(url, HttpClientConfig::default())
    }

    /// The full URL batches are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn send_once(&self, batch: &EncodedBatch) -> Result<RawResponse, BatchError> {
        let resp = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, batch.content_type.as_str())
            .header("x-ms-version", self.api_version.as_str())
            .body(batch.body.clone())
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = resp.status().as_u16();
        let headers: IndexMap<String, String> = resp
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        // The status line has arrived, so the service has the batch. A failed
        // body read must not feed the retry loop.
        let body = resp.bytes().await.map_err(|e| {
            tracing::error!(status, error = %e, url = %self.url, "batch response body truncated");
            BatchError::ResponseBody(e.to_string())
        })?;

        Ok(RawResponse { status, headers, body })
    }

    fn map_error(&self, e: reqwest::Error) -> BatchError {
        if e.is_timeout() {
            BatchError::Timeout {
                ms: self.request_timeout.as_millis() as u64,
            }
        } else {
            BatchError::Http(e.to_string())
        }
    }
}

#[async_trait]
impl BatchTransport for HttpBatchTransport {
    async fn send(&self, batch: EncodedBatch) -> Result<RawResponse, BatchError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let outcome = self.send_once(&batch).await;

            let reason = match &outcome {
                Ok(resp) if is_transient_status(resp.status) => Some(format!("HTTP {}", resp.status)),
                Err(e) if e.is_retryable() => Some(e.to_string()),
                _ => None,
            };
            let Some(reason) = reason else {
                return outcome;
            };

            match self.retry.next_delay(attempt) {
                Some(delay) => {
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        reason = %reason,
                        url = %self.url,
                        "resending batch"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    if attempt > 1 {
                        tracing::error!(attempt, reason = %reason, url = %self.url, "max retries exceeded");
                    }
                    return outcome;
                }
            }
        }
    }

    fn url(&self) -> &str {
        &self.url
    }
}

/// Append the batch query parameters to a service URL, keeping any SAS query.
pub fn batch_endpoint(url: &str, scope: BatchScope) -> Result<Url, BatchError> {
    let mut endpoint = Url::parse(url)
        .map_err(|e| BatchError::InvalidRequest(format!("invalid batch URL '{url}': {e}")))?;

    if !matches!(endpoint.scheme(), "http" | "https") {
        return Err(BatchError::InvalidRequest(format!(
            "batch URL must be http(s), got '{url}'"
        )));
    }

    {
        let mut query = endpoint.query_pairs_mut();
        if scope == BatchScope::Container {
            query.append_pair("restype", "container");
        }
        query.append_pair("comp", "batch");
    }
    Ok(endpoint)
}
