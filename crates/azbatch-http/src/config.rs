//! Transport configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::RetryConfig;

/// Storage service version sent as `x-ms-version`.
pub const DEFAULT_API_VERSION: &str = "2020-10-02";

/// Whether the batch endpoint is the account or a single container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchScope {
    /// `POST https://<account>.blob.core.windows.net/?comp=batch`
    #[default]
    Account,
    /// `POST https://<account>.blob.core.windows.net/<container>?restype=container&comp=batch`
    Container,
}

/// Configuration for `HttpBatchTransport`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpClientConfig {
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default)]
    pub scope: BatchScope,
    /// Whole-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_api_version() -> String { DEFAULT_API_VERSION.to_string() }
fn default_request_timeout_ms() -> u64 { 30_000 }

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            scope: BatchScope::default(),
            request_timeout_ms: default_request_timeout_ms(),
            retry: RetryConfig::default(),
        }
    }
}

impl HttpClientConfig {
    /// Config for a container-scoped endpoint.
    pub fn container() -> Self {
        Self {
            scope: BatchScope::Container,
            ..Self::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
