//! azbatch-http — `reqwest` transport for blob batches.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use azbatch_core::blob::{delete_blob, unit_result};
//! use azbatch_core::{BatchClient, BatchOperation};
//! use azbatch_http::{HttpBatchTransport, HttpClientConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpBatchTransport::new(
//!     "https://acct.blob.core.windows.net/photos?sv=...&sig=...",
//!     HttpClientConfig::container(),
//! )?;
//! let client = BatchClient::new(Arc::new(transport));
//!
//! let mut batch = BatchOperation::new(unit_result);
//! batch.add(delete_blob("photos", "a.jpg", None)?, "a.jpg")?;
//! batch.add(delete_blob("photos", "b.jpg", None)?, "b.jpg")?;
//! let results = client.submit(batch).await?;
//! assert_eq!(results.successes.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod retry;

pub use client::{batch_endpoint, HttpBatchTransport};
pub use config::{BatchScope, HttpClientConfig, DEFAULT_API_VERSION};
pub use retry::{RetryConfig, RetryPolicy};
