//! azbatch-core — the Azure Storage blob batch protocol.
//!
//! # Overview
//!
//! A blob batch bundles up to [`BATCH_MAX_REQUESTS`] inner HTTP requests into
//! one `multipart/mixed` POST. The service answers `202 Accepted` with a
//! `multipart/mixed` body holding one HTTP response per inner request, each
//! tagged with the `Content-ID` of the part it answers.
//!
//! ```text
//! BatchOperation::add ─► encode ─► [BatchTransport] ─► decode_parts
//!                                                   ─► detect_batch_rejection
//!                                                   ─► correlate ─► BatchResultSet
//! ```
//!
//! The core crate defines:
//!
//! - [`BatchOperation`] — ordered sub-operations, request body encoder
//! - [`multipart`] — binary-safe response splitter and sub-response parser
//! - [`correlate`] — `Content-ID` correlation, success/failure sorting
//! - [`BatchTransport`] — the async trait a transport implements
//! - [`BatchClient`] — runs a batch end to end over a transport
//! - [`blob`] — Delete Blob / Set Blob Tier sub-requests

pub mod blob;
pub mod client;
pub mod correlate;
pub mod error;
pub mod multipart;
pub mod operation;
pub mod request;
pub mod response;
pub mod transport;

pub use client::{BatchClient, SubmitError, BATCH_ACCEPTED};
pub use correlate::{BatchResultSet, PartialBatchFailure, SubOperationError};
pub use error::BatchError;
pub use operation::{BatchOperation, Converter, EncodedBatch, BATCH_MAX_REQUESTS};
pub use request::SubRequest;
pub use response::BatchSubResponse;
pub use transport::{BatchTransport, RawResponse};
