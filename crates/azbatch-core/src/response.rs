//! Decoded HTTP sub-response.

use bytes::Bytes;
use indexmap::IndexMap;

use crate::error::BatchError;

/// Header carrying the per-part correlation index.
pub const CONTENT_ID: &str = "Content-ID";

/// Header the storage service uses for machine-readable error codes.
pub const ERROR_CODE: &str = "x-ms-error-code";

/// One HTTP response decoded from a part of a batch response body.
///
/// Headers from the MIME part header block (`Content-Type`, `Content-ID`) and
/// from the HTTP response header block share one map. Values are immutable
/// once the parser hands the response out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSubResponse {
    status_code: Option<u16>,
    status_message: String,
    headers: IndexMap<String, String>,
    body: Option<Bytes>,
}

impl BatchSubResponse {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_status(&mut self, code: u16, message: String) {
        self.status_code = Some(code);
        self.status_message = message;
    }

    pub(crate) fn insert_header(&mut self, name: String, value: String) {
        self.headers.insert(name, value);
    }

    pub(crate) fn set_body(&mut self, body: Bytes) {
        self.body = Some(body);
    }

    /// HTTP status code, `None` when the part contained no status line.
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// Reason phrase from the status line (may be empty).
    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// All headers in the order they appeared.
    pub fn headers(&self) -> &IndexMap<String, String> {
        &self.headers
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Raw body bytes, `None` when nothing followed the header block.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn body_text(&self) -> String {
        self.body
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default()
    }

    /// `true` for any status in `200..=299`.
    pub fn is_success(&self) -> bool {
        matches!(self.status_code, Some(code) if (200..300).contains(&code))
    }

    /// The storage error code (`x-ms-error-code`), if present.
    pub fn error_code(&self) -> Option<&str> {
        self.header(ERROR_CODE)
    }

    /// Parsed `Content-ID`.
    ///
    /// `None` if the header is absent, `Some(Err(_))` if it is not a
    /// non-negative integer.
    pub fn content_id(&self) -> Option<Result<usize, BatchError>> {
        self.header(CONTENT_ID).map(|raw| {
            let digits = raw.trim();
            Some(digits)
                .filter(|d| d.bytes().all(|b| b.is_ascii_digit()))
                .and_then(|d| d.parse::<usize>().ok())
                .ok_or_else(|| BatchError::InvalidContentId {
                    value: raw.to_string(),
                })
        })
    }
}

#[cfg(test)]
pub(crate) fn sample(code: u16, content_id: Option<&str>, body: &[u8]) -> BatchSubResponse {
    let mut resp = BatchSubResponse::new();
    resp.set_status(code, "Status".into());
    if let Some(id) = content_id {
        resp.insert_header(CONTENT_ID.into(), id.into());
    }
    if !body.is_empty() {
        resp.set_body(Bytes::copy_from_slice(body));
    }
    resp
}
