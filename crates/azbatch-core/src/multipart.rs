//! `multipart/mixed` batch response decoding.
//!
//! Decoding runs in three steps over a fully buffered body:
//!
//! ```text
//! Content-Type ─► boundary
//! body ─► split_parts ─► [segment] ─► parse_sub_response ─► [BatchSubResponse]
//! ```
//!
//! All scanning is done on bytes. Segments and bodies are `Bytes` slices of
//! the original buffer, so bodies containing arbitrary binary data survive
//! untouched and nothing is copied.

use bytes::Bytes;
use memchr::memmem;
use mime::Mime;

use crate::error::BatchError;
use crate::response::BatchSubResponse;

const CRLF: &[u8] = b"\r\n";

/// Extract the `boundary` parameter of a `multipart/*` content type.
pub fn boundary_from_content_type(content_type: &str) -> Result<String, BatchError> {
    let mime: Mime = content_type
        .parse()
        .map_err(|e| BatchError::MalformedBody {
            reason: format!("invalid Content-Type '{content_type}': {e}"),
        })?;

    if mime.type_() != mime::MULTIPART {
        return Err(BatchError::MalformedBody {
            reason: format!("expected a multipart Content-Type, got '{content_type}'"),
        });
    }

    mime.get_param(mime::BOUNDARY)
        .map(|b| b.as_str().trim_matches('"').to_string())
        .filter(|b| !b.is_empty())
        .ok_or_else(|| BatchError::MalformedBody {
            reason: format!("no boundary parameter in '{content_type}'"),
        })
}

/// Split a multipart body into its part segments.
///
/// Interior parts are separated by `\r\n--<boundary>\r\n`. The opening
/// `--<boundary>\r\n` is stripped from the first segment and the closing
/// `\r\n--<boundary>--` (plus any trailing whitespace) from the last one; a
/// single-part body gets both strips. A body without any delimiter comes back
/// as one segment holding the whole body.
pub fn split_parts(body: &Bytes, boundary: &str) -> Vec<Bytes> {
    let separator = format!("\r\n--{boundary}\r\n");
    let opening = format!("--{boundary}\r\n");
    let closing = format!("\r\n--{boundary}--");

    let finder = memmem::Finder::new(separator.as_bytes());
    let mut parts = Vec::new();
    let mut start = 0;
    for pos in finder.find_iter(body) {
        parts.push(body.slice(start..pos));
        start = pos + separator.len();
    }
    parts.push(body.slice(start..));

    if let Some(first) = parts.first_mut() {
        if first.starts_with(opening.as_bytes()) {
            *first = first.slice(opening.len()..);
        }
    }

    if let Some(last) = parts.last_mut() {
        let end = trimmed_len(last);
        if last[..end].ends_with(closing.as_bytes()) {
            *last = last.slice(..end - closing.len());
        }
    }

    parts
}

/// Parse one part segment into a [`BatchSubResponse`].
///
/// Lines before the status line are part headers; blank lines among them are
/// skipped, which tolerates both the part-header terminator and stray empty
/// lines some encoders emit. The first blank line after the status line ends
/// the header section and everything after it is the body.
pub fn parse_sub_response(segment: &Bytes) -> Result<BatchSubResponse, BatchError> {
    let mut resp = BatchSubResponse::new();
    let finder = memmem::Finder::new(CRLF);
    let mut seen_status = false;
    let mut pos = 0;

    while pos < segment.len() {
        let (line_end, next) = match finder.find(&segment[pos..]) {
            Some(i) => (pos + i, pos + i + CRLF.len()),
            None => (segment.len(), segment.len()),
        };
        let line = &segment[pos..line_end];
        pos = next;

        if is_blank(line) {
            if seen_status {
                if pos < segment.len() {
                    resp.set_body(segment.slice(pos..));
                }
                break;
            }
            continue;
        }

        let text = String::from_utf8_lossy(line);
        if !seen_status && line.starts_with(b"HTTP") {
            let (code, message) = parse_status_line(&text)?;
            resp.set_status(code, message);
            seen_status = true;
        } else if let Some((name, value)) = text.split_once(':') {
            resp.insert_header(name.trim().to_string(), value.trim().to_string());
        } else {
            tracing::debug!(line = %text, "ignoring sub-response line without a colon");
        }
    }

    Ok(resp)
}

/// Boundary lookup, split and per-part parse in one call.
pub fn decode_parts(content_type: &str, body: &Bytes) -> Result<Vec<BatchSubResponse>, BatchError> {
    let boundary = boundary_from_content_type(content_type)?;
    let segments = split_parts(body, &boundary);
    tracing::debug!(boundary = %boundary, parts = segments.len(), "split batch response");
    segments.iter().map(parse_sub_response).collect()
}

/// `HTTP/1.1 404 The specified blob does not exist.` → `(404, "The specified blob does not exist.")`
fn parse_status_line(line: &str) -> Result<(u16, String), BatchError> {
    let line = line.trim_end();
    let rest = line
        .split_once(' ')
        .map(|(_, rest)| rest.trim_start())
        .ok_or_else(|| BatchError::MalformedSubResponse {
            reason: format!("status line has no status code: '{line}'"),
        })?;

    let (code, message) = rest.split_once(' ').unwrap_or((rest, ""));
    let code = Some(code)
        .filter(|c| c.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|c| c.parse::<u16>().ok())
        .ok_or_else(|| BatchError::MalformedSubResponse {
            reason: format!("non-numeric status code '{code}' in '{line}'"),
        })?;

    Ok((code, message.trim().to_string()))
}

fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}

fn trimmed_len(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |i| i + 1)
}
