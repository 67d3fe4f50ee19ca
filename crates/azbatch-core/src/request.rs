//! Inner HTTP requests carried inside a batch.

use bytes::Bytes;
use indexmap::IndexMap;

use crate::error::BatchError;

/// One fully-built inner request.
///
/// Whatever authentication the service expects (`Authorization`, `x-ms-date`)
/// must already be present in the headers; the batch layer writes the request
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubRequest {
    method: String,
    path: String,
    headers: IndexMap<String, String>,
    body: Bytes,
}

impl SubRequest {
    /// Create a request for `path` (path and query, e.g. `/photos/a.jpg?comp=tier`).
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Result<Self, BatchError> {
        let method = method.into().to_ascii_uppercase();
        let path = path.into();

        if method.is_empty() || !method.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(BatchError::InvalidRequest(format!("invalid method '{method}'")));
        }
        if !path.starts_with('/') || path.bytes().any(|b| b.is_ascii_whitespace()) {
            return Err(BatchError::InvalidRequest(format!(
                "path must be absolute and contain no whitespace: '{path}'"
            )));
        }

        Ok(Self {
            method,
            path,
            headers: IndexMap::new(),
            body: Bytes::new(),
        })
    }

    /// Add or replace a header.
    pub fn header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, BatchError> {
        let name = name.into();
        let value = value.into();

        if name.is_empty() || name.bytes().any(|b| b == b':' || b.is_ascii_whitespace() || b.is_ascii_control()) {
            return Err(BatchError::InvalidRequest(format!("invalid header name '{name}'")));
        }
        if value.bytes().any(|b| b == b'\r' || b == b'\n') {
            return Err(BatchError::InvalidRequest(format!(
                "header '{name}' value contains a line break"
            )));
        }

        self.headers.insert(name, value);
        Ok(self)
    }

    /// Set the request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &IndexMap<String, String> {
        &self.headers
    }

    pub fn payload(&self) -> &Bytes {
        &self.body
    }

    /// Append the HTTP/1.1 wire form of this request to `out`.
    ///
    /// `Content-Length` is added from the body length unless the caller set it.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(format!("{} {} HTTP/1.1\r\n", self.method, self.path).as_bytes());
        for (name, value) in &self.headers {
            out.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
        }
        if !self.headers.keys().any(|k| k.eq_ignore_ascii_case("Content-Length")) {
            out.extend_from_slice(format!("Content-Length: {}\r\n", self.body.len()).as_bytes());
        }
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(&self.body);
    }

    /// The wire form as a standalone buffer.
    pub fn to_bytes(&self) -> Bytes {
        let mut out = Vec::with_capacity(128 + self.body.len());
        self.write_to(&mut out);
        Bytes::from(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_form_adds_content_length() {
        let req = SubRequest::new("delete", "/photos/cat.jpg")
            .unwrap()
            .header("x-ms-date", "Thu, 14 Jun 2018 16:46:54 GMT")
            .unwrap();
        assert_eq!(
            &req.to_bytes()[..],
            b"DELETE /photos/cat.jpg HTTP/1.1\r\n\
              x-ms-date: Thu, 14 Jun 2018 16:46:54 GMT\r\n\
              Content-Length: 0\r\n\r\n"
        );
    }

    #[test]
    fn explicit_content_length_is_kept() {
        let req = SubRequest::new("PUT", "/c/b?comp=tier")
            .unwrap()
            .header("content-length", "0")
            .unwrap();
        let wire = String::from_utf8(req.to_bytes().to_vec()).unwrap();
        assert_eq!(wire.matches("ength: 0").count(), 1);
    }

    #[test]
    fn body_follows_blank_line() {
        let req = SubRequest::new("PUT", "/c/b").unwrap().body(Bytes::from_static(b"\x00\x01"));
        let wire = req.to_bytes();
        assert!(wire.ends_with(b"Content-Length: 2\r\n\r\n\x00\x01"));
    }

    #[test]
    fn rejects_header_injection() {
        let err = SubRequest::new("DELETE", "/c/b")
            .unwrap()
            .header("x-ms-meta", "a\r\nAuthorization: x")
            .unwrap_err();
        assert!(matches!(err, BatchError::InvalidRequest(_)));
        assert!(SubRequest::new("DELETE", "/c/b").unwrap().header("bad name", "v").is_err());
    }

    #[test]
    fn rejects_bad_method_and_path() {
        assert!(SubRequest::new("", "/c/b").is_err());
        assert!(SubRequest::new("DELETE", "c/b").is_err());
        assert!(SubRequest::new("DELETE", "/c/b c").is_err());
    }
}
