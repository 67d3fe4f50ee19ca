//! End-to-end wire tests.
//!
//! A loopback transport parses the encoded request the way the service does
//! (split on the request boundary, read each part's `Content-ID` and request
//! line) and answers with a service-shaped `multipart/mixed` response.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use indexmap::IndexMap;

use azbatch_core::blob::{delete_blob, set_blob_tier, unit_result, AccessTier};
use azbatch_core::multipart::{boundary_from_content_type, split_parts};
use azbatch_core::{
    BatchClient, BatchError, BatchOperation, BatchSubResponse, BatchTransport, EncodedBatch,
    RawResponse, SubmitError,
};

// ─── Helpers ──────────────────────────────────────────────────────────────────

const RESPONSE_BOUNDARY: &str = "batchresponse_66925647-d0cb-4109-b6d3-28efe3e1e5ed";

/// Answers every `DELETE` whose path contains `missing` with 404 and
/// everything else with 202. Parts are emitted in reverse order.
struct LoopbackTransport;

impl LoopbackTransport {
    fn answer(part: &[u8]) -> (usize, Vec<u8>) {
        let text = String::from_utf8_lossy(part);
        let content_id = text
            .lines()
            .find_map(|l| l.strip_prefix("Content-ID: "))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .expect("request part without Content-ID");
        let request_line = text
            .lines()
            .find(|l| l.ends_with("HTTP/1.1"))
            .expect("request part without request line");

        let mut out = format!(
            "Content-Type: application/http\r\nContent-ID: {content_id}\r\n\r\n"
        )
        .into_bytes();
        if request_line.contains("missing") {
            out.extend_from_slice(
                b"HTTP/1.1 404 The specified blob does not exist.\r\n\
                  x-ms-error-code: BlobNotFound\r\n\
                  x-ms-request-id: 778fdc83-801e-0000-62ff-0334671e2852\r\n\
                  x-ms-version: 2020-10-02\r\n\
                  Content-Length: 216\r\n\
                  Content-Type: application/xml\r\n\r\n\
                  <?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
                  <Error><Code>BlobNotFound</Code><Message>The specified blob does not exist.</Message></Error>",
            );
        } else {
            out.extend_from_slice(
                b"HTTP/1.1 202 Accepted\r\n\
                  x-ms-delete-type-permanent: true\r\n\
                  x-ms-request-id: 778fdc83-801e-0000-62ff-0334671e284f\r\n\
                  x-ms-version: 2020-10-02\r\n\r\n",
            );
        }
        (content_id, out)
    }
}

#[async_trait]
impl BatchTransport for LoopbackTransport {
    async fn send(&self, batch: EncodedBatch) -> Result<RawResponse, BatchError> {
        let boundary = boundary_from_content_type(&batch.content_type)?;
        let mut answers: Vec<(usize, Vec<u8>)> = split_parts(&batch.body, &boundary)
            .iter()
            .map(|p| Self::answer(p))
            .collect();
        answers.reverse();

        let mut body = format!("--{RESPONSE_BOUNDARY}\r\n").into_bytes();
        for (i, (_, part)) in answers.iter().enumerate() {
            if i > 0 {
                body.extend_from_slice(format!("\r\n--{RESPONSE_BOUNDARY}\r\n").as_bytes());
            }
            body.extend_from_slice(part);
        }
        body.extend_from_slice(format!("\r\n--{RESPONSE_BOUNDARY}--\r\n").as_bytes());

        let mut headers = IndexMap::new();
        headers.insert(
            "Content-Type".to_string(),
            format!("multipart/mixed; boundary={RESPONSE_BOUNDARY}"),
        );
        headers.insert("x-ms-version".to_string(), "2020-10-02".to_string());
        Ok(RawResponse {
            status: 202,
            headers,
            body: Bytes::from(body),
        })
    }

    fn url(&self) -> &str {
        "loopback"
    }
}

fn delete_batch(names: &[&str]) -> BatchOperation<String, ()> {
    let mut batch = BatchOperation::new(unit_result);
    for name in names {
        batch
            .add(delete_blob("photos", name, None).unwrap(), name.to_string())
            .unwrap();
    }
    batch
}

// ─── Client round trips ───────────────────────────────────────────────────────

#[tokio::test]
async fn all_deletes_succeed() {
    let client = BatchClient::new(Arc::new(LoopbackTransport));
    let set = client
        .submit(delete_batch(&["a.jpg", "b.jpg", "c.jpg"]))
        .await
        .unwrap();
    let names: Vec<&str> = set.successes.iter().map(|(p, _)| p.as_str()).collect();
    assert_eq!(names, ["a.jpg", "b.jpg", "c.jpg"]);
    assert!(set.failures.is_empty());
}

#[tokio::test]
async fn reversed_response_order_is_correlated() {
    let client = BatchClient::new(Arc::new(LoopbackTransport));
    let names = ["a.jpg", "missing-1.jpg", "b.jpg", "missing-2.jpg"];
    let set = client.submit_all(delete_batch(&names)).await.unwrap();

    assert_eq!(set.len(), names.len());
    assert!(set.success_for(&"a.jpg".to_string()).is_some());
    assert!(set.success_for(&"b.jpg".to_string()).is_some());

    let err = set.failure_for(&"missing-1.jpg".to_string()).unwrap();
    assert_eq!(err.content_id, 1);
    assert_eq!(err.status_code, 404);
    assert_eq!(err.status_message, "The specified blob does not exist.");
    assert_eq!(err.error_code.as_deref(), Some("BlobNotFound"));
    assert!(err.message.contains("<Code>BlobNotFound</Code>"));

    assert_eq!(set.failure_for(&"missing-2.jpg".to_string()).unwrap().content_id, 3);
}

#[tokio::test]
async fn partial_failure_keeps_successes() {
    let client = BatchClient::new(Arc::new(LoopbackTransport));
    match client.submit(delete_batch(&["a.jpg", "missing.jpg"])).await {
        Err(SubmitError::Partial(p)) => {
            assert_eq!(p.successes.len(), 1);
            assert_eq!(p.successes[0].0, "a.jpg");
            assert_eq!(p.failures[0].0, "missing.jpg");
        }
        other => panic!("expected partial failure, got {other:?}"),
    }
}

#[tokio::test]
async fn single_operation_batch() {
    let client = BatchClient::new(Arc::new(LoopbackTransport));
    let set = client.submit(delete_batch(&["only.jpg"])).await.unwrap();
    assert_eq!(set.successes.len(), 1);
}

#[tokio::test]
async fn typed_results_from_converter() {
    let mut batch = BatchOperation::new(|resp: &BatchSubResponse| {
        resp.header("x-ms-request-id")
            .map(str::to_string)
            .ok_or_else(|| BatchError::Conversion("no request id".into()))
    });
    for name in ["a", "b"] {
        batch
            .add(set_blob_tier("logs", name, AccessTier::Cool).unwrap(), name)
            .unwrap();
    }

    let client = BatchClient::new(Arc::new(LoopbackTransport));
    let set = client.submit(batch).await.unwrap();
    assert_eq!(
        set.success_for(&"a").map(String::as_str),
        Some("778fdc83-801e-0000-62ff-0334671e284f")
    );
}

// ─── Captured responses ───────────────────────────────────────────────────────

#[test]
fn decode_service_sample_response() {
    let body = Bytes::from_static(
        b"--batchresponse_66925647-d0cb-4109-b6d3-28efe3e1e5ed\r\n\
          Content-Type: application/http\r\n\
          Content-ID: 0\r\n\
          \r\n\
          HTTP/1.1 202 Accepted\r\n\
          x-ms-delete-type-permanent: true\r\n\
          x-ms-request-id: 778fdc83-801e-0000-62ff-0334671e284f\r\n\
          x-ms-version: 2018-11-09\r\n\
          \r\n\
          \r\n--batchresponse_66925647-d0cb-4109-b6d3-28efe3e1e5ed\r\n\
          Content-Type: application/http\r\n\
          Content-ID: 1\r\n\
          \r\n\
          HTTP/1.1 202 Accepted\r\n\
          x-ms-delete-type-permanent: true\r\n\
          x-ms-request-id: 778fdc83-801e-0000-62ff-0334671e2851\r\n\
          x-ms-version: 2018-11-09\r\n\
          \r\n\
          \r\n--batchresponse_66925647-d0cb-4109-b6d3-28efe3e1e5ed\r\n\
          Content-Type: application/http\r\n\
          Content-ID: 2\r\n\
          \r\n\
          HTTP/1.1 404 The specified blob does not exist.\r\n\
          x-ms-error-code: BlobNotFound\r\n\
          x-ms-request-id: 778fdc83-801e-0000-62ff-0334671e2852\r\n\
          x-ms-version: 2018-11-09\r\n\
          Content-Length: 216\r\n\
          Content-Type: application/xml\r\n\
          \r\n\
          <?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
          <Error><Code>BlobNotFound</Code><Message>The specified blob does not exist.\n\
          RequestId:778fdc83-801e-0000-62ff-0334671e2852\n\
          Time:2018-06-14T16:46:54.6040685Z</Message></Error>\r\n\
          --batchresponse_66925647-d0cb-4109-b6d3-28efe3e1e5ed--",
    );

    let batch = delete_batch(&["a", "b", "c"]);
    let set = batch
        .decode_response(
            "multipart/mixed; boundary=batchresponse_66925647-d0cb-4109-b6d3-28efe3e1e5ed",
            body,
        )
        .unwrap();

    assert_eq!(set.successes.len(), 2);
    assert_eq!(set.failures.len(), 1);
    let (parent, err) = &set.failures[0];
    assert_eq!(parent, "c");
    assert_eq!(err.error_code.as_deref(), Some("BlobNotFound"));
    assert!(err.message.ends_with("</Message></Error>"));
}

#[test]
fn envelope_rejection_yields_no_results() {
    let body = Bytes::from_static(
        b"--batchresponse_e4c7e8c3\r\n\
          Content-Type: application/http\r\n\
          \r\n\
          HTTP/1.1 400 One of the request inputs is not valid.\r\n\
          x-ms-error-code: InvalidInput\r\n\
          \r\n\
          Invalid batch\r\n\
          --batchresponse_e4c7e8c3--",
    );
    let batch = delete_batch(&["a", "b"]);
    let err = batch
        .decode_response("multipart/mixed; boundary=batchresponse_e4c7e8c3", body)
        .unwrap_err();
    match err {
        BatchError::BatchRejected {
            status_code,
            status_message,
            body,
            ..
        } => {
            assert_eq!(status_code, 400);
            assert_eq!(status_message, "One of the request inputs is not valid.");
            assert_eq!(body, "Invalid batch");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[test]
fn garbage_body_is_malformed() {
    let batch = delete_batch(&["a", "b"]);
    let err = batch
        .decode_response(
            "multipart/mixed; boundary=batchresponse_x",
            Bytes::from_static(b"<html>gateway timeout</html>"),
        )
        .unwrap_err();
    assert!(matches!(err, BatchError::MalformedSubResponse { .. }));
}
