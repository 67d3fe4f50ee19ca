//! `azbatch decode` — pretty-print the parts of a captured batch response.

use anyhow::{Context, Result};
use bytes::Bytes;
use indexmap::IndexMap;
use serde::Serialize;

use azbatch_core::multipart::decode_parts;
use azbatch_core::BatchSubResponse;

#[derive(Serialize)]
struct SubResponseView<'a> {
    content_id: Option<&'a str>,
    status_code: Option<u16>,
    status_message: &'a str,
    headers: &'a IndexMap<String, String>,
    body: Option<String>,
}

impl<'a> From<&'a BatchSubResponse> for SubResponseView<'a> {
    fn from(resp: &'a BatchSubResponse) -> Self {
        Self {
            content_id: resp.header("Content-ID"),
            status_code: resp.status_code(),
            status_message: resp.status_message(),
            headers: resp.headers(),
            body: resp.body().map(|_| resp.body_text()),
        }
    }
}

pub fn run(file: &str, content_type: &str) -> Result<()> {
    let raw = std::fs::read(file).with_context(|| format!("reading '{file}'"))?;
    let parts = decode_parts(content_type, &Bytes::from(raw))?;

    let views: Vec<SubResponseView<'_>> = parts.iter().map(SubResponseView::from).collect();
    println!("{}", serde_json::to_string_pretty(&views)?);
    eprintln!("{} sub-responses", parts.len());
    Ok(())
}
