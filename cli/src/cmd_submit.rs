//! `azbatch delete` / `azbatch set-tier` — submit a batch and report each blob.

use std::sync::Arc;

use anyhow::{bail, Context, Result};

use azbatch_core::blob::{delete_blob, set_blob_tier, unit_result, AccessTier, DeleteSnapshots};
use azbatch_core::{BatchClient, BatchOperation};
use azbatch_http::{HttpBatchTransport, HttpClientConfig};

/// Which sub-request every blob in the batch gets.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    Delete(Option<DeleteSnapshots>),
    SetTier(AccessTier),
}

/// One sub-request per blob, keyed by blob name.
pub fn build_batch(container: &str, blobs: &[String], op: Operation) -> Result<BatchOperation<String, ()>> {
    let mut batch = BatchOperation::new(unit_result);
    for blob in blobs {
        let request = match op {
            Operation::Delete(snapshots) => delete_blob(container, blob, snapshots),
            Operation::SetTier(tier) => set_blob_tier(container, blob, tier),
        }
        .with_context(|| format!("building request for '{blob}'"))?;
        batch.add(request, blob.clone())?;
    }
    Ok(batch)
}

fn load_config(path: Option<&str>) -> Result<HttpClientConfig> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config '{path}'"))?;
            let config: HttpClientConfig = serde_json::from_str(&raw)
                .with_context(|| format!("parsing config '{path}'"))?;
            tracing::debug!(path, scope = ?config.scope, api_version = %config.api_version, "loaded transport config");
            Ok(config)
        }
        None => Ok(HttpClientConfig::container()),
    }
}

pub async fn run(
    url: &str,
    container: &str,
    blobs: &[String],
    op: Operation,
    config: Option<&str>,
) -> Result<()> {
    let config = load_config(config)?;
    let batch = build_batch(container, blobs, op)?;
    let transport = HttpBatchTransport::new(url, config)?;
    tracing::info!(endpoint = %transport.endpoint(), operations = batch.len(), "submitting batch");
    let client = BatchClient::new(Arc::new(transport));

    println!("Submitting {} operations to {}...", batch.len(), container);
    let set = client.submit_all(batch).await?;

    for (blob, ()) in &set.successes {
        println!("  ✓ {blob}");
    }
    for (blob, err) in &set.failures {
        let code = err.error_code.as_deref().unwrap_or("-");
        tracing::warn!(blob = %blob, status = err.status_code, error_code = code, "operation failed");
        println!("  ✗ {blob}  {} {code}  {}", err.status_code, err.status_message);
    }
    println!(
        "\n{} succeeded, {} failed",
        set.successes.len(),
        set.failures.len()
    );

    if set.has_failures() {
        bail!("{} of {} operations failed", set.failures.len(), set.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn builds_one_request_per_blob() {
        let batch = build_batch("photos", &names(&["a", "b", "c"]), Operation::Delete(None)).unwrap();
        assert_eq!(batch.len(), 3);
        let paths: Vec<&str> = batch.requests().map(|r| r.path()).collect();
        assert_eq!(paths, ["/photos/a", "/photos/b", "/photos/c"]);
    }

    #[test]
    fn set_tier_requests() {
        let batch = build_batch("logs", &names(&["x"]), Operation::SetTier(AccessTier::Cool)).unwrap();
        let req = batch.requests().next().unwrap();
        assert_eq!(req.method(), "PUT");
        assert_eq!(req.path(), "/logs/x?comp=tier");
    }

    #[test]
    fn too_many_blobs_is_an_error() {
        let blobs: Vec<String> = (0..=azbatch_core::BATCH_MAX_REQUESTS).map(|i| i.to_string()).collect();
        assert!(build_batch("c", &blobs, Operation::Delete(None)).is_err());
    }

    #[test]
    fn default_config_is_container_scoped() {
        let config = load_config(None).unwrap();
        assert_eq!(config.scope, azbatch_http::BatchScope::Container);
    }

    #[test]
    fn config_file_is_loaded() {
        let path = std::env::temp_dir().join(format!("azbatch-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"scope": "account", "retry": {"max_retries": 0}}"#).unwrap();
        let config = load_config(path.to_str()).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.scope, azbatch_http::BatchScope::Account);
        assert_eq!(config.retry.max_retries, 0);
    }
}
