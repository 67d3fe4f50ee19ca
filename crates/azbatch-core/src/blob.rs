//! Sub-requests the blob service accepts inside a batch.
//!
//! The service only allows Delete Blob and Set Blob Tier in a batch, and a
//! single batch should not mix the two.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::BatchError;
use crate::request::SubRequest;
use crate::response::BatchSubResponse;

/// Blob access tier for Set Blob Tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessTier {
    Hot,
    Cool,
    Cold,
    Archive,
}

impl fmt::Display for AccessTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hot => write!(f, "Hot"),
            Self::Cool => write!(f, "Cool"),
            Self::Cold => write!(f, "Cold"),
            Self::Archive => write!(f, "Archive"),
        }
    }
}

impl std::str::FromStr for AccessTier {
    type Err = BatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hot" => Ok(Self::Hot),
            "cool" => Ok(Self::Cool),
            "cold" => Ok(Self::Cold),
            "archive" => Ok(Self::Archive),
            other => Err(BatchError::InvalidRequest(format!("unknown access tier '{other}'"))),
        }
    }
}

/// What to do with a blob's snapshots on delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteSnapshots {
    /// Delete the blob and all of its snapshots.
    Include,
    /// Delete only the snapshots.
    Only,
}

impl DeleteSnapshots {
    fn as_header(self) -> &'static str {
        match self {
            Self::Include => "include",
            Self::Only => "only",
        }
    }
}

/// `DELETE /<container>/<blob>`
pub fn delete_blob(
    container: &str,
    blob: &str,
    snapshots: Option<DeleteSnapshots>,
) -> Result<SubRequest, BatchError> {
    let req = SubRequest::new("DELETE", blob_path(container, blob)?)?;
    match snapshots {
        Some(s) => req.header("x-ms-delete-snapshots", s.as_header()),
        None => Ok(req),
    }
}

/// `PUT /<container>/<blob>?comp=tier`
pub fn set_blob_tier(container: &str, blob: &str, tier: AccessTier) -> Result<SubRequest, BatchError> {
    let path = format!("{}?comp=tier", blob_path(container, blob)?);
    SubRequest::new("PUT", path)?.header("x-ms-access-tier", tier.to_string())
}

/// Conversion strategy for operations whose success carries no payload.
pub fn unit_result(_resp: &BatchSubResponse) -> Result<(), BatchError> {
    Ok(())
}

/// Percent-encoded `/<container>/<blob>`; `/` inside blob names is kept as a
/// virtual directory separator.
pub fn blob_path(container: &str, blob: &str) -> Result<String, BatchError> {
    if container.is_empty() || container.contains('/') {
        return Err(BatchError::InvalidRequest(format!("invalid container name '{container}'")));
    }
    if blob.is_empty() {
        return Err(BatchError::InvalidRequest("blob name must not be empty".into()));
    }

    let mut url = Url::parse("http://localhost/")
        .map_err(|e| BatchError::InvalidRequest(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| BatchError::InvalidRequest("cannot build blob path".into()))?
        .pop_if_empty()
        .push(container)
        .extend(blob.split('/'));

    Ok(url.path().to_string())
}
