//! `azbatch encode` — print a batch request body without sending it.

use std::io::Write;

use anyhow::Result;

use azbatch_core::blob::{AccessTier, DeleteSnapshots};

use crate::cmd_submit::{build_batch, Operation};

pub fn run(
    container: &str,
    blobs: &[String],
    tier: Option<AccessTier>,
    snapshots: Option<DeleteSnapshots>,
) -> Result<()> {
    let op = match tier {
        Some(tier) => Operation::SetTier(tier),
        None => Operation::Delete(snapshots),
    };
    let batch = build_batch(container, blobs, op)?;
    let encoded = batch.encode()?;

    eprintln!("Content-Type: {}", encoded.content_type);
    eprintln!("Content-Length: {}", encoded.len());

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&encoded.body)?;
    stdout.write_all(b"\n")?;
    stdout.flush()?;
    Ok(())
}
