//! azbatch CLI — build, inspect and submit Azure blob batches.
//!
//! # Commands
//! ```text
//! azbatch encode   --container <c> --blob <b>... [--tier <tier>]
//! azbatch decode   --file <body> --content-type <ct>
//! azbatch delete   --url <container-url-with-sas> --container <c> --blob <b>...
//! azbatch set-tier --url <container-url-with-sas> --container <c> --tier <tier> --blob <b>...
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use azbatch_core::blob::{AccessTier, DeleteSnapshots};

mod cmd_decode;
mod cmd_encode;
mod cmd_submit;
mod logging;

#[derive(Parser)]
#[command(
    name = "azbatch",
    about = "Encode, decode and submit Azure Storage blob batches",
    long_about = "
azbatch bundles up to 256 Delete Blob / Set Blob Tier calls into one
multipart/mixed batch request and reports the outcome of each.

ENVIRONMENT VARIABLES:
  RUST_LOG   tracing filter, overrides --log-level
",
    version
)]
struct Cli {
    /// Default log level when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the multipart request body for a delete or set-tier batch
    Encode {
        /// Container holding the blobs
        #[arg(long)]
        container: String,
        /// Blob names, in Content-ID order
        #[arg(long = "blob", required = true, num_args = 1..)]
        blobs: Vec<String>,
        /// Encode Set Blob Tier instead of Delete Blob
        #[arg(long)]
        tier: Option<AccessTier>,
        /// Snapshot handling for deletes
        #[arg(long, value_enum)]
        snapshots: Option<SnapshotsArg>,
    },

    /// Decode a captured batch response body
    Decode {
        /// File holding the raw response body
        #[arg(long)]
        file: String,
        /// The response's Content-Type header (carries the boundary)
        #[arg(long)]
        content_type: String,
    },

    /// Delete blobs in one batch
    Delete {
        /// Container (or account) URL, including a SAS token
        #[arg(long)]
        url: String,
        #[arg(long)]
        container: String,
        #[arg(long = "blob", required = true, num_args = 1..)]
        blobs: Vec<String>,
        #[arg(long, value_enum)]
        snapshots: Option<SnapshotsArg>,
        /// JSON transport configuration file
        #[arg(long)]
        config: Option<String>,
    },

    /// Change the access tier of blobs in one batch
    #[command(name = "set-tier")]
    SetTier {
        /// Container (or account) URL, including a SAS token
        #[arg(long)]
        url: String,
        #[arg(long)]
        container: String,
        #[arg(long)]
        tier: AccessTier,
        #[arg(long = "blob", required = true, num_args = 1..)]
        blobs: Vec<String>,
        /// JSON transport configuration file
        #[arg(long)]
        config: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SnapshotsArg {
    Include,
    Only,
}

impl From<SnapshotsArg> for DeleteSnapshots {
    fn from(arg: SnapshotsArg) -> Self {
        match arg {
            SnapshotsArg::Include => DeleteSnapshots::Include,
            SnapshotsArg::Only => DeleteSnapshots::Only,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_tracing(&logging::LogConfig {
        level: cli.log_level.clone(),
        json: cli.log_json,
    });

    match cli.command {
        Commands::Encode { container, blobs, tier, snapshots } => {
            cmd_encode::run(&container, &blobs, tier, snapshots.map(Into::into))
        }

        Commands::Decode { file, content_type } => cmd_decode::run(&file, &content_type),

        Commands::Delete { url, container, blobs, snapshots, config } => {
            let op = cmd_submit::Operation::Delete(snapshots.map(Into::into));
            cmd_submit::run(&url, &container, &blobs, op, config.as_deref()).await
        }

        Commands::SetTier { url, container, tier, blobs, config } => {
            let op = cmd_submit::Operation::SetTier(tier);
            cmd_submit::run(&url, &container, &blobs, op, config.as_deref()).await
        }
    }
}
