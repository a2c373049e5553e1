use async_trait::async_trait;
use clap::Subcommand;
use graft_core::MethodBody;
use graft_core::listing::parse_listing;
use std::error::Error;
use std::path::Path;

pub mod decode;
pub mod find;
pub mod patch;

use thiserror::Error;

/// Errors raised by the CLI itself, before the libraries get involved.
#[derive(Debug, Error)]
pub enum CliError {
    /// File read/write error.
    #[error("file error on {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// Neither or both of `--preset` and `--config` were given.
    #[error("exactly one of --preset or --config is required")]
    PatchSource,
    /// Listing could not be parsed.
    #[error("listing error: {0}")]
    Listing(#[from] graft_core::result::Error),
    /// Transform setup failed.
    #[error("transform error: {0}")]
    Transform(#[from] graft_transform::Error),
    /// JSON serialization error.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// CLI subcommands for Graft.
#[derive(Subcommand)]
pub enum Cmd {
    /// Parse a listing and print it with positions.
    Decode(decode::DecodeArgs),
    /// Locate a call site in a listing.
    Find(find::FindArgs),
    /// Apply a hook patch to a listing.
    Patch(patch::PatchArgs),
}

/// Trait for executing CLI subcommands.
#[async_trait]
pub trait Command {
    /// Executes the subcommand.
    async fn execute(self) -> Result<(), Box<dyn Error>>;
}

#[async_trait]
impl Command for Cmd {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        match self {
            Cmd::Decode(args) => args.execute().await,
            Cmd::Find(args) => args.execute().await,
            Cmd::Patch(args) => args.execute().await,
        }
    }
}

/// Reads a text file through the runtime.
pub(crate) async fn read_text(path: &Path) -> Result<String, CliError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::File {
            path: path.display().to_string(),
            source,
        })
}

pub(crate) async fn write_text(path: &Path, text: &str) -> Result<(), CliError> {
    tokio::fs::write(path, text)
        .await
        .map_err(|source| CliError::File {
            path: path.display().to_string(),
            source,
        })
}

/// Reads and parses a listing file.
pub(crate) async fn load_listing(path: &Path) -> Result<MethodBody, CliError> {
    let text = read_text(path).await?;
    Ok(parse_listing(&text)?)
}
