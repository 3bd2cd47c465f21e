//! # Upload Subcommand
//!
//! Pins a local file to IPFS through the primary provider, falling back to
//! the secondary when it is configured, and prints the content hash.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use evms_client::{ContentUploader, PinnedContent, UploadFile};

/// Arguments for the `evms upload` subcommand.
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// File to pin.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Execute the upload subcommand.
pub async fn run_upload(args: &UploadArgs, uploader: &ContentUploader) -> Result<u8> {
    let pinned = pin_file(uploader, &args.file).await?;
    println!("{}", pinned.hash);
    Ok(0)
}

/// Read and pin one file.
pub async fn pin_file(uploader: &ContentUploader, path: &Path) -> Result<PinnedContent> {
    if !path.is_file() {
        bail!("file not found: {}", path.display());
    }
    let file = UploadFile::from_path(path)
        .await
        .with_context(|| format!("failed to read file: {}", path.display()))?;

    let pinned = uploader.upload(&file).await?;
    tracing::info!(provider = %pinned.provider, hash = %pinned.hash, "file pinned");
    Ok(pinned)
}
