//! # Submit Subcommand
//!
//! Fills an evidence draft from flags, optionally pins a file first to
//! obtain the content hash, and submits the draft as one signed append.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgGroup, Args};

use evms_client::{EvidenceClient, SubmitError};
use evms_core::{DraftField, EvidenceDraft, SuiAddress};

use crate::signer::{CommandSigner, DEFAULT_KEYTOOL};
use crate::upload::pin_file;

/// Arguments for the `evms submit` subcommand.
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("hash_source").required(true).args(["ipfs_hash", "file"])))]
pub struct SubmitArgs {
    /// Case number.
    #[arg(long)]
    pub case_no: String,

    /// FIR number.
    #[arg(long)]
    pub fir_no: String,

    /// Content hash of already pinned evidence.
    #[arg(long)]
    pub ipfs_hash: Option<String>,

    /// File to pin first; its content hash is used.
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Evidence content or description.
    #[arg(long)]
    pub content: String,

    /// Custodian (head) address.
    #[arg(long)]
    pub head: String,

    #[arg(long, allow_hyphen_values = true)]
    pub latitude: String,

    #[arg(long, allow_hyphen_values = true)]
    pub longitude: String,

    /// Mark the evidence as restricted rather than accessible.
    #[arg(long)]
    pub restricted: bool,

    /// Address that signs and pays for the transaction.
    #[arg(long)]
    pub sender: String,

    /// Sui CLI used for signing.
    #[arg(long, default_value = DEFAULT_KEYTOOL, value_name = "PROGRAM")]
    pub keytool: String,
}

impl SubmitArgs {
    /// The draft described by the flags, without a content hash when one
    /// is to be obtained by upload.
    pub fn draft(&self) -> EvidenceDraft {
        let mut draft = EvidenceDraft::new()
            .with(DraftField::CaseNumber, &*self.case_no)
            .with(DraftField::FirNumber, &*self.fir_no)
            .with(DraftField::Content, &*self.content)
            .with(DraftField::Custodian, &*self.head)
            .with(DraftField::Latitude, &*self.latitude)
            .with(DraftField::Longitude, &*self.longitude);
        if let Some(hash) = &self.ipfs_hash {
            draft.set(DraftField::ContentHash, hash.as_str());
        }
        draft.set_access(!self.restricted);
        draft
    }
}

/// Execute the submit subcommand.
pub async fn run_submit(args: &SubmitArgs, client: &EvidenceClient) -> Result<u8> {
    let mut draft = args.draft();

    // Fail on local input before spending an upload.
    if args.file.is_some() {
        let probe = draft.clone().with(DraftField::ContentHash, "pending");
        if let Err(e) = probe.validate() {
            return Err(SubmitError::from(e)).context("validation failed");
        }
    }

    if let Some(path) = &args.file {
        let pinned = pin_file(client.uploader(), path).await?;
        draft.set(DraftField::ContentHash, pinned.hash);
    }

    let sender = SuiAddress::parse(&args.sender)
        .with_context(|| format!("invalid --sender {:?}", args.sender))?;
    let signer = CommandSigner::new(client.store().clone(), sender, args.keytool.clone());

    let receipt = client
        .submitter(Arc::new(signer))
        .submit(&mut draft)
        .await
        .map_err(|e| match e {
            SubmitError::Validation(_) => anyhow::Error::new(e).context("validation failed"),
            SubmitError::Write { .. } => anyhow::Error::new(e).context("submission failed"),
        })?;

    println!(
        "OK: evidence submitted digest={} events={}",
        receipt.digest, receipt.event_count
    );
    Ok(0)
}
