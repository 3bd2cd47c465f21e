//! # evms-cli: command-line front end for the evidence ledger
//!
//! ## Subcommands
//!
//! - `evms state`: Highest assigned evidence index and the table handle.
//! - `evms list`: Every visible record, flat or grouped by case.
//! - `evms upload`: Pin a file to IPFS and print its content hash.
//! - `evms submit`: Validate and append one evidence record.
//!
//! Configuration comes from the environment (`EVMS_*`, `WALRUS_*`,
//! `PINATA_*`); see [`evms_client::EvidenceConfig::from_env`].
//!
//! ```bash
//! evms list --grouped
//! evms submit --case-no 12 --fir-no 7 --file scene.jpg --content "note" \
//!     --head 0xabc --latitude 1.0 --longitude 2.0 --sender 0x…
//! ```

pub mod list;
pub mod render;
pub mod signer;
pub mod state;
pub mod submit;
pub mod upload;

use anyhow::{Context, Result};
use evms_client::{EvidenceClient, EvidenceConfig};

/// Build a client from environment configuration.
pub fn client_from_env() -> Result<EvidenceClient> {
    let config = EvidenceConfig::from_env().context("invalid configuration")?;
    tracing::debug!(rpc_url = %config.store.rpc_url, "loaded configuration");
    EvidenceClient::new(config).context("failed to initialize client")
}
