//! # State Subcommand
//!
//! Prints the store's root descriptor: the highest assigned evidence index
//! and the handle of the evidence table.

use anyhow::Result;
use clap::Args;

use evms_client::EvidenceClient;

/// Arguments for the `evms state` subcommand.
#[derive(Args, Debug)]
pub struct StateArgs {
    /// Print as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute the state subcommand.
pub async fn run_state(args: &StateArgs, client: &EvidenceClient) -> Result<u8> {
    let state = client.aggregator().system_state().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(0);
    }

    match state.max_index {
        Some(max) => println!("Max evidence index: {max}"),
        None => println!("Max evidence index: none (store is empty)"),
    }
    println!("Evidence table: {}", state.table);
    Ok(0)
}
