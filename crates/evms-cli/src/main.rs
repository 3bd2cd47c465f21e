//! # evms CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use evms_cli::list::{run_list, ListArgs};
use evms_cli::state::{run_state, StateArgs};
use evms_cli::submit::{run_submit, SubmitArgs};
use evms_cli::upload::{run_upload, UploadArgs};

/// Evidence ledger CLI.
///
/// Reads evidence records from the on-chain store, pins evidence files to
/// IPFS, and submits new records signed by the local Sui key tool.
#[derive(Parser, Debug)]
#[command(name = "evms", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the highest evidence index and the evidence table handle.
    State(StateArgs),

    /// List all visible evidence, flat or grouped by case.
    List(ListArgs),

    /// Pin a file to IPFS and print its content hash.
    Upload(UploadArgs),

    /// Validate and submit one evidence record.
    Submit(SubmitArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli.command).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(command: Commands) -> anyhow::Result<u8> {
    let client = evms_cli::client_from_env()?;
    match command {
        Commands::State(args) => run_state(&args, &client).await,
        Commands::List(args) => run_list(&args, &client).await,
        Commands::Upload(args) => run_upload(&args, client.uploader()).await,
        Commands::Submit(args) => run_submit(&args, &client).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn cli_parse_list_defaults() {
        let cli = Cli::try_parse_from(["evms", "list"]).unwrap();
        if let Commands::List(args) = cli.command {
            assert!(!args.grouped);
            assert!(!args.json);
            assert!(args.page().is_none());
        } else {
            panic!("expected list");
        }
    }

    #[test]
    fn cli_parse_list_grouped_page() {
        let cli =
            Cli::try_parse_from(["evms", "list", "--grouped", "--start", "10", "--limit", "5"])
                .unwrap();
        if let Commands::List(args) = cli.command {
            assert!(args.grouped);
            assert_eq!(args.start, Some(10));
            assert_eq!(args.limit, Some(5));
        } else {
            panic!("expected list");
        }
    }

    #[test]
    fn cli_parse_verbosity_is_global() {
        let cli = Cli::try_parse_from(["evms", "state", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn cli_parse_upload_file() {
        let cli = Cli::try_parse_from(["evms", "upload", "scene.jpg"]).unwrap();
        if let Commands::Upload(args) = cli.command {
            assert_eq!(args.file, PathBuf::from("scene.jpg"));
        } else {
            panic!("expected upload");
        }
    }

    fn submit_argv<'a>(extra: &[&'a str]) -> Vec<&'a str> {
        let mut argv = vec![
            "evms",
            "submit",
            "--case-no",
            "12",
            "--fir-no",
            "7",
            "--content",
            "note",
            "--head",
            "0xabc",
            "--latitude",
            "-33.9",
            "--longitude",
            "18.4",
            "--sender",
            "0xabc",
        ];
        argv.extend_from_slice(extra);
        argv
    }

    #[test]
    fn cli_parse_submit_with_hash() {
        let cli = Cli::try_parse_from(submit_argv(&["--ipfs-hash", "QmX", "--restricted"])).unwrap();
        if let Commands::Submit(args) = cli.command {
            assert_eq!(args.ipfs_hash.as_deref(), Some("QmX"));
            assert_eq!(args.latitude, "-33.9");
            assert!(args.restricted);
            assert_eq!(args.keytool, "sui");
        } else {
            panic!("expected submit");
        }
    }

    #[test]
    fn cli_parse_submit_requires_exactly_one_hash_source() {
        assert!(Cli::try_parse_from(submit_argv(&[])).is_err());
        assert!(Cli::try_parse_from(submit_argv(&[
            "--ipfs-hash",
            "QmX",
            "--file",
            "scene.jpg"
        ]))
        .is_err());
        assert!(Cli::try_parse_from(submit_argv(&["--file", "scene.jpg"])).is_ok());
    }
}
