//! # List Subcommand
//!
//! Aggregates the store and prints every visible record, either in index
//! order or grouped by case number. Entries that could not be read are
//! reported on a trailing diagnostic line.

use anyhow::Result;
use clap::Args;

use evms_client::{EvidenceClient, PageRequest};

use crate::render::{render_flat, render_grouped, render_skipped};

/// Page size used when only `--start` is given.
pub const DEFAULT_PAGE_LIMIT: u64 = 100;

/// Arguments for the `evms list` subcommand.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Group records by case number.
    #[arg(long)]
    pub grouped: bool,

    /// First index of the page to read.
    #[arg(long, value_name = "INDEX")]
    pub start: Option<u64>,

    /// Maximum number of indices to read.
    #[arg(long, value_name = "N")]
    pub limit: Option<u64>,

    /// Print as JSON.
    #[arg(long)]
    pub json: bool,
}

impl ListArgs {
    /// The requested page, or `None` for the whole store.
    pub fn page(&self) -> Option<PageRequest> {
        match (self.start, self.limit) {
            (None, None) => None,
            (start, limit) => Some(PageRequest {
                start: start.unwrap_or(0),
                limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT),
            }),
        }
    }
}

/// Execute the list subcommand.
pub async fn run_list(args: &ListArgs, client: &EvidenceClient) -> Result<u8> {
    let aggregator = client.aggregator();
    let view = match args.page() {
        Some(page) => aggregator.aggregate_page(page).await?,
        None => aggregator.aggregate().await?,
    };

    if args.json {
        let out = if args.grouped {
            serde_json::to_string_pretty(&view.group_by_case())?
        } else {
            serde_json::to_string_pretty(&view)?
        };
        println!("{out}");
        return Ok(0);
    }

    if args.grouped {
        print!("{}", render_grouped(&view.group_by_case()));
    } else {
        print!("{}", render_flat(&view));
    }
    if let Some(line) = render_skipped(&view.skipped) {
        println!();
        println!("{line}");
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(start: Option<u64>, limit: Option<u64>) -> ListArgs {
        ListArgs {
            grouped: false,
            start,
            limit,
            json: false,
        }
    }

    #[test]
    fn page_is_none_without_window_flags() {
        assert_eq!(args(None, None).page(), None);
    }

    #[test]
    fn page_fills_missing_bounds() {
        assert_eq!(
            args(Some(40), None).page(),
            Some(PageRequest { start: 40, limit: DEFAULT_PAGE_LIMIT })
        );
        assert_eq!(
            args(None, Some(5)).page(),
            Some(PageRequest { start: 0, limit: 5 })
        );
    }
}
