//! List command implementation.
//!
//! Reads the configured backend directly and prints the matching issues with
//! the same filter rules as `GET /api/issues/{project}`.

use anyhow::{Context, Result, anyhow};
use issue_lib::{IssueFilter, tracker};

use crate::cli::ListArgs;
use crate::config::{ServiceConfig, open_collection};

/// Execute the list command.
///
/// # Errors
///
/// Returns an error if a filter is malformed, or the backend cannot be
/// opened or read.
pub fn execute(args: &ListArgs, config: &ServiceConfig) -> Result<()> {
    let pairs = parse_filters(&args.filters)?;
    let filter = IssueFilter::from_query(args.project.as_str(), pairs)?;

    let collection = open_collection(config).context("Failed to open issue storage")?;
    let issues = tracker::list_issues(&*collection, &filter)?;

    let json_output = serde_json::to_string_pretty(&issues)?;
    println!("{json_output}");
    Ok(())
}

fn parse_filters(raw: &[String]) -> Result<Vec<(&str, &str)>> {
    raw.iter()
        .map(|item| {
            item.split_once('=')
                .ok_or_else(|| anyhow!("Invalid filter '{item}': expected FIELD=VALUE"))
        })
        .collect()
}
