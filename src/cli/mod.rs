//! Command-line interface for `issue_tracker`.
//!
//! This module provides the CLI parsing and command routing using clap.

pub mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{Backend, ConfigLayer};

/// `issue-tracker` - per-project issue tracking over HTTP.
#[derive(Parser, Debug)]
#[command(name = "issue-tracker")]
#[command(
    author,
    version,
    about = "Per-project issue tracker with a JSON HTTP API",
    long_about = None
)]
pub struct Cli {
    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (defaults to ./issue-tracker.yaml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Storage backend
    #[arg(long, global = true, value_enum)]
    pub backend: Option<Backend>,

    /// Data file for the jsonl and sqlite backends
    #[arg(long, global = true, value_name = "PATH")]
    pub data: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP service
    Serve(ServeArgs),

    /// Print a project's issues as JSON
    List(ListArgs),
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Listen address, e.g. 127.0.0.1:3000
    #[arg(long)]
    pub bind: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Project name
    pub project: String,

    /// Filter as field=value (repeatable)
    #[arg(short, long = "filter", value_name = "FIELD=VALUE")]
    pub filters: Vec<String>,
}

impl Cli {
    /// Configuration layer carrying the values set on the command line.
    #[must_use]
    pub fn overrides(&self) -> ConfigLayer {
        let bind = match &self.command {
            Commands::Serve(args) => args.bind.clone(),
            Commands::List(_) => None,
        };
        ConfigLayer {
            bind,
            backend: self.backend,
            data: self.data.clone(),
            log_json: self.log_json.then_some(true),
        }
    }
}

impl Commands {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Serve(_) => "serve",
            Self::List(_) => "list",
        }
    }
}
