//! `issue_tracker` - per-project issue tracking service
//!
//! This crate provides the `issue-tracker` binary: an HTTP service (and a
//! small CLI) over the operations in [`issue_lib`].
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`config`] - Layered configuration (defaults, YAML, env, flags)
//! - [`logging`] - tracing subscriber setup
//! - [`storage`] - `SQLite` issue collection
//! - [`api`] - axum router and request/response shaping
//! - [`server`] - Listener bootstrap and graceful shutdown

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod cli;
pub mod config;
pub mod logging;
pub mod server;
pub mod storage;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use cli::{Cli, Commands};

/// Run the CLI application.
///
/// This is the main entry point called from `main()`.
///
/// # Errors
///
/// Returns an error if configuration, logging setup, or the command fails.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load_config(cli.config.as_deref(), &cli.overrides())
        .context("Failed to load configuration")?;
    logging::init_logging(cli.verbose, cli.quiet, config.log_json)?;
    debug!(command = cli.command.name(), ?config, "Starting");

    match &cli.command {
        Commands::Serve(_) => cli::commands::serve::execute(&config),
        Commands::List(args) => cli::commands::list::execute(args, &config),
    }
}
