//! Serve command implementation.

use anyhow::{Context, Result};

use crate::config::{ServiceConfig, open_collection};
use crate::server;

/// Execute the serve command.
///
/// Blocks until the service shuts down.
///
/// # Errors
///
/// Returns an error if storage cannot be opened, the runtime cannot be
/// built, or the listen address cannot be bound.
pub fn execute(config: &ServiceConfig) -> Result<()> {
    let collection = open_collection(config).context("Failed to open issue storage")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(server::serve(config.bind, collection))
}
