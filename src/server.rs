//! Service bootstrap and graceful shutdown.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use issue_lib::IssueCollection;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::api::{AppState, router};

/// Bind `addr` and serve the API until Ctrl-C.
///
/// Every mutation is persisted before its response, so shutdown flushes nothing.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(addr: SocketAddr, collection: Box<dyn IssueCollection + Send>) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    let local = listener.local_addr().unwrap_or(addr);
    info!(addr = %local, "Listening");

    let app = router(AppState::new(collection));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Cannot listen for Ctrl-C; running until killed");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
