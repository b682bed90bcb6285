//! Handoff server binary.
//!
//! Reads flags and environment, sets up logging, and serves until ctrl-c.

use clap::Parser;
use handoff::{HandoffError, HandoffServer, ServerConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), HandoffError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::parse();
    tracing::debug!(?config, "configuration loaded");

    let server = HandoffServer::builder().configure(&config).build().await?;
    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
        })
        .await
}
