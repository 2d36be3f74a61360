//! Subcommand implementations.

pub mod config;
pub mod server;

use tracing::warn;

use hostview_core::{TracingConfig, init_tracing};

use crate::cli::{Cli, Command};
use crate::error::ClientResult;

/// Tracing preset for the command line: debug wins, the server logs more
/// than the client.
pub fn tracing_preset(cli: &Cli) -> TracingConfig {
    match (&cli.command, cli.debug) {
        (_, true) => TracingConfig::cli_debug(),
        (Some(Command::Server { .. }), false) => TracingConfig::server(),
        (_, false) => TracingConfig::client(),
    }
}

/// Installs the global subscriber.
pub fn init_logging(config: TracingConfig) -> ClientResult<()> {
    init_tracing(config)?;
    Ok(())
}

/// Completes on Ctrl-C. If the handler cannot be installed it never
/// completes, so the caller keeps running.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
