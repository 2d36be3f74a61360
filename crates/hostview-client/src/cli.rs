//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use hostview_core::SortKey;
use hostview_server::DEFAULT_BIND_ADDRESS;

use crate::config::RunMode;

/// hostview - live view of a host inventory served over TCP
#[derive(Debug, Parser)]
#[command(name = "hostview")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, env = "HOSTVIEW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    // --- Connection ---
    /// Server host name or address
    #[arg(long, short = 'a', env = "HOSTVIEW_ADDRESS")]
    pub address: Option<String>,

    /// Server port (1-65535)
    #[arg(long, short = 'p', env = "HOSTVIEW_PORT")]
    pub port: Option<u32>,

    // --- Mode ---
    /// Fetch once, print a table and exit
    #[arg(long, short = 'c', conflicts_with = "mode")]
    pub console: bool,

    /// Run mode
    #[arg(long, value_enum)]
    pub mode: Option<RunMode>,

    /// Batch mode deadline in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Interactive mode delay before reconnecting, in milliseconds
    #[arg(long)]
    pub reconnect_delay_ms: Option<u64>,

    // --- Output ---
    /// Print JSON lines instead of a table
    #[arg(long, conflicts_with = "console")]
    pub json: bool,

    /// Sort table rows by this column (none, ip, name, description)
    #[arg(long)]
    pub sort: Option<SortKey>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Serve an inventory to hostview clients
    Server {
        /// Interface address to bind
        #[arg(long, default_value = DEFAULT_BIND_ADDRESS)]
        bind: String,

        /// Port to listen on (defaults to the client's configured port)
        #[arg(long = "listen-port")]
        listen_port: Option<u16>,

        /// JSON file with the records to serve
        #[arg(long)]
        data: Option<PathBuf>,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
