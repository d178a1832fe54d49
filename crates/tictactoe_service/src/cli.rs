//! Command-line interface for tictactoe_service.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tic-tac-toe gaming service - sessions, games and live event notifications
#[derive(Parser, Debug)]
#[command(name = "tictactoe_service")]
#[command(about = "Tic-tac-toe gaming session server", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API server
    Serve {
        /// Host to bind to (overrides the config file)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,

        /// Do not forward events to the MQTT broker
        #[arg(long)]
        no_event_plane: bool,
    },

    /// Print the effective configuration as TOML
    PrintConfig,
}
