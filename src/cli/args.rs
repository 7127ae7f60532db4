//! CLI argument definitions using clap
//!
//! Commands:
//! - manual-shelf start [--config <path>] [--in-memory]
//! - manual-shelf check-config [--config <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Manual Shelf - personal product-manual manager backed by Notion
#[derive(Parser, Debug)]
#[command(name = "manual-shelf")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server
    Start {
        /// Path to a JSON configuration file; environment variables
        /// override its fields
        #[arg(long)]
        config: Option<PathBuf>,

        /// Keep manuals in process memory instead of Notion
        #[arg(long)]
        in_memory: bool,
    },

    /// Validate configuration and report which settings are present
    CheckConfig {
        /// Path to a JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
