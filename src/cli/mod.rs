//! CLI module
//!
//! Provides command-line interface for:
//! - start: serve the manuals API
//! - check-config: validate configuration

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check_config, run, run_command, start};
pub use errors::{CliError, CliErrorCode, CliResult};
