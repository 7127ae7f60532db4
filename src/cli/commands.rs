//! CLI command implementations
//!
//! - start: load configuration, install logging, serve until shutdown
//! - check-config: validate configuration and report setting presence

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Map, Value};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::http_server::HttpServer;
use crate::notion::{DocumentApi, InMemoryNotion, NotionHttp};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_response};

/// Database id used by `start --in-memory` when none is configured
const LOCAL_DATABASE_ID: &str = "local-manuals";

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Start { config, in_memory } => start(config.as_deref(), in_memory),
        Command::CheckConfig { config } => check_config(config.as_deref()),
    }
}

/// Start the HTTP server
pub fn start(config_path: Option<&Path>, in_memory: bool) -> CliResult<()> {
    init_tracing();

    let mut config = AppConfig::load(config_path)?;
    let api = document_api(&mut config, in_memory)?;
    let server = HttpServer::assemble(&config, api)
        .map_err(|e| CliError::boot_failed(format!("Failed to set up sign-in: {}", e)))?;

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Validate configuration without starting anything
pub fn check_config(config_path: Option<&Path>) -> CliResult<()> {
    let config = AppConfig::load(config_path)?;
    let report = presence_report(&config);

    match config.validate() {
        Ok(()) => write_response(report),
        Err(e) => {
            let err = CliError::from(e);
            write_error(err.code_str(), err.message(), report)?;
            Err(err)
        }
    }
}

/// Setting name to presence; values are never included
fn presence_report(config: &AppConfig) -> Value {
    let settings: Map<String, Value> = config
        .presence()
        .into_iter()
        .map(|(name, present)| (name.to_string(), Value::Bool(present)))
        .collect();

    json!({
        "settings": settings,
        "base_url": config.notion.base_url,
        "listen": config.server.socket_addr(),
    })
}

fn document_api(config: &mut AppConfig, in_memory: bool) -> CliResult<Arc<dyn DocumentApi>> {
    if in_memory {
        config.validate_auth()?;
        if config.notion.database_id.is_empty() {
            config.notion.database_id = LOCAL_DATABASE_ID.to_string();
        }
        warn!("serving from process memory; manuals are lost on exit");
        return Ok(Arc::new(InMemoryNotion::with_database(
            &config.notion.database_id,
        )));
    }

    config.validate()?;
    let http = NotionHttp::new(
        &config.notion.base_url,
        &config.notion.api_key,
        Duration::from_secs(config.notion.timeout_secs),
    )
    .map_err(|e| CliError::boot_failed(format!("Failed to build Notion client: {}", e)))?;

    info!(base_url = %config.notion.base_url, "using Notion API");
    Ok(Arc::new(http))
}

/// `RUST_LOG` filtering, `info` by default
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_err() {
        warn!("tracing subscriber already installed");
    }
}
