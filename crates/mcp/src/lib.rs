mod events;
mod tools;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use pmcp::types::capabilities::ServerCapabilities;
use pmcp::Server;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;
use upkeep_core::config::{default_log_filter, AppConfig, StorageMode};
use upkeep_core::services::TasksService;

pub use events::BroadcastSink;

/// Runtime configuration for the upkeep MCP server.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    pub data_dir: Option<PathBuf>,
    pub log_filter: Option<String>,
    pub in_memory: bool,
}

/// Launch the MCP server using the provided configuration.
pub async fn run_server(config: ServerConfig) -> Result<()> {
    init_tracing(config.log_filter.clone())?;

    let mut app_config =
        AppConfig::discover(config.data_dir.clone()).context("failed to resolve data directory")?;
    if config.in_memory {
        app_config = app_config.with_storage(StorageMode::Memory);
    }

    let sink = Arc::new(BroadcastSink::new(256));
    events::spawn_change_logger(sink.subscribe());

    let tasks_service = Arc::new(
        TasksService::new(app_config)
            .context("failed to initialize task service")?
            .with_sink(sink),
    );

    let server = build_server(tasks_service.clone()).context("failed to build MCP server")?;

    eprintln!(
        "Starting upkeep-mcp v{} (storage: {}) with tools: {}",
        env!("CARGO_PKG_VERSION"),
        tasks_service.storage_label(),
        tools::TOOL_NAMES.join(", ")
    );

    server
        .run_stdio()
        .await
        .map_err(|err| anyhow::anyhow!("MCP server error: {}", err))
}

/// Run the MCP server by creating an internal Tokio runtime.
pub fn run_server_blocking(config: ServerConfig) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    runtime.block_on(run_server(config))
}

fn init_tracing(filter: Option<String>) -> Result<()> {
    let filter = filter.unwrap_or_else(|| default_log_filter("info"));
    let directive: Directive = filter.parse()?;
    let env_filter = EnvFilter::builder()
        .with_default_directive(directive)
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
    Ok(())
}

fn build_server(service: Arc<TasksService>) -> Result<Server> {
    let builder = Server::builder()
        .name("upkeep-mcp")
        .version(env!("CARGO_PKG_VERSION"))
        .capabilities(ServerCapabilities::tools_only());

    let builder = tools::register(builder, service);
    builder
        .build()
        .map_err(|err| anyhow::anyhow!(err.to_string()))
}
