use std::path::PathBuf;

use clap::Parser;
use upkeep_mcp::{run_server, ServerConfig};

#[derive(Parser, Debug)]
#[command(
    name = "upkeep-mcp",
    version,
    about = "Model Context Protocol server for the upkeep household task tracker"
)]
struct Args {
    /// Override the upkeep data directory (defaults to the same resolution as the CLI)
    #[arg(long = "data-dir", value_name = "PATH")]
    data_dir: Option<PathBuf>,

    /// Override the tracing filter (e.g. "info", "debug", or full directives)
    #[arg(long = "log", value_name = "DIRECTIVE")]
    log_filter: Option<String>,

    /// Keep lists and tasks in memory only
    #[arg(long = "in-memory")]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = ServerConfig {
        data_dir: args.data_dir,
        log_filter: args.log_filter,
        in_memory: args.in_memory,
    };

    run_server(config).await
}
