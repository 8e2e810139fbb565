use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = upkeep::cli::Cli::parse();

    match cli.command.clone() {
        Some(upkeep::cli::CliCommand::Mcp(args)) => {
            let config = upkeep::mcp::ServerConfig {
                data_dir: cli.data_dir.clone(),
                log_filter: args.log_filter.clone(),
                in_memory: cli.in_memory,
            };
            upkeep::mcp::run_server_blocking(config)?;
        }
        command => {
            upkeep::init_tracing();
            let service = upkeep::config::build_service(&cli)?;
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            let command = command.unwrap_or(upkeep::cli::CliCommand::Lists);
            upkeep::commands::execute(&service, command, &mut handle)?;
        }
    }

    Ok(())
}
