use std::sync::Arc;

pub use upkeep_core::AppConfig;
pub use upkeep_core::config::*;

use upkeep_core::events::TracingSink;
use upkeep_core::services::TasksService;

use crate::cli::Cli;

pub fn from_cli(cli: &Cli) -> anyhow::Result<AppConfig> {
    let config = AppConfig::discover(cli.data_dir.clone())?;
    if cli.in_memory {
        return Ok(config.with_storage(StorageMode::Memory));
    }
    Ok(config)
}

/// Service for one CLI invocation, logging every change it makes.
pub fn build_service(cli: &Cli) -> anyhow::Result<TasksService> {
    let service = TasksService::new(from_cli(cli)?)?;
    Ok(service.with_sink(Arc::new(TracingSink)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn in_memory_flag_selects_memory_storage() {
        let dir = TempDir::new().expect("temp dir");
        let data_dir = dir.path().to_str().expect("utf8 path");
        let cli = Cli::parse_from(["upkeep", "--in-memory", "--data-dir", data_dir, "lists"]);

        let service = build_service(&cli).expect("service");
        assert_eq!(service.storage_label(), "memory");
        let list = service.create_list("Cellar").expect("list");
        assert_eq!(service.list_lists().expect("lists"), vec![list]);
    }

    #[test]
    fn data_dir_flag_selects_sqlite_file() {
        let dir = TempDir::new().expect("temp dir");
        let data_dir = dir.path().to_str().expect("utf8 path");
        let cli = Cli::parse_from(["upkeep", "--data-dir", data_dir]);

        let service = build_service(&cli).expect("service");
        assert!(service.storage_label().starts_with(data_dir));
        service.create_list("Shed").expect("list");
        assert_eq!(service.list_lists().expect("lists").len(), 1);
    }
}
