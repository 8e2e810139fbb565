pub use upkeep_cli::cli;
pub use upkeep_cli::commands;
pub use upkeep_cli::config;
pub use upkeep_cli::{init_tracing, AppConfig};

pub use upkeep_core as core;
pub use upkeep_core::capture;
pub use upkeep_core::model;
pub use upkeep_core::services::TasksService;

pub use upkeep_mcp as mcp;
