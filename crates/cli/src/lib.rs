pub mod cli;
pub mod commands;
pub mod config;

pub use upkeep_core as core;
pub use upkeep_core::capture;
pub use upkeep_core::model;
pub use upkeep_core::services::TasksService;

pub use upkeep_core::AppConfig;

use tracing_subscriber::EnvFilter;

/// Route core logging to stderr so command output on stdout stays clean.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter("warn")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
