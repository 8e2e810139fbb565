use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};
use once_cell::sync::Lazy;

static DEFAULT_DB_NAME: &str = "upkeep.sqlite3";
static ENV_DATA_DIR: &str = "UPKEEP_DATA_DIR";
static ENV_STORAGE: &str = "UPKEEP_STORAGE";
pub static ENV_LOG_LEVEL: &str = "UPKEEP_LOG_LEVEL";

static PROJECT_DIRS: Lazy<Option<ProjectDirs>> =
    Lazy::new(|| ProjectDirs::from("dev", "upkeep", "upkeep"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    data_dir: PathBuf,
    db_path: PathBuf,
    storage: StorageMode,
}

impl AppConfig {
    /// Construct [`AppConfig`] by resolving the data directory using the provided override,
    /// environment variables, and platform defaults.
    pub fn discover(data_dir_override: Option<PathBuf>) -> Result<Self> {
        let data_dir = resolve_data_dir(data_dir_override)?;
        if !data_dir.exists() {
            fs::create_dir_all(&data_dir).with_context(|| {
                format!("Failed to create data directory at {}", data_dir.display())
            })?;
        }
        let mut config = Self::from_data_dir(data_dir)?;
        if storage_from_env() == Some(StorageMode::Memory) {
            config.storage = StorageMode::Memory;
        }
        Ok(config)
    }

    /// Construct [`AppConfig`] directly from a resolved data directory.
    pub fn from_data_dir(data_dir: PathBuf) -> Result<Self> {
        let db_path = data_dir.join(DEFAULT_DB_NAME);
        Ok(Self {
            data_dir,
            db_path,
            storage: StorageMode::Sqlite,
        })
    }

    pub fn with_storage(mut self, storage: StorageMode) -> Self {
        self.storage = storage;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn storage(&self) -> StorageMode {
        self.storage
    }
}

/// Default tracing directive, from `UPKEEP_LOG_LEVEL` when set.
pub fn default_log_filter(fallback: &str) -> String {
    env::var(ENV_LOG_LEVEL)
        .ok()
        .map(|value| value.trim().to_ascii_lowercase())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

fn storage_from_env() -> Option<StorageMode> {
    match env::var(ENV_STORAGE).ok()?.trim().to_ascii_lowercase().as_str() {
        "memory" | "mem" => Some(StorageMode::Memory),
        "sqlite" | "file" => Some(StorageMode::Sqlite),
        _ => None,
    }
}

fn resolve_data_dir(data_dir_override: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = data_dir_override {
        return Ok(dir);
    }

    if let Ok(env_dir) = env::var(ENV_DATA_DIR) {
        return Ok(PathBuf::from(env_dir));
    }

    if cfg!(debug_assertions) {
        let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let dev_dir = manifest_dir.join("..").join("tmp").join("dev-upkeep");
        return Ok(dev_dir);
    }

    if let Some(project) = &*PROJECT_DIRS {
        return Ok(project.data_dir().to_path_buf());
    }

    if let Some(base) = BaseDirs::new() {
        return Ok(base.home_dir().join(".upkeep"));
    }

    Ok(env::current_dir()?.join(".upkeep"))
}
