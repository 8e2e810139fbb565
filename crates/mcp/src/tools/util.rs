use std::sync::Arc;

use chrono::DateTime;
use pmcp::Result as McpResult;
use upkeep_core::error::{UpkeepError, UpkeepResult};
use upkeep_core::model::Timestamp;
use upkeep_core::services::TasksService;

pub async fn with_service<T, F>(service: Arc<TasksService>, f: F) -> McpResult<T>
where
    T: Send + 'static,
    F: FnOnce(&TasksService) -> UpkeepResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(service.as_ref()))
        .await
        .map_err(|err| pmcp::Error::internal(format!("blocking task failed: {}", err)))?
        .map_err(service_error)
}

/// Rejections go back as validation errors; collaborator failures as internal ones.
pub fn service_error(err: UpkeepError) -> pmcp::Error {
    if err.is_rejection() {
        validation_error(err)
    } else {
        tracing::error!(error = %err, "task service failure");
        internal_error(err)
    }
}

pub fn validation_error(err: impl std::fmt::Display) -> pmcp::Error {
    pmcp::Error::validation(err.to_string())
}

pub fn internal_error(err: impl std::fmt::Display) -> pmcp::Error {
    pmcp::Error::internal(err.to_string())
}

pub fn parse_timestamp(field: &str, raw: Option<&str>) -> McpResult<Option<Timestamp>> {
    raw.map(|value| {
        DateTime::parse_from_rfc3339(value.trim()).map_err(|err| {
            validation_error(format!("{} must be an RFC3339 timestamp: {}", field, err))
        })
    })
    .transpose()
}

#[cfg(test)]
pub(crate) fn test_service() -> (Arc<TasksService>, tempfile::TempDir) {
    use upkeep_core::config::AppConfig;

    let dir = tempfile::TempDir::new().expect("temp dir");
    let config = AppConfig::from_data_dir(dir.path().to_path_buf()).expect("config");
    let service = TasksService::new(config).expect("service");
    (Arc::new(service), dir)
}

#[cfg(test)]
pub(crate) fn test_extra() -> pmcp::RequestHandlerExtra {
    pmcp::RequestHandlerExtra::new(
        "test-request".to_string(),
        tokio_util::sync::CancellationToken::new(),
    )
}

#[cfg(test)]
pub(crate) fn seed_list(service: &TasksService) -> String {
    service.create_list("Household").expect("list").id
}
