use std::sync::Arc;

use async_trait::async_trait;
use pmcp::{RequestHandlerExtra, Result as McpResult, ToolHandler};
use serde::Deserialize;
use serde_json::{json, Value};
use upkeep_core::services::TasksService;

use super::util::{validation_error, with_service};

pub struct DeleteTasksTool {
    service: Arc<TasksService>,
}

impl DeleteTasksTool {
    pub fn new(service: Arc<TasksService>) -> Self {
        Self { service }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteTasksArgs {
    ids: Vec<String>,
}

#[async_trait]
impl ToolHandler for DeleteTasksTool {
    async fn handle(&self, args: Value, _extra: RequestHandlerExtra) -> McpResult<Value> {
        let parsed: DeleteTasksArgs = serde_json::from_value(args).map_err(validation_error)?;
        if parsed.ids.is_empty() {
            return Err(validation_error("ids must contain at least one task id"));
        }

        let ids = parsed.ids;
        let results = with_service(self.service.clone(), move |service| {
            service.delete_tasks(&ids)
        })
        .await?;

        Ok(json!({ "results": results }))
    }

    fn metadata(&self) -> Option<pmcp::types::ToolInfo> {
        Some(pmcp::types::ToolInfo {
            name: "delete_tasks".to_string(),
            description: Some("Delete one or more tasks by ULID".to_string()),
            input_schema: json!({
                "type": "object",
                "required": ["ids"],
                "properties": {
                    "ids": {
                        "type": "array",
                        "items": { "type": "string" },
                        "minItems": 1
                    }
                }
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use upkeep_core::capture::TaskInput;

    use crate::tools::util::{seed_list, test_extra, test_service};

    #[tokio::test]
    async fn deletes_and_reports_per_id() {
        let (service, _dir) = test_service();
        let list_id = seed_list(&service);
        let task = service
            .create_task(TaskInput::new(&list_id, "Flush water heater"))
            .expect("create");

        let response = DeleteTasksTool::new(service.clone())
            .handle(json!({ "ids": [task.id, "nope"] }), test_extra())
            .await
            .expect("delete");

        let results = response["results"].as_array().expect("results");
        assert_eq!(results[0]["deleted"], true);
        assert_eq!(results[1]["deleted"], false);
        assert!(service.fetch_task(&task.id).expect("fetch").is_none());
    }

    #[tokio::test]
    async fn empty_ids_are_rejected() {
        let (service, _dir) = test_service();
        let result = DeleteTasksTool::new(service)
            .handle(json!({ "ids": [] }), test_extra())
            .await;
        assert!(result.is_err());
    }
}
