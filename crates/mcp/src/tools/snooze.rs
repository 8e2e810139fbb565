use std::sync::Arc;

use async_trait::async_trait;
use pmcp::{RequestHandlerExtra, Result as McpResult, ToolHandler};
use serde::Deserialize;
use serde_json::{json, Value};
use upkeep_core::model::SnoozeRequest;
use upkeep_core::services::TasksService;

use super::util::{parse_timestamp, validation_error, with_service};

pub struct SnoozeTaskTool {
    service: Arc<TasksService>,
}

impl SnoozeTaskTool {
    pub fn new(service: Arc<TasksService>) -> Self {
        Self { service }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnoozeTaskArgs {
    id: String,
    period: String,
    updated_at: Option<String>,
}

#[async_trait]
impl ToolHandler for SnoozeTaskTool {
    async fn handle(&self, args: Value, _extra: RequestHandlerExtra) -> McpResult<Value> {
        let parsed: SnoozeTaskArgs = serde_json::from_value(args).map_err(validation_error)?;
        let request = SnoozeRequest {
            period: parsed.period,
            updated_at: parse_timestamp("updatedAt", parsed.updated_at.as_deref())?,
        };

        let id = parsed.id;
        let task = with_service(self.service.clone(), move |service| {
            service.snooze_task(&id, request)
        })
        .await?;

        Ok(json!({ "task": task }))
    }

    fn metadata(&self) -> Option<pmcp::types::ToolInfo> {
        Some(pmcp::types::ToolInfo {
            name: "snooze_task".to_string(),
            description: Some(
                "Push an open task's due date to now plus the given period".to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "required": ["id", "period"],
                "properties": {
                    "id": { "type": "string", "description": "Task ULID" },
                    "period": { "type": "string", "description": "Offset such as 3d, 2w or 1m" },
                    "updatedAt": {
                        "type": "string",
                        "description": "RFC3339 snooze instant; defaults to the server clock"
                    }
                }
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use upkeep_core::capture::TaskInput;

    use crate::tools::util::{seed_list, test_extra, test_service};

    #[tokio::test]
    async fn snooze_sets_due_date_from_instant() {
        let (service, _dir) = test_service();
        let list_id = seed_list(&service);
        let task = service
            .create_task(TaskInput {
                due: Some("2024-01-01".into()),
                ..TaskInput::new(&list_id, "Defrost freezer")
            })
            .expect("create");

        let response = SnoozeTaskTool::new(service.clone())
            .handle(
                json!({ "id": task.id, "period": "3d", "updatedAt": "2024-01-05T00:00:00Z" }),
                test_extra(),
            )
            .await
            .expect("snooze");

        assert_eq!(response["task"]["due_date"], "2024-01-08");
        assert_eq!(response["task"]["completed"], false);
        assert_eq!(service.list_tasks(&list_id).expect("tasks").len(), 1);
    }

    #[tokio::test]
    async fn malformed_period_is_rejected() {
        let (service, _dir) = test_service();
        let list_id = seed_list(&service);
        let task = service
            .create_task(TaskInput::new(&list_id, "Defrost freezer"))
            .expect("create");

        let result = SnoozeTaskTool::new(service)
            .handle(json!({ "id": task.id, "period": "soon" }), test_extra())
            .await;
        assert!(result.is_err());
    }
}
