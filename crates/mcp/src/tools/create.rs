use std::sync::Arc;

use async_trait::async_trait;
use pmcp::{RequestHandlerExtra, Result as McpResult, ToolHandler};
use serde::Deserialize;
use serde_json::{json, Value};
use upkeep_core::capture::TaskInput;
use upkeep_core::model::RescheduleBase;
use upkeep_core::services::TasksService;

use super::util::{internal_error, validation_error, with_service};

pub struct CreateTaskTool {
    service: Arc<TasksService>,
}

impl CreateTaskTool {
    pub fn new(service: Arc<TasksService>) -> Self {
        Self { service }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTaskArgs {
    list_id: String,
    title: String,
    description: Option<String>,
    #[serde(default)]
    completed: bool,
    due_date: Option<String>,
    reschedule_period: Option<String>,
    reschedule_base: Option<RescheduleBase>,
    #[serde(default)]
    prohibited_months: Vec<i64>,
    #[serde(default)]
    constraints: Vec<String>,
}

impl From<CreateTaskArgs> for TaskInput {
    fn from(args: CreateTaskArgs) -> Self {
        TaskInput {
            list_id: args.list_id,
            title: args.title,
            description: args.description,
            completed: args.completed,
            due: args.due_date,
            reschedule_period: args.reschedule_period,
            reschedule_base: args.reschedule_base,
            prohibited_months: args.prohibited_months,
            constraints: args.constraints,
        }
    }
}

#[async_trait]
impl ToolHandler for CreateTaskTool {
    async fn handle(&self, args: Value, _extra: RequestHandlerExtra) -> McpResult<Value> {
        let parsed: CreateTaskArgs = serde_json::from_value(args).map_err(validation_error)?;
        let input = TaskInput::from(parsed);
        input.require_title().map_err(validation_error)?;

        let task =
            with_service(self.service.clone(), move |service| service.create_task(input)).await?;

        serde_json::to_value(task).map_err(internal_error)
    }

    fn metadata(&self) -> Option<pmcp::types::ToolInfo> {
        Some(pmcp::types::ToolInfo {
            name: "create_task".to_string(),
            description: Some(
                "Create a household task, optionally recurring, in an existing list".to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "required": ["listId", "title"],
                "properties": {
                    "listId": { "type": "string", "description": "List ULID" },
                    "title": { "type": "string", "minLength": 1, "maxLength": 200 },
                    "description": { "type": "string", "maxLength": 1000 },
                    "completed": { "type": "boolean" },
                    "dueDate": {
                        "type": "string",
                        "description": "YYYY-MM-DD, today, tomorrow, a weekday name or +<period>"
                    },
                    "reschedulePeriod": {
                        "type": "string",
                        "pattern": "^\\s*\\d+\\s*[dwmDWM]\\s*$",
                        "description": "Recurrence such as 3d, 2w or 1m"
                    },
                    "rescheduleBase": { "type": "string", "enum": ["completed", "due"] },
                    "prohibitedMonths": {
                        "type": "array",
                        "items": { "type": "integer", "minimum": 1, "maximum": 12 }
                    },
                    "constraints": {
                        "type": "array",
                        "items": { "type": "string" }
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

    use crate::tools::util::{seed_list, test_extra, test_service};

    #[tokio::test]
    async fn creates_recurring_task() {
        let (service, _dir) = test_service();
        let list_id = seed_list(&service);
        let tool = CreateTaskTool::new(service);

        let response = tool
            .handle(
                json!({
                    "listId": list_id,
                    "title": "Clean dryer vent",
                    "dueDate": "2024-09-01",
                    "reschedulePeriod": "6M",
                    "rescheduleBase": "due",
                    "prohibitedMonths": [1, 12, 1],
                    "constraints": ["ladder"]
                }),
                test_extra(),
            )
            .await
            .expect("create result");

        assert_eq!(response["title"], "Clean dryer vent");
        assert_eq!(response["reschedule_period"], "6m");
        assert_eq!(response["reschedule_base"], "due");
        assert_eq!(response["prohibited_months"], json!([1, 12]));
        assert_eq!(response["completed"], false);
    }

    #[tokio::test]
    async fn rejects_bad_month_and_period() {
        let (service, _dir) = test_service();
        let list_id = seed_list(&service);
        let tool = CreateTaskTool::new(service);

        for args in [
            json!({ "listId": list_id, "title": "Rake", "prohibitedMonths": [0] }),
            json!({ "listId": list_id, "title": "Rake", "reschedulePeriod": "0d" }),
            json!({ "listId": list_id, "title": "" }),
        ] {
            assert!(tool.handle(args, test_extra()).await.is_err());
        }
    }
}
