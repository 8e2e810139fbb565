use std::sync::Arc;

use async_trait::async_trait;
use pmcp::{RequestHandlerExtra, Result as McpResult, ToolHandler};
use serde::Deserialize;
use serde_json::{json, Value};
use upkeep_core::services::TasksService;

use super::util::{internal_error, parse_timestamp, validation_error, with_service};

pub struct ListTasksTool {
    service: Arc<TasksService>,
}

impl ListTasksTool {
    pub fn new(service: Arc<TasksService>) -> Self {
        Self { service }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListTasksArgs {
    list_id: String,
    /// Evaluate buckets and warnings as of this instant instead of now.
    now: Option<String>,
}

#[async_trait]
impl ToolHandler for ListTasksTool {
    async fn handle(&self, args: Value, _extra: RequestHandlerExtra) -> McpResult<Value> {
        let parsed: ListTasksArgs = serde_json::from_value(args).map_err(validation_error)?;
        let at = parse_timestamp("now", parsed.now.as_deref())?;

        let board = with_service(self.service.clone(), move |service| {
            let now = at.unwrap_or_else(|| service.now());
            service.board(&parsed.list_id, &now)
        })
        .await?;

        serde_json::to_value(board).map_err(internal_error)
    }

    fn metadata(&self) -> Option<pmcp::types::ToolInfo> {
        Some(pmcp::types::ToolInfo {
            name: "list_tasks".to_string(),
            description: Some(
                "Show a list's tasks bucketed into due, upcoming and completed, with warning badges"
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "required": ["listId"],
                "properties": {
                    "listId": { "type": "string", "description": "List ULID" },
                    "now": {
                        "type": "string",
                        "description": "RFC3339 instant used as today; defaults to the server clock"
                    }
                }
            }),
        })
    }
}
