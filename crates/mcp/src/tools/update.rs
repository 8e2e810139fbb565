use std::sync::Arc;

use async_trait::async_trait;
use pmcp::{RequestHandlerExtra, Result as McpResult, ToolHandler};
use serde::Deserialize;
use serde_json::{json, Value};
use upkeep_core::model::{RescheduleBase, TaskPatch, Timestamp};
use upkeep_core::parser::parse_due_spec;
use upkeep_core::services::TasksService;

use super::util::{internal_error, parse_timestamp, validation_error, with_service};

pub struct UpdateTaskTool {
    service: Arc<TasksService>,
}

impl UpdateTaskTool {
    pub fn new(service: Arc<TasksService>) -> Self {
        Self { service }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTaskArgs {
    id: String,
    list_id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    completed: Option<bool>,
    due_date: Option<String>,
    #[serde(default)]
    clear_due_date: bool,
    reschedule_period: Option<String>,
    reschedule_base: Option<RescheduleBase>,
    completed_at: Option<String>,
    prohibited_months: Option<Vec<i64>>,
    constraints: Option<Vec<String>>,
    updated_at: Option<String>,
}

impl UpdateTaskArgs {
    /// An empty `dueDate` clears the due date, like the other string fields.
    fn clears_due_date(&self) -> bool {
        self.clear_due_date
            || self
                .due_date
                .as_deref()
                .is_some_and(|spec| spec.trim().is_empty())
    }

    fn into_patch(self, updated_at: Timestamp, completed_at: Option<Timestamp>) -> TaskPatch {
        TaskPatch {
            list_id: self.list_id,
            title: self.title,
            description: self.description,
            completed: self.completed,
            due_date: None,
            clear_due_date: self.clears_due_date(),
            reschedule_period: self.reschedule_period,
            reschedule_base: self.reschedule_base,
            completed_at,
            prohibited_months: self.prohibited_months,
            constraints: self.constraints,
            updated_at,
        }
    }
}

#[async_trait]
impl ToolHandler for UpdateTaskTool {
    async fn handle(&self, args: Value, _extra: RequestHandlerExtra) -> McpResult<Value> {
        let parsed: UpdateTaskArgs = serde_json::from_value(args).map_err(validation_error)?;
        let updated_at = parse_timestamp("updatedAt", parsed.updated_at.as_deref())?;
        let completed_at = parse_timestamp("completedAt", parsed.completed_at.as_deref())?;

        let outcome = with_service(self.service.clone(), move |service| {
            let now = service.now();
            let due_date = parsed
                .due_date
                .as_deref()
                .filter(|spec| !spec.trim().is_empty())
                .map(|spec| parse_due_spec(spec, now.date_naive()))
                .transpose()?;
            let id = parsed.id.clone();
            let patch = TaskPatch {
                due_date,
                ..parsed.into_patch(updated_at.unwrap_or(now), completed_at)
            };
            service.update_task(&id, patch)
        })
        .await?;

        serde_json::to_value(outcome).map_err(internal_error)
    }

    fn metadata(&self) -> Option<pmcp::types::ToolInfo> {
        Some(pmcp::types::ToolInfo {
            name: "update_task".to_string(),
            description: Some(
                "Update task fields or toggle completion. Completing a recurring task also \
                 creates its next occurrence, returned as created_task"
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "required": ["id"],
                "properties": {
                    "id": { "type": "string", "description": "Task ULID" },
                    "listId": { "type": "string", "description": "Move the task to this list" },
                    "title": { "type": "string", "minLength": 1, "maxLength": 200 },
                    "description": {
                        "type": "string",
                        "maxLength": 1000,
                        "description": "Empty string clears the description"
                    },
                    "completed": { "type": "boolean" },
                    "dueDate": {
                        "type": "string",
                        "description": "YYYY-MM-DD, today, tomorrow, a weekday name or +<period>; empty string clears the due date"
                    },
                    "clearDueDate": { "type": "boolean" },
                    "reschedulePeriod": {
                        "type": "string",
                        "description": "Recurrence such as 3d, 2w or 1m; empty string stops recurring"
                    },
                    "rescheduleBase": { "type": "string", "enum": ["completed", "due"] },
                    "completedAt": { "type": "string", "description": "RFC3339 timestamp" },
                    "prohibitedMonths": {
                        "type": "array",
                        "items": { "type": "integer", "minimum": 1, "maximum": 12 }
                    },
                    "constraints": {
                        "type": "array",
                        "items": { "type": "string" }
                    },
                    "updatedAt": {
                        "type": "string",
                        "description": "RFC3339 client timestamp, stored as given; defaults to the server clock"
                    }
                }
            }),
        })
    }
}
