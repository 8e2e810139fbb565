use std::sync::Arc;

use async_trait::async_trait;
use pmcp::{RequestHandlerExtra, Result as McpResult, ToolHandler};
use serde::Deserialize;
use serde_json::{json, Value};
use upkeep_core::services::TasksService;

use super::util::{internal_error, validation_error, with_service};

pub struct ListListsTool {
    service: Arc<TasksService>,
}

impl ListListsTool {
    pub fn new(service: Arc<TasksService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for ListListsTool {
    async fn handle(&self, _args: Value, _extra: RequestHandlerExtra) -> McpResult<Value> {
        let lists = with_service(self.service.clone(), |service| service.list_lists()).await?;
        Ok(json!({ "lists": lists }))
    }

    fn metadata(&self) -> Option<pmcp::types::ToolInfo> {
        Some(pmcp::types::ToolInfo {
            name: "list_lists".to_string(),
            description: Some("List every task list, oldest first".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        })
    }
}

pub struct CreateListTool {
    service: Arc<TasksService>,
}

impl CreateListTool {
    pub fn new(service: Arc<TasksService>) -> Self {
        Self { service }
    }
}

#[derive(Debug, Deserialize)]
struct CreateListArgs {
    name: String,
}

#[async_trait]
impl ToolHandler for CreateListTool {
    async fn handle(&self, args: Value, _extra: RequestHandlerExtra) -> McpResult<Value> {
        let parsed: CreateListArgs = serde_json::from_value(args).map_err(validation_error)?;
        let list = with_service(self.service.clone(), move |service| {
            service.create_list(&parsed.name)
        })
        .await?;

        serde_json::to_value(list).map_err(internal_error)
    }

    fn metadata(&self) -> Option<pmcp::types::ToolInfo> {
        Some(pmcp::types::ToolInfo {
            name: "create_list".to_string(),
            description: Some("Create a task list".to_string()),
            input_schema: json!({
                "type": "object",
                "required": ["name"],
                "properties": {
                    "name": { "type": "string", "minLength": 1, "maxLength": 200 }
                }
            }),
        })
    }
}

pub struct RenameListTool {
    service: Arc<TasksService>,
}

impl RenameListTool {
    pub fn new(service: Arc<TasksService>) -> Self {
        Self { service }
    }
}

#[derive(Debug, Deserialize)]
struct RenameListArgs {
    id: String,
    name: String,
}

#[async_trait]
impl ToolHandler for RenameListTool {
    async fn handle(&self, args: Value, _extra: RequestHandlerExtra) -> McpResult<Value> {
        let parsed: RenameListArgs = serde_json::from_value(args).map_err(validation_error)?;
        let id = parsed.id.clone();
        let renamed = with_service(self.service.clone(), move |service| {
            service.rename_list(&parsed.id, &parsed.name)
        })
        .await?;

        match renamed {
            Some(list) => serde_json::to_value(list).map_err(internal_error),
            None => Err(validation_error(format!("List {} does not exist", id))),
        }
    }

    fn metadata(&self) -> Option<pmcp::types::ToolInfo> {
        Some(pmcp::types::ToolInfo {
            name: "rename_list".to_string(),
            description: Some("Rename a task list".to_string()),
            input_schema: json!({
                "type": "object",
                "required": ["id", "name"],
                "properties": {
                    "id": { "type": "string", "description": "List ULID" },
                    "name": { "type": "string", "minLength": 1, "maxLength": 200 }
                }
            }),
        })
    }
}

pub struct DeleteListTool {
    service: Arc<TasksService>,
}

impl DeleteListTool {
    pub fn new(service: Arc<TasksService>) -> Self {
        Self { service }
    }
}

#[derive(Debug, Deserialize)]
struct DeleteListArgs {
    id: String,
}

#[async_trait]
impl ToolHandler for DeleteListTool {
    async fn handle(&self, args: Value, _extra: RequestHandlerExtra) -> McpResult<Value> {
        let parsed: DeleteListArgs = serde_json::from_value(args).map_err(validation_error)?;
        let result = with_service(self.service.clone(), move |service| {
            service.delete_list(&parsed.id)
        })
        .await?;

        serde_json::to_value(result).map_err(internal_error)
    }

    fn metadata(&self) -> Option<pmcp::types::ToolInfo> {
        Some(pmcp::types::ToolInfo {
            name: "delete_list".to_string(),
            description: Some("Delete a task list together with all of its tasks".to_string()),
            input_schema: json!({
                "type": "object",
                "required": ["id"],
                "properties": {
                    "id": { "type": "string", "description": "List ULID" }
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

    use crate::tools::util::{test_extra, test_service};

    #[tokio::test]
    async fn list_crud_round_trip() {
        let (service, _dir) = test_service();

        let created = CreateListTool::new(service.clone())
            .handle(json!({ "name": "Bathroom" }), test_extra())
            .await
            .expect("create");
        let id = created["id"].as_str().expect("id").to_string();

        let renamed = RenameListTool::new(service.clone())
            .handle(json!({ "id": id, "name": "Ensuite" }), test_extra())
            .await
            .expect("rename");
        assert_eq!(renamed["name"], "Ensuite");

        let listed = ListListsTool::new(service.clone())
            .handle(json!({}), test_extra())
            .await
            .expect("list");
        assert_eq!(listed["lists"].as_array().map(Vec::len), Some(1));

        let deleted = DeleteListTool::new(service.clone())
            .handle(json!({ "id": id }), test_extra())
            .await
            .expect("delete");
        assert_eq!(deleted["deleted"], true);
        assert!(service.list_lists().expect("lists").is_empty());
    }

    #[tokio::test]
    async fn rename_unknown_list_is_rejected() {
        let (service, _dir) = test_service();
        let result = RenameListTool::new(service)
            .handle(json!({ "id": "ghost", "name": "Attic" }), test_extra())
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn blank_list_name_is_rejected() {
        let (service, _dir) = test_service();
        let result = CreateListTool::new(service)
            .handle(json!({ "name": "  " }), test_extra())
            .await;
        assert!(result.is_err());
    }
}
