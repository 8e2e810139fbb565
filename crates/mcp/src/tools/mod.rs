mod board;
mod create;
mod delete;
mod get;
mod lists;
mod snooze;
mod update;
mod util;

use std::sync::Arc;

use pmcp::ServerBuilder;
use upkeep_core::services::TasksService;

pub const TOOL_NAMES: [&str; 10] = [
    "list_lists",
    "create_list",
    "rename_list",
    "delete_list",
    "list_tasks",
    "get_task",
    "create_task",
    "update_task",
    "snooze_task",
    "delete_tasks",
];

pub fn register(builder: ServerBuilder, service: Arc<TasksService>) -> ServerBuilder {
    builder
        .tool("list_lists", lists::ListListsTool::new(service.clone()))
        .tool("create_list", lists::CreateListTool::new(service.clone()))
        .tool("rename_list", lists::RenameListTool::new(service.clone()))
        .tool("delete_list", lists::DeleteListTool::new(service.clone()))
        .tool("list_tasks", board::ListTasksTool::new(service.clone()))
        .tool("get_task", get::GetTaskTool::new(service.clone()))
        .tool("create_task", create::CreateTaskTool::new(service.clone()))
        .tool("update_task", update::UpdateTaskTool::new(service.clone()))
        .tool("snooze_task", snooze::SnoozeTaskTool::new(service.clone()))
        .tool("delete_tasks", delete::DeleteTasksTool::new(service))
}
