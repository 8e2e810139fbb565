use crate::error::UpkeepError;
use crate::model::RescheduleBase;

/// Normalized input for creating a task from any client (CLI, MCP).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskInput {
    pub list_id: String,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    /// Date specification: `YYYY-MM-DD`, `today`, `tomorrow`, a weekday or `+<period>`.
    pub due: Option<String>,
    pub reschedule_period: Option<String>,
    pub reschedule_base: Option<RescheduleBase>,
    pub prohibited_months: Vec<i64>,
    pub constraints: Vec<String>,
}

impl TaskInput {
    pub fn new(list_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            list_id: list_id.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn require_title(&self) -> Result<(), UpkeepError> {
        if self.title.trim().is_empty() {
            return Err(UpkeepError::validation("Task title cannot be empty"));
        }
        Ok(())
    }
}
