use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::UpkeepError;
use crate::period::Period;

/// Instants keep the offset they were recorded with so the calendar day
/// matches the wall clock of whoever supplied them.
pub type Timestamp = DateTime<FixedOffset>;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RescheduleBase {
    #[default]
    Completed,
    Due,
}

impl RescheduleBase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RescheduleBase::Completed => "completed",
            RescheduleBase::Due => "due",
        }
    }
}

impl fmt::Display for RescheduleBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RescheduleBase {
    type Err = UpkeepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "completed" | "completion" => Ok(RescheduleBase::Completed),
            "due" | "due_date" | "due-date" => Ok(RescheduleBase::Due),
            other => Err(UpkeepError::validation(format!(
                "Unknown reschedule base '{}': expected completed|due",
                other
            ))),
        }
    }
}

impl ValueEnum for RescheduleBase {
    fn value_variants<'a>() -> &'a [Self] {
        const VARIANTS: [RescheduleBase; 2] = [RescheduleBase::Completed, RescheduleBase::Due];
        &VARIANTS
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    pub id: String,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TaskList {
    pub fn new(name: String, now: Timestamp) -> Self {
        Self {
            id: Ulid::new().to_string(),
            name,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub list_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub completed: bool,
    pub due_date: Option<NaiveDate>,
    pub reschedule_period: Option<Period>,
    pub reschedule_base: RescheduleBase,
    pub completed_at: Option<Timestamp>,
    pub prohibited_months: Vec<u32>,
    pub constraints: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Validated data for a task that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub list_id: String,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub due_date: Option<NaiveDate>,
    pub reschedule_period: Option<Period>,
    pub reschedule_base: RescheduleBase,
    pub prohibited_months: Vec<u32>,
    pub constraints: Vec<String>,
}

impl NewTask {
    /// Assign a fresh id and creation stamps.
    pub fn into_task(self, now: Timestamp) -> Task {
        Task {
            id: Ulid::new().to_string(),
            list_id: self.list_id,
            title: self.title,
            description: self.description,
            completed: self.completed,
            due_date: self.due_date,
            reschedule_period: self.reschedule_period,
            reschedule_base: self.reschedule_base,
            completed_at: self.completed.then_some(now),
            prohibited_months: self.prohibited_months,
            constraints: self.constraints,
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<&Task> for NewTask {
    fn from(task: &Task) -> Self {
        Self {
            list_id: task.list_id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            completed: task.completed,
            due_date: task.due_date,
            reschedule_period: task.reschedule_period,
            reschedule_base: task.reschedule_base,
            prohibited_months: task.prohibited_months.clone(),
            constraints: task.constraints.clone(),
        }
    }
}

/// Partial update of a task. `updated_at` comes from the caller's clock and
/// is stored as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPatch {
    pub list_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub due_date: Option<NaiveDate>,
    pub clear_due_date: bool,
    /// An empty string clears recurrence.
    pub reschedule_period: Option<String>,
    pub reschedule_base: Option<RescheduleBase>,
    pub completed_at: Option<Timestamp>,
    pub prohibited_months: Option<Vec<i64>>,
    pub constraints: Option<Vec<String>>,
    pub updated_at: Timestamp,
}

impl TaskPatch {
    /// An empty patch stamped with the caller's clock.
    pub fn at(updated_at: Timestamp) -> Self {
        Self {
            list_id: None,
            title: None,
            description: None,
            completed: None,
            due_date: None,
            clear_due_date: false,
            reschedule_period: None,
            reschedule_base: None,
            completed_at: None,
            prohibited_months: None,
            constraints: None,
            updated_at,
        }
    }

    pub fn completion(completed: bool, updated_at: Timestamp) -> Self {
        Self {
            completed: Some(completed),
            ..Self::at(updated_at)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnoozeRequest {
    pub period: String,
    pub updated_at: Option<Timestamp>,
}

/// Result of an update: the mutated record plus the occurrence spawned by a
/// recurring completion, if any. Callers must handle both parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateOutcome {
    pub task: Task,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_task: Option<Task>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteResult {
    pub id: String,
    pub deleted: bool,
}
