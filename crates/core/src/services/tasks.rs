use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::capture::TaskInput;
use crate::clock::{Clock, SystemClock};
use crate::config::{AppConfig, StorageMode};
use crate::database::Database;
use crate::error::{UpkeepError, UpkeepResult};
use crate::events::{ChangeEvent, ChangeSink, NoopSink};
use crate::model::{DeleteResult, SnoozeRequest, Task, TaskPatch, Timestamp, UpdateOutcome};
use crate::parser::{
    normalize_constraints, normalize_description, normalize_months, normalize_title,
    prepare_new_task,
};
use crate::period::Period;
use crate::recurrence::{snooze_due_date, spawn_next};
use crate::store::{MemoryStore, TaskStore};

/// Attempts at a completion whose task keeps changing underneath it.
const COMPLETION_ATTEMPTS: usize = 3;

#[derive(Clone)]
enum Backend {
    Sqlite(AppConfig),
    Memory(Arc<MemoryStore>),
}

/// Coordinates every mutation of lists and tasks: validation, recurrence,
/// persistence and change notification.
#[derive(Clone)]
pub struct TasksService {
    backend: Backend,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn ChangeSink>,
}

impl fmt::Debug for TasksService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TasksService")
            .field("storage", &self.storage_label())
            .finish_non_exhaustive()
    }
}

impl TasksService {
    pub fn new(config: AppConfig) -> Result<Self> {
        let backend = match config.storage() {
            StorageMode::Sqlite => {
                Database::initialize(&config)?;
                Backend::Sqlite(config)
            }
            StorageMode::Memory => Backend::Memory(Arc::new(MemoryStore::new())),
        };
        Ok(Self {
            backend,
            clock: Arc::new(SystemClock),
            sink: Arc::new(NoopSink),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(MemoryStore::new())),
            clock: Arc::new(SystemClock),
            sink: Arc::new(NoopSink),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn ChangeSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn storage_label(&self) -> String {
        match &self.backend {
            Backend::Sqlite(config) => config.db_path().display().to_string(),
            Backend::Memory(_) => "memory".to_string(),
        }
    }

    pub fn list_tasks(&self, list_id: &str) -> UpkeepResult<Vec<Task>> {
        self.with_store(|store| {
            require_list(store, list_id)?;
            Ok(store.list_tasks(list_id)?)
        })
    }

    pub fn fetch_task(&self, id: &str) -> UpkeepResult<Option<Task>> {
        self.with_store(|store| Ok(store.fetch_task(id)?))
    }

    pub fn create_task(&self, input: TaskInput) -> UpkeepResult<Task> {
        let now = self.clock.now();
        let draft = prepare_new_task(&input, now.date_naive())?;
        let task = self.with_store(|store| {
            require_list(store, &draft.list_id)?;
            let task = draft.into_task(now);
            store.insert_task(&task)?;
            Ok(task)
        })?;

        debug!(task_id = task.id.as_str(), list_id = task.list_id.as_str(), "task created");
        self.publish(ChangeEvent::TaskCreated {
            list_id: task.list_id.clone(),
            task: task.clone(),
        });
        Ok(task)
    }

    /// Apply a partial update. A transition to completed on a recurring task
    /// also stores the next occurrence, returned as `created_task`.
    pub fn update_task(&self, id: &str, patch: TaskPatch) -> UpkeepResult<UpdateOutcome> {
        let edits = PatchEdits::validate(&patch)?;
        let now = self.clock.now();

        let outcome = self.with_store(|store| {
            for _ in 0..COMPLETION_ATTEMPTS {
                if let Some(outcome) = apply_update(store, id, &edits, &patch, now)? {
                    return Ok(outcome);
                }
                debug!(task_id = id, "task completed concurrently, re-reading");
            }
            Err(UpkeepError::invalid_state(format!(
                "Task {} kept changing while it was being completed",
                id
            )))
        })?;

        debug!(
            task_id = id,
            completed = outcome.task.completed,
            "task updated"
        );
        if let Some(next) = &outcome.created_task {
            info!(
                task_id = id,
                next_id = next.id.as_str(),
                due_date = ?next.due_date,
                "spawned next occurrence"
            );
            self.publish(ChangeEvent::TaskCreated {
                list_id: next.list_id.clone(),
                task: next.clone(),
            });
        }
        self.publish(ChangeEvent::TaskUpdated {
            list_id: outcome.task.list_id.clone(),
            task: outcome.task.clone(),
            created_task: outcome.created_task.clone(),
        });
        Ok(outcome)
    }

    /// Toggle completion, stamping with `at` or the service clock.
    pub fn set_completed(
        &self,
        id: &str,
        completed: bool,
        at: Option<Timestamp>,
    ) -> UpkeepResult<UpdateOutcome> {
        let at = at.unwrap_or_else(|| self.clock.now());
        self.update_task(id, TaskPatch::completion(completed, at))
    }

    /// Push the due date of an open task to `instant + period`, where the
    /// instant is the request's `updated_at` or the service clock.
    pub fn snooze_task(&self, id: &str, request: SnoozeRequest) -> UpkeepResult<Task> {
        let period = Period::parse(&request.period)?;
        let instant = request.updated_at.unwrap_or_else(|| self.clock.now());

        let task = self.with_store(|store| {
            let mut task = require_task(store, id)?;
            task.due_date = Some(snooze_due_date(&task, period, instant)?);
            task.updated_at = instant;
            if !store.update_task(&task)? {
                return Err(missing_task(id));
            }
            Ok(task)
        })?;

        debug!(task_id = id, period = %period, due_date = ?task.due_date, "task snoozed");
        self.publish(ChangeEvent::TaskUpdated {
            list_id: task.list_id.clone(),
            task: task.clone(),
            created_task: None,
        });
        Ok(task)
    }

    pub fn delete_tasks(&self, ids: &[String]) -> UpkeepResult<Vec<DeleteResult>> {
        let removed = self.with_store(|store| {
            let mut removed = Vec::with_capacity(ids.len());
            for id in ids {
                let list_id = store.fetch_task(id)?.map(|task| task.list_id);
                let deleted = match &list_id {
                    Some(_) => store.delete_task(id)?,
                    None => false,
                };
                removed.push((id.clone(), list_id.filter(|_| deleted)));
            }
            Ok(removed)
        })?;

        let mut results = Vec::with_capacity(removed.len());
        for (id, list_id) in removed {
            if let Some(list_id) = &list_id {
                debug!(task_id = id.as_str(), "task deleted");
                self.publish(ChangeEvent::TaskDeleted {
                    list_id: list_id.clone(),
                    task_id: id.clone(),
                });
            }
            results.push(DeleteResult {
                deleted: list_id.is_some(),
                id,
            });
        }
        Ok(results)
    }

    pub(super) fn with_store<T>(
        &self,
        op: impl FnOnce(&dyn TaskStore) -> UpkeepResult<T>,
    ) -> UpkeepResult<T> {
        match &self.backend {
            Backend::Sqlite(config) => {
                let db = Database::initialize(config)?;
                op(&db)
            }
            Backend::Memory(store) => op(store.as_ref()),
        }
    }

    pub(super) fn publish(&self, event: ChangeEvent) {
        self.sink.publish(event);
    }
}

/// One read-modify-write of a task. `None` means another writer completed
/// the task between the read and the write, and nothing was stored.
fn apply_update(
    store: &dyn TaskStore,
    id: &str,
    edits: &PatchEdits,
    patch: &TaskPatch,
    now: Timestamp,
) -> UpkeepResult<Option<UpdateOutcome>> {
    let existing = require_task(store, id)?;
    if let Some(target) = &edits.list_id {
        if target != &existing.list_id {
            require_list(store, target)?;
        }
    }

    let task = edits.apply(&existing, patch);
    let spawned = if !existing.completed && task.completed {
        spawn_next(&task, now)?
    } else {
        None
    };

    match &spawned {
        Some(next) => {
            if !store.commit_completion(&task, next)? {
                return Ok(None);
            }
        }
        None => {
            if !store.update_task(&task)? {
                return Err(missing_task(id));
            }
        }
    }
    Ok(Some(UpdateOutcome {
        task,
        created_task: spawned,
    }))
}

/// Patch fields validated before anything is read or written.
struct PatchEdits {
    list_id: Option<String>,
    title: Option<String>,
    description: Option<Option<String>>,
    period: Option<Option<Period>>,
    months: Option<Vec<u32>>,
    constraints: Option<Vec<String>>,
}

impl PatchEdits {
    fn validate(patch: &TaskPatch) -> UpkeepResult<Self> {
        let period = patch
            .reschedule_period
            .as_deref()
            .map(|raw| Period::parse_optional(Some(raw)))
            .transpose()?;
        let list_id = match patch.list_id.as_deref().map(str::trim) {
            Some("") => return Err(UpkeepError::validation("Task must belong to a list")),
            other => other.map(str::to_string),
        };

        Ok(Self {
            list_id,
            title: patch.title.as_deref().map(normalize_title).transpose()?,
            description: patch
                .description
                .as_deref()
                .map(|raw| normalize_description(Some(raw)))
                .transpose()?,
            period,
            months: patch
                .prohibited_months
                .as_deref()
                .map(normalize_months)
                .transpose()?,
            constraints: patch.constraints.as_deref().map(normalize_constraints),
        })
    }

    fn apply(&self, existing: &Task, patch: &TaskPatch) -> Task {
        let mut task = existing.clone();
        if let Some(list_id) = &self.list_id {
            task.list_id = list_id.clone();
        }
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if patch.clear_due_date {
            task.due_date = None;
        } else if let Some(due) = patch.due_date {
            task.due_date = Some(due);
        }
        if let Some(period) = self.period {
            task.reschedule_period = period;
        }
        if let Some(base) = patch.reschedule_base {
            task.reschedule_base = base;
        }
        if let Some(months) = &self.months {
            task.prohibited_months = months.clone();
        }
        if let Some(constraints) = &self.constraints {
            task.constraints = constraints.clone();
        }

        task.completed = patch.completed.unwrap_or(existing.completed);
        task.completed_at = match (existing.completed, task.completed) {
            (_, false) => None,
            (false, true) => Some(patch.completed_at.unwrap_or(patch.updated_at)),
            (true, true) => patch
                .completed_at
                .or(existing.completed_at)
                .or(Some(patch.updated_at)),
        };
        task.updated_at = patch.updated_at;
        task
    }
}

fn require_list(store: &dyn TaskStore, list_id: &str) -> UpkeepResult<()> {
    match store.fetch_list(list_id)? {
        Some(_) => Ok(()),
        None => Err(UpkeepError::validation(format!(
            "List {} does not exist",
            list_id
        ))),
    }
}

fn require_task(store: &dyn TaskStore, id: &str) -> UpkeepResult<Task> {
    store.fetch_task(id)?.ok_or_else(|| missing_task(id))
}

fn missing_task(id: &str) -> UpkeepError {
    UpkeepError::invalid_state(format!("Task {} does not exist", id))
}
