use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use parking_lot::Mutex;

use crate::model::{Task, TaskList};

/// Persistence collaborator for lists and tasks.
pub trait TaskStore {
    fn list_lists(&self) -> Result<Vec<TaskList>>;
    fn fetch_list(&self, id: &str) -> Result<Option<TaskList>>;
    fn insert_list(&self, list: &TaskList) -> Result<()>;
    /// Returns `false` when the list does not exist.
    fn update_list(&self, list: &TaskList) -> Result<bool>;
    /// Removes the list and every task in it.
    fn delete_list(&self, id: &str) -> Result<bool>;

    /// Tasks of one list, oldest first.
    fn list_tasks(&self, list_id: &str) -> Result<Vec<Task>>;
    fn fetch_task(&self, id: &str) -> Result<Option<Task>>;
    fn insert_task(&self, task: &Task) -> Result<()>;
    /// Returns `false` when the task does not exist.
    fn update_task(&self, task: &Task) -> Result<bool>;
    fn delete_task(&self, id: &str) -> Result<bool>;

    /// Store a completed task together with its spawned occurrence.
    ///
    /// Returns `false` and writes nothing when the stored task is missing or
    /// already completed, so a completion only ever spawns once.
    ///
    /// Stores that cannot write both records atomically fall back to this
    /// version: the occurrence is inserted first and deleted again if the
    /// update fails, so a failure leaves neither write behind.
    fn commit_completion(&self, updated: &Task, spawned: &Task) -> Result<bool> {
        match self.fetch_task(&updated.id)? {
            Some(stored) if !stored.completed => {}
            _ => return Ok(false),
        }
        self.insert_task(spawned)
            .with_context(|| format!("Failed to insert occurrence of task {}", updated.id))?;

        let failure = match self.update_task(updated) {
            Ok(true) => return Ok(true),
            Ok(false) => anyhow!("Task {} disappeared before completion was stored", updated.id),
            Err(err) => err.context(format!("Failed to store completion of task {}", updated.id)),
        };

        tracing::warn!(
            task_id = updated.id.as_str(),
            spawned_id = spawned.id.as_str(),
            "completion failed, removing spawned occurrence"
        );
        if let Err(cleanup) = self.delete_task(&spawned.id) {
            return Err(failure.context(format!(
                "cleanup of occurrence {} also failed: {:#}",
                spawned.id, cleanup
            )));
        }
        Err(failure)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    lists: HashMap<String, TaskList>,
    tasks: HashMap<String, Task>,
}

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskStore for MemoryStore {
    fn list_lists(&self) -> Result<Vec<TaskList>> {
        let state = self.state.lock();
        let mut lists: Vec<TaskList> = state.lists.values().cloned().collect();
        lists.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(lists)
    }

    fn fetch_list(&self, id: &str) -> Result<Option<TaskList>> {
        Ok(self.state.lock().lists.get(id).cloned())
    }

    fn insert_list(&self, list: &TaskList) -> Result<()> {
        let mut state = self.state.lock();
        if state.lists.contains_key(&list.id) {
            return Err(anyhow!("List {} already exists", list.id));
        }
        state.lists.insert(list.id.clone(), list.clone());
        Ok(())
    }

    fn update_list(&self, list: &TaskList) -> Result<bool> {
        let mut state = self.state.lock();
        match state.lists.get_mut(&list.id) {
            Some(existing) => {
                *existing = list.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_list(&self, id: &str) -> Result<bool> {
        let mut state = self.state.lock();
        if state.lists.remove(id).is_none() {
            return Ok(false);
        }
        state.tasks.retain(|_, task| task.list_id != id);
        Ok(true)
    }

    fn list_tasks(&self, list_id: &str) -> Result<Vec<Task>> {
        let state = self.state.lock();
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|task| task.list_id == list_id)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(tasks)
    }

    fn fetch_task(&self, id: &str) -> Result<Option<Task>> {
        Ok(self.state.lock().tasks.get(id).cloned())
    }

    fn insert_task(&self, task: &Task) -> Result<()> {
        let mut state = self.state.lock();
        if !state.lists.contains_key(&task.list_id) {
            return Err(anyhow!("List {} does not exist", task.list_id));
        }
        if state.tasks.contains_key(&task.id) {
            return Err(anyhow!("Task {} already exists", task.id));
        }
        state.tasks.insert(task.id.clone(), task.clone());
        Ok(())
    }

    fn update_task(&self, task: &Task) -> Result<bool> {
        let mut state = self.state.lock();
        if !state.lists.contains_key(&task.list_id) {
            return Err(anyhow!("List {} does not exist", task.list_id));
        }
        match state.tasks.get_mut(&task.id) {
            Some(existing) => {
                *existing = task.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_task(&self, id: &str) -> Result<bool> {
        Ok(self.state.lock().tasks.remove(id).is_some())
    }

    fn commit_completion(&self, updated: &Task, spawned: &Task) -> Result<bool> {
        let mut state = self.state.lock();
        match state.tasks.get(&updated.id) {
            Some(stored) if !stored.completed => {}
            _ => return Ok(false),
        }
        if !state.lists.contains_key(&spawned.list_id) {
            return Err(anyhow!("List {} does not exist", spawned.list_id));
        }
        state.tasks.insert(updated.id.clone(), updated.clone());
        state.tasks.insert(spawned.id.clone(), spawned.clone());
        Ok(true)
    }
}
