use tracing::debug;

use super::tasks::TasksService;
use crate::error::UpkeepResult;
use crate::events::ChangeEvent;
use crate::model::{DeleteResult, TaskList};
use crate::parser::normalize_list_name;

impl TasksService {
    pub fn list_lists(&self) -> UpkeepResult<Vec<TaskList>> {
        self.with_store(|store| Ok(store.list_lists()?))
    }

    pub fn fetch_list(&self, id: &str) -> UpkeepResult<Option<TaskList>> {
        self.with_store(|store| Ok(store.fetch_list(id)?))
    }

    pub fn create_list(&self, name: &str) -> UpkeepResult<TaskList> {
        let list = TaskList::new(normalize_list_name(name)?, self.now());
        self.with_store(|store| Ok(store.insert_list(&list)?))?;

        debug!(list_id = list.id.as_str(), "list created");
        self.publish(ChangeEvent::ListCreated { list: list.clone() });
        Ok(list)
    }

    /// Returns `None` when the list does not exist.
    pub fn rename_list(&self, id: &str, name: &str) -> UpkeepResult<Option<TaskList>> {
        let name = normalize_list_name(name)?;
        let now = self.now();
        let renamed = self.with_store(|store| {
            let Some(mut list) = store.fetch_list(id)? else {
                return Ok(None);
            };
            list.name = name;
            list.updated_at = now;
            Ok(store.update_list(&list)?.then_some(list))
        })?;

        if let Some(list) = &renamed {
            debug!(list_id = id, "list renamed");
            self.publish(ChangeEvent::ListUpdated { list: list.clone() });
        }
        Ok(renamed)
    }

    /// Deletes the list and, through the store's cascade, its tasks.
    pub fn delete_list(&self, id: &str) -> UpkeepResult<DeleteResult> {
        let deleted = self.with_store(|store| Ok(store.delete_list(id)?))?;
        if deleted {
            debug!(list_id = id, "list deleted");
            self.publish(ChangeEvent::ListDeleted {
                list_id: id.to_string(),
            });
        }
        Ok(DeleteResult {
            id: id.to_string(),
            deleted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::TaskInput;
    use crate::error::UpkeepError;
    use crate::events::RecordingSink;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[test]
    fn list_lifecycle_publishes_events() {
        let sink = Arc::new(RecordingSink::new());
        let service = TasksService::in_memory().with_sink(sink.clone());

        let list = service.create_list("  Basement ").unwrap();
        assert_eq!(list.name, "Basement");
        let renamed = service.rename_list(&list.id, "Cellar").unwrap().unwrap();
        assert_eq!(renamed.name, "Cellar");
        assert_eq!(service.list_lists().unwrap(), vec![renamed]);

        assert!(service.delete_list(&list.id).unwrap().deleted);
        assert!(!service.delete_list(&list.id).unwrap().deleted);
        assert_eq!(
            sink.kinds(),
            vec!["list_created", "list_updated", "list_deleted"]
        );
    }

    #[test]
    fn deleting_list_removes_its_tasks() {
        let service = TasksService::in_memory();
        let list = service.create_list("Shed").unwrap();
        let task = service
            .create_task(TaskInput::new(&list.id, "Oil mower"))
            .unwrap();

        service.delete_list(&list.id).unwrap();
        assert!(service.fetch_task(&task.id).unwrap().is_none());
    }

    #[test]
    fn renaming_missing_list_returns_none() {
        let service = TasksService::in_memory();
        assert!(service.rename_list("ghost", "Attic").unwrap().is_none());
        assert!(matches!(
            service.create_list(" "),
            Err(UpkeepError::Validation(_))
        ));
    }
}
