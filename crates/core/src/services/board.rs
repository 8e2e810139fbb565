use chrono::NaiveDate;
use serde::Serialize;

use super::tasks::TasksService;
use crate::constraints::{self, Warning};
use crate::error::{UpkeepError, UpkeepResult};
use crate::model::{Task, TaskList, Timestamp};
use crate::urgency::{self, Buckets};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardEntry {
    pub task: Task,
    pub warnings: Vec<Warning>,
}

/// One list split into urgency buckets, each task paired with its badges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardSnapshot {
    pub list: TaskList,
    pub today: NaiveDate,
    pub due: Vec<BoardEntry>,
    pub upcoming: Vec<BoardEntry>,
    pub completed: Vec<BoardEntry>,
}

impl BoardSnapshot {
    pub fn len(&self) -> usize {
        self.due.len() + self.upcoming.len() + self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TasksService {
    pub fn board(&self, list_id: &str, now: &Timestamp) -> UpkeepResult<BoardSnapshot> {
        let (list, tasks) = self.with_store(|store| {
            let list = store.fetch_list(list_id)?.ok_or_else(|| {
                UpkeepError::validation(format!("List {} does not exist", list_id))
            })?;
            Ok((list, store.list_tasks(list_id)?))
        })?;

        let today = now.date_naive();
        let Buckets {
            due,
            upcoming,
            completed,
        } = urgency::partition_on(tasks, today).map(|task| BoardEntry {
            warnings: constraints::evaluate(&task, today),
            task,
        });

        Ok(BoardSnapshot {
            list,
            today,
            due,
            upcoming,
            completed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::TaskInput;
    use chrono::DateTime;
    use pretty_assertions::assert_eq;

    #[test]
    fn board_buckets_tasks_with_warnings() {
        let service = TasksService::in_memory();
        let list = service.create_list("Garden").unwrap();
        for (title, due) in [
            ("Weed beds", Some("2024-06-15")),
            ("Plant bulbs", Some("2024-06-16")),
            ("Check hose", None),
        ] {
            let input = TaskInput {
                due: due.map(String::from),
                prohibited_months: vec![7],
                constraints: vec!["dry soil".into()],
                ..TaskInput::new(&list.id, title)
            };
            service.create_task(input).unwrap();
        }

        let now = DateTime::parse_from_rfc3339("2024-06-15T21:30:00+02:00").unwrap();
        let board = service.board(&list.id, &now).unwrap();
        let due: Vec<&str> = board.due.iter().map(|e| e.task.title.as_str()).collect();
        assert_eq!(due, vec!["Weed beds", "Check hose"]);
        assert_eq!(board.upcoming[0].task.title, "Plant bulbs");
        assert!(board.completed.is_empty());
        assert_eq!(board.len(), 3);

        let messages: Vec<&str> = board.due[0]
            .warnings
            .iter()
            .map(|w| w.message.as_str())
            .collect();
        assert_eq!(messages, vec!["Do before July", "dry soil"]);
    }

    #[test]
    fn board_for_unknown_list_is_rejected() {
        let service = TasksService::in_memory();
        let now = DateTime::parse_from_rfc3339("2024-06-15T10:00:00Z").unwrap();
        assert!(matches!(
            service.board("ghost", &now),
            Err(UpkeepError::Validation(_))
        ));
    }
}
