//! Change notifications for live observers of lists and tasks.

use parking_lot::Mutex;
use serde::Serialize;

use crate::model::{Task, TaskList};

/// One change to a list or task, carrying enough payload for an observer to
/// apply it without re-fetching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeEvent {
    TaskCreated {
        list_id: String,
        task: Task,
    },
    TaskUpdated {
        list_id: String,
        task: Task,
        created_task: Option<Task>,
    },
    TaskDeleted {
        list_id: String,
        task_id: String,
    },
    ListCreated {
        list: TaskList,
    },
    ListUpdated {
        list: TaskList,
    },
    ListDeleted {
        list_id: String,
    },
}

impl ChangeEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ChangeEvent::TaskCreated { .. } => "task_created",
            ChangeEvent::TaskUpdated { .. } => "task_updated",
            ChangeEvent::TaskDeleted { .. } => "task_deleted",
            ChangeEvent::ListCreated { .. } => "list_created",
            ChangeEvent::ListUpdated { .. } => "list_updated",
            ChangeEvent::ListDeleted { .. } => "list_deleted",
        }
    }

    pub fn list_id(&self) -> &str {
        match self {
            ChangeEvent::TaskCreated { list_id, .. }
            | ChangeEvent::TaskUpdated { list_id, .. }
            | ChangeEvent::TaskDeleted { list_id, .. }
            | ChangeEvent::ListDeleted { list_id } => list_id,
            ChangeEvent::ListCreated { list } | ChangeEvent::ListUpdated { list } => &list.id,
        }
    }
}

/// Receives change notifications after a mutation has been stored.
pub trait ChangeSink: Send + Sync {
    fn publish(&self, event: ChangeEvent);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl ChangeSink for NoopSink {
    fn publish(&self, _event: ChangeEvent) {}
}

/// Logs each change through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ChangeSink for TracingSink {
    fn publish(&self, event: ChangeEvent) {
        tracing::info!(kind = event.kind(), list_id = event.list_id(), "change published");
    }
}

/// Keeps every published event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ChangeEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events.lock().clone()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(ChangeEvent::kind).collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl ChangeSink for RecordingSink {
    fn publish(&self, event: ChangeEvent) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn serializes_with_type_tag() {
        let now = DateTime::parse_from_rfc3339("2024-06-01T10:00:00Z").unwrap();
        let list = TaskList {
            id: "01J".into(),
            name: "Garage".into(),
            created_at: now,
            updated_at: now,
        };
        let value = serde_json::to_value(ChangeEvent::ListCreated { list }).unwrap();
        assert_eq!(value["type"], "list_created");
        assert_eq!(value["list"]["name"], "Garage");

        let value = serde_json::to_value(ChangeEvent::TaskDeleted {
            list_id: "01J".into(),
            task_id: "01K".into(),
        })
        .unwrap();
        assert_eq!(value["type"], "task_deleted");
        assert_eq!(value["task_id"], "01K");
    }

    #[test]
    fn recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        sink.publish(ChangeEvent::ListDeleted {
            list_id: "a".into(),
        });
        sink.publish(ChangeEvent::TaskDeleted {
            list_id: "b".into(),
            task_id: "c".into(),
        });
        assert_eq!(sink.kinds(), vec!["list_deleted", "task_deleted"]);
        assert_eq!(sink.events()[1].list_id(), "b");
        sink.clear();
        assert!(sink.events().is_empty());
    }
}
