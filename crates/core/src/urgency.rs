use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{Task, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    /// Not completed and due today, overdue, or without a due date.
    Due,
    Upcoming,
    Completed,
}

/// Bucket a single task, comparing whole calendar days only.
pub fn classify(task: &Task, today: NaiveDate) -> Urgency {
    if task.completed {
        return Urgency::Completed;
    }
    match task.due_date {
        Some(due) if due > today => Urgency::Upcoming,
        _ => Urgency::Due,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buckets<T> {
    pub due: Vec<T>,
    pub upcoming: Vec<T>,
    pub completed: Vec<T>,
}

impl<T> Default for Buckets<T> {
    fn default() -> Self {
        Self {
            due: Vec::new(),
            upcoming: Vec::new(),
            completed: Vec::new(),
        }
    }
}

impl<T> Buckets<T> {
    pub fn len(&self) -> usize {
        self.due.len() + self.upcoming.len() + self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Buckets<U> {
        Buckets {
            due: self.due.into_iter().map(&mut f).collect(),
            upcoming: self.upcoming.into_iter().map(&mut f).collect(),
            completed: self.completed.into_iter().map(&mut f).collect(),
        }
    }
}

/// Partition tasks into due, upcoming and completed, each in display order.
///
/// `now` is truncated to its calendar day in its own offset.
pub fn partition(tasks: Vec<Task>, now: &Timestamp) -> Buckets<Task> {
    partition_on(tasks, now.date_naive())
}

pub fn partition_on(tasks: Vec<Task>, today: NaiveDate) -> Buckets<Task> {
    let mut buckets = Buckets::default();
    for task in tasks {
        match classify(&task, today) {
            Urgency::Due => buckets.due.push(task),
            Urgency::Upcoming => buckets.upcoming.push(task),
            Urgency::Completed => buckets.completed.push(task),
        }
    }

    buckets.due.sort_by(by_due_date);
    buckets.upcoming.sort_by(by_due_date);
    buckets.completed.sort_by(by_completion_desc);
    buckets
}

/// Ascending due date, missing due dates last, then oldest created first.
fn by_due_date(a: &Task, b: &Task) -> Ordering {
    let due = match (a.due_date, b.due_date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    due.then_with(|| a.created_at.cmp(&b.created_at))
}

/// Most recently completed first; unknown completion sorts as oldest.
fn by_completion_desc(a: &Task, b: &Task) -> Ordering {
    match (a.completed_at, b.completed_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
