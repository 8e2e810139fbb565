//! Next-occurrence and snooze date arithmetic.
//!
//! Everything here is pure: the coordinator decides when to call it and
//! persists the result.

use chrono::{Datelike, NaiveDate};

use crate::error::{UpkeepError, UpkeepResult};
use crate::model::{NewTask, RescheduleBase, Task, Timestamp};
use crate::period::Period;

/// The date the next occurrence is counted from.
///
/// `completed_on` is the calendar day of the completion instant just
/// recorded. A `due` base without a prior due date falls back to it.
pub fn resolve_anchor(task: &Task, completed_on: NaiveDate) -> NaiveDate {
    match task.reschedule_base {
        RescheduleBase::Completed => completed_on,
        RescheduleBase::Due => task.due_date.unwrap_or(completed_on),
    }
}

/// Move `date` out of prohibited months, to the first day of the first
/// allowed month after it. Left untouched when every month is prohibited.
pub fn roll_past_prohibited(date: NaiveDate, prohibited_months: &[u32]) -> NaiveDate {
    if !prohibited_months.contains(&date.month()) {
        return date;
    }

    let (mut year, mut month) = (date.year(), date.month());
    for _ in 0..12 {
        if month == 12 {
            month = 1;
            year += 1;
        } else {
            month += 1;
        }
        if !prohibited_months.contains(&month) {
            return NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date);
        }
    }
    date
}

/// Due date of the occurrence that follows `task` once it has been completed.
pub fn next_due_date(task: &Task, period: Period, completed_on: NaiveDate) -> UpkeepResult<NaiveDate> {
    let anchor = resolve_anchor(task, completed_on);
    let next = period.add_to(anchor)?;
    Ok(roll_past_prohibited(next, &task.prohibited_months))
}

/// Build the next occurrence of a task that has just transitioned to completed.
///
/// Returns `None` for non-recurring tasks. The spawned task copies the
/// recurrence rule, months and constraints and starts incomplete.
pub fn spawn_next(completed: &Task, now: Timestamp) -> UpkeepResult<Option<Task>> {
    let Some(period) = completed.reschedule_period else {
        return Ok(None);
    };
    let completed_at = completed.completed_at.ok_or_else(|| {
        UpkeepError::invalid_state(format!(
            "task {} has no completion instant to reschedule from",
            completed.id
        ))
    })?;

    let due_date = next_due_date(completed, period, completed_at.date_naive())?;
    let draft = NewTask {
        completed: false,
        due_date: Some(due_date),
        ..NewTask::from(completed)
    };
    Ok(Some(draft.into_task(now)))
}

/// New due date for a snooze issued at `instant`. Anchored at the snooze day,
/// not at the prior due date.
pub fn snooze_due_date(task: &Task, period: Period, instant: Timestamp) -> UpkeepResult<NaiveDate> {
    if task.completed {
        return Err(UpkeepError::invalid_state(format!(
            "task {} is completed and cannot be snoozed",
            task.id
        )));
    }
    period.add_to(instant.date_naive())
}
