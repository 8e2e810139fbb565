//! Warning badges derived from prohibited months and constraint tags.

use chrono::{Datelike, Month, NaiveDate};
use serde::Serialize;

use crate::model::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    NotAllowed,
    DoBefore,
    Constraint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    fn not_allowed(month: u32) -> Self {
        Self {
            kind: WarningKind::NotAllowed,
            message: format!("Not allowed in {}", month_name(month)),
        }
    }

    fn do_before(month: u32) -> Self {
        Self {
            kind: WarningKind::DoBefore,
            message: format!("Do before {}", month_name(month)),
        }
    }

    fn constraint(text: &str) -> Self {
        Self {
            kind: WarningKind::Constraint,
            message: text.to_string(),
        }
    }
}

pub fn month_name(month: u32) -> &'static str {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name())
        .unwrap_or("?")
}

/// Facts a month rule looks at.
struct MonthContext<'a> {
    prohibited: &'a [u32],
    current_month: u32,
    next_month: u32,
    due_date: Option<NaiveDate>,
    /// No due date, due on or before today, or due within the current month.
    due_now: bool,
}

type MonthRule = fn(&MonthContext<'_>) -> Option<Warning>;

/// Evaluated top to bottom; the first match is the only month warning.
const MONTH_RULES: [MonthRule; 3] = [
    current_month_prohibited,
    next_month_prohibited,
    due_month_prohibited,
];

fn current_month_prohibited(ctx: &MonthContext<'_>) -> Option<Warning> {
    (ctx.due_now && ctx.prohibited.contains(&ctx.current_month))
        .then(|| Warning::not_allowed(ctx.current_month))
}

fn next_month_prohibited(ctx: &MonthContext<'_>) -> Option<Warning> {
    (ctx.due_now && ctx.prohibited.contains(&ctx.next_month))
        .then(|| Warning::do_before(ctx.next_month))
}

fn due_month_prohibited(ctx: &MonthContext<'_>) -> Option<Warning> {
    let month = ctx.due_date?.month();
    ctx.prohibited
        .contains(&month)
        .then(|| Warning::not_allowed(month))
}

/// At most one month warning, followed by one badge per constraint sorted
/// lexicographically.
pub fn evaluate(task: &Task, today: NaiveDate) -> Vec<Warning> {
    let mut warnings = Vec::new();
    if let Some(warning) = month_warning(task, today) {
        warnings.push(warning);
    }

    let mut constraints: Vec<&String> = task.constraints.iter().collect();
    constraints.sort();
    warnings.extend(constraints.into_iter().map(|text| Warning::constraint(text)));
    warnings
}

pub fn month_warning(task: &Task, today: NaiveDate) -> Option<Warning> {
    if task.prohibited_months.is_empty() {
        return None;
    }

    let current_month = today.month();
    let next_month = if current_month == 12 { 1 } else { current_month + 1 };
    let due_now = match task.due_date {
        None => true,
        Some(due) => {
            due <= today || (due.year() == today.year() && due.month() == current_month)
        }
    };

    let ctx = MonthContext {
        prohibited: &task.prohibited_months,
        current_month,
        next_month,
        due_date: task.due_date,
        due_now,
    };
    MONTH_RULES.iter().find_map(|rule| rule(&ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewTask, RescheduleBase, Timestamp};
    use chrono::DateTime;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task(months: Vec<u32>, due: Option<NaiveDate>, constraints: Vec<&str>) -> Task {
        let now: Timestamp = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap();
        NewTask {
            list_id: "yard".into(),
            title: "Prune roses".into(),
            description: None,
            completed: false,
            due_date: due,
            reschedule_period: None,
            reschedule_base: RescheduleBase::Completed,
            prohibited_months: months,
            constraints: constraints.into_iter().map(String::from).collect(),
        }
        .into_task(now)
    }

    fn messages(warnings: &[Warning]) -> Vec<&str> {
        warnings.iter().map(|w| w.message.as_str()).collect()
    }

    #[test]
    fn undated_task_in_prohibited_month() {
        let t = task(vec![6], None, vec![]);
        assert_eq!(
            messages(&evaluate(&t, date(2024, 6, 10))),
            vec!["Not allowed in June"]
        );
        assert_eq!(
            messages(&evaluate(&t, date(2024, 5, 10))),
            vec!["Do before June"]
        );
        assert!(evaluate(&t, date(2024, 8, 10)).is_empty());
    }

    #[rstest]
    // Overdue task: current month wins over next month.
    #[case(vec![6, 7], Some(date(2024, 5, 1)), date(2024, 6, 10), Some("Not allowed in June"))]
    // Due later this month counts as due now.
    #[case(vec![7], Some(date(2024, 6, 28)), date(2024, 6, 10), Some("Do before July"))]
    // Due months away: next-month rule does not fire, due-month rule does.
    #[case(vec![7, 9], Some(date(2024, 9, 3)), date(2024, 6, 10), Some("Not allowed in September"))]
    #[case(vec![7], Some(date(2024, 9, 3)), date(2024, 6, 10), None)]
    // December wraps to January.
    #[case(vec![1], None, date(2024, 12, 5), Some("Do before January"))]
    // Same month number in a later year is not the current month.
    #[case(vec![6], Some(date(2025, 6, 2)), date(2024, 6, 10), Some("Not allowed in June"))]
    #[case(vec![], None, date(2024, 6, 10), None)]
    fn month_rules_follow_precedence(
        #[case] months: Vec<u32>,
        #[case] due: Option<NaiveDate>,
        #[case] today: NaiveDate,
        #[case] expected: Option<&str>,
    ) {
        let t = task(months, due, vec![]);
        let warning = month_warning(&t, today);
        assert_eq!(warning.as_ref().map(|w| w.message.as_str()), expected);
    }

    #[test]
    fn future_due_in_prohibited_month_is_flagged_as_not_allowed() {
        let t = task(vec![9], Some(date(2024, 9, 3)), vec![]);
        let warning = month_warning(&t, date(2024, 6, 10)).unwrap();
        assert_eq!(warning.kind, WarningKind::NotAllowed);
    }

    #[test]
    fn constraints_render_sorted_after_month_warning() {
        let t = task(
            vec![6],
            None,
            vec!["needs ladder", "dry weather", "before noon"],
        );
        let warnings = evaluate(&t, date(2024, 6, 10));
        assert_eq!(
            messages(&warnings),
            vec![
                "Not allowed in June",
                "before noon",
                "dry weather",
                "needs ladder"
            ]
        );
        assert!(warnings[1..]
            .iter()
            .all(|w| w.kind == WarningKind::Constraint));
        // Stored order is untouched.
        assert_eq!(t.constraints[0], "needs ladder");
    }

    #[test]
    fn month_names() {
        assert_eq!(month_name(1), "January");
        assert_eq!(month_name(12), "December");
        assert_eq!(month_name(13), "?");
    }
}
