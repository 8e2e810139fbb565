use std::collections::HashSet;

use chrono::{prelude::*, Days};

use crate::capture::TaskInput;
use crate::error::{UpkeepError, UpkeepResult};
use crate::model::NewTask;
use crate::period::Period;

const MAX_TITLE_CHARS: usize = 200;
const MAX_DESCRIPTION_CHARS: usize = 1000;
const MAX_LIST_NAME_CHARS: usize = 200;

pub fn prepare_new_task(input: &TaskInput, today: NaiveDate) -> UpkeepResult<NewTask> {
    input.require_title()?;

    let list_id = input.list_id.trim().to_string();
    if list_id.is_empty() {
        return Err(UpkeepError::validation("Task must belong to a list"));
    }

    let due_date = match &input.due {
        Some(spec) if !spec.trim().is_empty() => Some(parse_due_spec(spec, today)?),
        _ => None,
    };

    Ok(NewTask {
        list_id,
        title: normalize_title(&input.title)?,
        description: normalize_description(input.description.as_deref())?,
        completed: input.completed,
        due_date,
        reschedule_period: Period::parse_optional(input.reschedule_period.as_deref())?,
        reschedule_base: input.reschedule_base.unwrap_or_default(),
        prohibited_months: normalize_months(&input.prohibited_months)?,
        constraints: normalize_constraints(&input.constraints),
    })
}

pub fn normalize_title(raw: &str) -> UpkeepResult<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(UpkeepError::validation("Task title cannot be empty"));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(UpkeepError::validation(format!(
            "Task title is longer than {} characters",
            MAX_TITLE_CHARS
        )));
    }
    Ok(title.to_string())
}

/// Empty descriptions collapse to `None`.
pub fn normalize_description(raw: Option<&str>) -> UpkeepResult<Option<String>> {
    let Some(text) = raw.map(str::trim).filter(|text| !text.is_empty()) else {
        return Ok(None);
    };
    if text.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(UpkeepError::validation(format!(
            "Task description is longer than {} characters",
            MAX_DESCRIPTION_CHARS
        )));
    }
    Ok(Some(text.to_string()))
}

pub fn normalize_list_name(raw: &str) -> UpkeepResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(UpkeepError::validation("List name cannot be empty"));
    }
    if name.chars().count() > MAX_LIST_NAME_CHARS {
        return Err(UpkeepError::validation(format!(
            "List name is longer than {} characters",
            MAX_LIST_NAME_CHARS
        )));
    }
    Ok(name.to_string())
}

/// Validate month numbers and collapse them into a sorted set.
pub fn normalize_months(values: &[i64]) -> UpkeepResult<Vec<u32>> {
    let mut months = Vec::with_capacity(values.len());
    for &value in values {
        if !(1..=12).contains(&value) {
            return Err(UpkeepError::validation(format!(
                "Month {} is out of range: expected 1-12",
                value
            )));
        }
        months.push(value as u32);
    }
    months.sort_unstable();
    months.dedup();
    Ok(months)
}

pub fn normalize_constraints(values: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for value in values {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_string()) {
            result.push(trimmed.to_string());
        }
    }
    result
}

/// Resolve a due date specification relative to `today`.
pub fn parse_due_spec(spec: &str, today: NaiveDate) -> UpkeepResult<NaiveDate> {
    let trimmed = spec.trim();
    if trimmed.is_empty() {
        return Err(UpkeepError::validation("Date specification cannot be empty"));
    }

    let lower = trimmed.to_ascii_lowercase();
    match lower.as_str() {
        "today" | "now" => return Ok(today),
        "tomorrow" => {
            return today
                .checked_add_days(Days::new(1))
                .ok_or_else(|| UpkeepError::validation("Date out of range"));
        }
        _ => {}
    }

    if let Some(relative) = lower.strip_prefix('+') {
        return Period::parse(relative)?.add_to(today);
    }

    if let Some(weekday) = parse_weekday(&lower) {
        let mut days_ahead = (weekday.num_days_from_monday() as i64
            - today.weekday().num_days_from_monday() as i64)
            .rem_euclid(7);
        if days_ahead == 0 {
            days_ahead = 7;
        }
        return today
            .checked_add_days(Days::new(days_ahead as u64))
            .ok_or_else(|| UpkeepError::validation("Date out of range"));
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.date_naive());
    }

    Err(UpkeepError::validation(format!(
        "Unrecognized date specification '{}'. Try YYYY-MM-DD, today, tomorrow, +3d, mon",
        spec
    )))
}

fn parse_weekday(label: &str) -> Option<Weekday> {
    match label {
        "mon" | "monday" => Some(Weekday::Mon),
        "tue" | "tuesday" => Some(Weekday::Tue),
        "wed" | "wednesday" => Some(Weekday::Wed),
        "thu" | "thursday" => Some(Weekday::Thu),
        "fri" | "friday" => Some(Weekday::Fri),
        "sat" | "saturday" => Some(Weekday::Sat),
        "sun" | "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RescheduleBase;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn prepares_recurring_task_with_defaults() {
        let input = TaskInput {
            list_id: "kitchen".into(),
            title: "  Clean oven  ".into(),
            description: Some("  ".into()),
            due: Some("+1w".into()),
            reschedule_period: Some("1M".into()),
            prohibited_months: vec![12, 6, 6],
            constraints: vec!["needs ventilation".into(), " ".into(), "needs ventilation".into()],
            ..TaskInput::default()
        };

        let task = prepare_new_task(&input, date(2024, 6, 15)).unwrap();
        assert_eq!(task.title, "Clean oven");
        assert_eq!(task.description, None);
        assert_eq!(task.due_date, Some(date(2024, 6, 22)));
        assert_eq!(task.reschedule_period.unwrap().to_string(), "1m");
        assert_eq!(task.reschedule_base, RescheduleBase::Completed);
        assert_eq!(task.prohibited_months, vec![6, 12]);
        assert_eq!(task.constraints, vec!["needs ventilation".to_string()]);
    }

    #[test]
    fn rejects_bad_input_before_storage() {
        let today = date(2024, 6, 15);
        let mut input = TaskInput::new("kitchen", "");
        assert!(matches!(
            prepare_new_task(&input, today),
            Err(UpkeepError::Validation(_))
        ));

        input.title = "Sweep".into();
        input.prohibited_months = vec![13];
        assert!(matches!(
            prepare_new_task(&input, today),
            Err(UpkeepError::Validation(_))
        ));

        input.prohibited_months = vec![];
        input.reschedule_period = Some("fortnightly".into());
        assert!(matches!(
            prepare_new_task(&input, today),
            Err(UpkeepError::InvalidPeriod(_))
        ));

        input.reschedule_period = None;
        input.title = "x".repeat(201);
        assert!(matches!(
            prepare_new_task(&input, today),
            Err(UpkeepError::Validation(_))
        ));
    }

    #[rstest]
    #[case("today", date(2024, 6, 15))]
    #[case("tomorrow", date(2024, 6, 16))]
    #[case("+3d", date(2024, 6, 18))]
    #[case("+1m", date(2024, 7, 15))]
    #[case("mon", date(2024, 6, 17))]
    #[case("saturday", date(2024, 6, 22))]
    #[case("2024-12-24", date(2024, 12, 24))]
    #[case("2024-07-01T23:30:00-05:00", date(2024, 7, 1))]
    fn parses_due_specs(#[case] spec: &str, #[case] expected: NaiveDate) {
        // 2024-06-15 is a Saturday.
        assert_eq!(parse_due_spec(spec, date(2024, 6, 15)).unwrap(), expected);
    }

    #[test]
    fn unknown_due_spec_is_a_validation_error() {
        assert!(matches!(
            parse_due_spec("someday", date(2024, 6, 15)),
            Err(UpkeepError::Validation(_))
        ));
    }

    #[test]
    fn list_names_are_trimmed() {
        assert_eq!(normalize_list_name("  Garden ").unwrap(), "Garden");
        assert!(normalize_list_name("   ").is_err());
    }
}
