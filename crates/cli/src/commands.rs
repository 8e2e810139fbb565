use std::fmt;
use std::io::Write;

use anyhow::{anyhow, Context, Result};
use chrono::DateTime;
use upkeep_core::services::{BoardEntry, BoardSnapshot};

use crate::capture::TaskInput;
use crate::cli::{BoardArgs, CliCommand, DeleteArgs, DoneArgs, SnoozeArgs};
use crate::model::{DeleteResult, SnoozeRequest, Task, Timestamp};
use crate::TasksService;

pub fn execute<W: Write>(service: &TasksService, command: CliCommand, mut writer: W) -> Result<()> {
    tracing::debug!(?command, storage = service.storage_label().as_str(), "executing");
    match command {
        CliCommand::Lists => handle_lists(service, &mut writer),
        CliCommand::NewList(args) => {
            let list = service.create_list(&args.name.join(" "))?;
            writeln!(writer, "Created list {} ({})", list.name, list.id)?;
            Ok(())
        }
        CliCommand::RenameList(args) => {
            match service.rename_list(&args.id, &args.name.join(" "))? {
                Some(list) => writeln!(writer, "Renamed list {} to {}", list.id, list.name)?,
                None => writeln!(writer, "List not found: {}", args.id)?,
            }
            Ok(())
        }
        CliCommand::DeleteList(args) => {
            let result = service.delete_list(&args.id)?;
            if result.deleted {
                writeln!(writer, "Deleted list {} and its tasks", result.id)?;
            } else {
                writeln!(writer, "List not found: {}", result.id)?;
            }
            Ok(())
        }
        CliCommand::Add(args) => {
            let task = service.create_task(TaskInput::from(args))?;
            writeln!(writer, "Added {} ({})", task.title, task.id)?;
            Ok(())
        }
        CliCommand::Board(args) => handle_board(service, &args, &mut writer),
        CliCommand::Done(args) => handle_done(service, &args, &mut writer),
        CliCommand::Reopen(args) => {
            let outcome = service.set_completed(&args.id, false, None)?;
            writeln!(writer, "Reopened {}", outcome.task.title)?;
            Ok(())
        }
        CliCommand::Snooze(args) => handle_snooze(service, &args, &mut writer),
        CliCommand::Delete(args) => handle_delete(service, &args, &mut writer),
        CliCommand::Mcp(_) => Err(anyhow!("launch the MCP server directly")),
    }
}

fn handle_lists<W: Write>(service: &TasksService, mut writer: W) -> Result<()> {
    let lists = service.list_lists()?;
    if lists.is_empty() {
        writeln!(writer, "No lists yet. Create one with `upkeep new-list <NAME>`")?;
        return Ok(());
    }
    for list in lists {
        writeln!(writer, "{}  {}", list.id, list.name)?;
    }
    Ok(())
}

fn handle_board<W: Write>(service: &TasksService, args: &BoardArgs, mut writer: W) -> Result<()> {
    let now = match &args.at {
        Some(raw) => parse_instant(raw)?,
        None => service.now(),
    };
    let board = service.board(&args.list, &now)?;
    write_board(&board, &mut writer)
}

fn handle_done<W: Write>(service: &TasksService, args: &DoneArgs, mut writer: W) -> Result<()> {
    let at = args.at.as_deref().map(parse_instant).transpose()?;
    let outcome = service.set_completed(&args.id, true, at)?;
    writeln!(writer, "Completed {}", outcome.task.title)?;
    if let Some(next) = &outcome.created_task {
        writeln!(
            writer,
            "Next occurrence {} due {}",
            next.id,
            DueLabel(next.due_date)
        )?;
    }
    Ok(())
}

fn handle_snooze<W: Write>(service: &TasksService, args: &SnoozeArgs, mut writer: W) -> Result<()> {
    let task = service.snooze_task(
        &args.id,
        SnoozeRequest {
            period: args.period.clone(),
            updated_at: None,
        },
    )?;
    writeln!(writer, "Snoozed {} until {}", task.title, DueLabel(task.due_date))?;
    Ok(())
}

fn handle_delete<W: Write>(service: &TasksService, args: &DeleteArgs, mut writer: W) -> Result<()> {
    let results = service.delete_tasks(&args.ids)?;
    let summary = DeleteSummary::from_results(&results);
    summary.write_to(&mut writer)?;
    Ok(())
}

fn parse_instant(raw: &str) -> Result<Timestamp> {
    DateTime::parse_from_rfc3339(raw.trim())
        .with_context(|| format!("'{}' is not an RFC3339 timestamp", raw))
}

fn write_board<W: Write>(board: &BoardSnapshot, mut writer: W) -> Result<()> {
    writeln!(writer, "{} ({})", board.list.name, board.today)?;
    for (label, entries) in [
        ("Due", &board.due),
        ("Upcoming", &board.upcoming),
        ("Completed", &board.completed),
    ] {
        writeln!(writer, "{} [{}]", label, entries.len())?;
        for entry in entries {
            writeln!(writer, "  {}", EntryLine(entry))?;
        }
    }
    Ok(())
}

struct DueLabel(Option<chrono::NaiveDate>);

impl fmt::Display for DueLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(date) => write!(f, "{}", date),
            None => write!(f, "anytime"),
        }
    }
}

struct EntryLine<'a>(&'a BoardEntry);

impl fmt::Display for EntryLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let task: &Task = &self.0.task;
        write!(f, "{}  {}", task.id, task.title)?;
        match (task.completed, task.completed_at) {
            (true, Some(at)) => write!(f, "  done {}", at.date_naive())?,
            _ => write!(f, "  due {}", DueLabel(task.due_date))?,
        }
        if let Some(period) = task.reschedule_period {
            write!(f, "  every {} from {}", period, task.reschedule_base)?;
        }
        for warning in &self.0.warnings {
            write!(f, "  [{}]", warning.message)?;
        }
        Ok(())
    }
}

struct DeleteSummary {
    deleted: usize,
    missing: Vec<String>,
}

impl DeleteSummary {
    fn from_results(results: &[DeleteResult]) -> Self {
        let mut deleted = 0usize;
        let mut missing = Vec::new();
        for result in results {
            if result.deleted {
                deleted += 1;
            } else {
                missing.push(result.id.clone());
            }
        }
        Self { deleted, missing }
    }

    fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writeln!(writer, "{}", SummaryLine::deleted(self.deleted))?;
        if !self.missing.is_empty() {
            writeln!(writer, "Not found: {}", self.missing.join(", "))?;
        }
        Ok(())
    }
}

enum SummaryLine {
    Deleted(usize),
    NoneDeleted,
}

impl SummaryLine {
    fn deleted(count: usize) -> Self {
        if count > 0 {
            SummaryLine::Deleted(count)
        } else {
            SummaryLine::NoneDeleted
        }
    }
}

impl fmt::Display for SummaryLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryLine::Deleted(count) => {
                write!(
                    f,
                    "Deleted {} task{}",
                    count,
                    if *count == 1 { "" } else { "s" }
                )
            }
            SummaryLine::NoneDeleted => write!(f, "No tasks deleted"),
        }
    }
}
