use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::capture::TaskInput;
use crate::model::RescheduleBase;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "upkeep",
    version,
    about = "Household chores with due dates, recurrence and seasonal rules.",
    after_help = "Examples:\n  upkeep new-list Garden\n  upkeep add --list <LIST_ID> Clean gutters --due 2024-10-01 --every 6m --not-in 12,1,2\n  upkeep board <LIST_ID>\n  upkeep done <TASK_ID>\n  upkeep mcp --log debug"
)]
pub struct Cli {
    /// Override the data directory (defaults to platform-specific app dir)
    #[arg(long, value_name = "PATH", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Keep everything in memory for this invocation
    #[arg(long = "in-memory", global = true)]
    pub in_memory: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CliCommand {
    /// Show every task list (default command)
    Lists,
    /// Create a task list
    NewList(NameArgs),
    /// Rename a task list
    RenameList(RenameListArgs),
    /// Delete a task list and all of its tasks
    DeleteList(IdArgs),
    /// Add a task to a list
    Add(AddArgs),
    /// Show a list bucketed into due, upcoming and completed tasks
    Board(BoardArgs),
    /// Mark a task completed; recurring tasks get their next occurrence
    Done(DoneArgs),
    /// Mark a completed task as open again
    Reopen(IdArgs),
    /// Push an open task's due date out from today
    Snooze(SnoozeArgs),
    /// Delete one or more tasks by id
    Delete(DeleteArgs),
    /// Run the Model Context Protocol server over stdio
    Mcp(McpArgs),
}

#[derive(Args, Debug, Clone)]
pub struct NameArgs {
    #[arg(value_name = "NAME", required = true)]
    pub name: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct RenameListArgs {
    #[arg(value_name = "LIST_ID")]
    pub id: String,

    #[arg(value_name = "NAME", required = true)]
    pub name: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct IdArgs {
    #[arg(value_name = "ID")]
    pub id: String,
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// List the task belongs to
    #[arg(long, short = 'l', value_name = "LIST_ID")]
    pub list: String,

    /// Task title
    #[arg(value_name = "TITLE", required = true)]
    pub title: Vec<String>,

    /// Optional longer description
    #[arg(long)]
    pub description: Option<String>,

    /// Due date (ISO e.g. 2024-12-24, today, tomorrow, +3d, mon)
    #[arg(long = "due", value_name = "DATE")]
    pub due: Option<String>,

    /// Repeat after this period once completed (e.g. 3d, 2w, 1m)
    #[arg(long = "every", value_name = "PERIOD")]
    pub every: Option<String>,

    /// Count the next occurrence from the completion day or the due date
    #[arg(long = "from", value_enum)]
    pub from: Option<RescheduleBase>,

    /// Months (1-12) in which the task must not be done, comma-separated or repeated
    #[arg(long = "not-in", value_name = "MONTH", value_delimiter = ',', action = ArgAction::Append)]
    pub not_in: Vec<i64>,

    /// Free-text constraint shown as a badge (repeatable)
    #[arg(long = "constraint", action = ArgAction::Append)]
    pub constraint: Vec<String>,

    /// Record the task as already done
    #[arg(long)]
    pub done: bool,
}

#[derive(Args, Debug, Clone)]
pub struct BoardArgs {
    #[arg(value_name = "LIST_ID")]
    pub list: String,

    /// Evaluate as of this RFC3339 instant instead of now
    #[arg(long = "at", value_name = "TIMESTAMP")]
    pub at: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DoneArgs {
    #[arg(value_name = "ID")]
    pub id: String,

    /// Completion instant (RFC3339); defaults to now
    #[arg(long = "at", value_name = "TIMESTAMP")]
    pub at: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct SnoozeArgs {
    #[arg(value_name = "ID")]
    pub id: String,

    /// How far to push the due date (e.g. 3d, 2w, 1m)
    #[arg(value_name = "PERIOD")]
    pub period: String,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// One or more task ids to delete
    #[arg(value_name = "ID", required = true)]
    pub ids: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct McpArgs {
    /// Override the tracing filter for the MCP server (e.g. "info", "debug")
    #[arg(long = "log", value_name = "DIRECTIVE")]
    pub log_filter: Option<String>,
}

impl From<AddArgs> for TaskInput {
    fn from(args: AddArgs) -> Self {
        TaskInput {
            list_id: args.list,
            title: args.title.join(" "),
            description: args.description,
            completed: args.done,
            due: args.due,
            reschedule_period: args.every,
            reschedule_base: args.from,
            prohibited_months: args.not_in,
            constraints: args.constraint,
        }
    }
}
