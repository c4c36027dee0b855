use clap::{Parser, Subcommand};
use uuid::Uuid;

/// Cadence: a task tracker with recurring tasks and per-occurrence completion
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Add a new task
    Add(AddCommand),
    /// Show one task
    Show(ShowCommand),
    /// List tasks
    List(ListCommand),
    /// Edit a task, including switching it between one-off and recurring
    Edit(EditCommand),
    /// Delete a task
    Delete(DeleteCommand),
    /// Inspect and complete occurrences of a recurring task
    #[command(subcommand)]
    Occurrences(OccurrencesCommand),
    /// Everything due in a time window
    Agenda(AgendaCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct AddCommand {
    /// The title of the task
    pub title: String,
    /// The description of the task
    #[arg(short, long)]
    pub description: Option<String>,
    /// The due date; the first occurrence for recurring tasks
    #[arg(long)]
    pub due: Option<String>,
    /// The project of the task
    #[arg(short, long)]
    pub project: Option<Uuid>,
    /// Repeat every N units
    #[arg(long, requires = "unit")]
    pub every: Option<i64>,
    /// Repeat unit (day, week, month)
    #[arg(long, requires = "every")]
    pub unit: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ShowCommand {
    /// The ID (or unique prefix) of the task
    pub id: String,
    /// Print JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ListCommand {
    /// Only tasks of this project
    #[arg(short, long)]
    pub project: Option<Uuid>,
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct EditCommand {
    /// The ID (or unique prefix) of the task to edit
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, conflicts_with = "description")]
    pub description_clear: bool,

    /// New due date; moves the series anchor on recurring tasks
    #[arg(long)]
    pub due: Option<String>,
    #[arg(long, conflicts_with = "due")]
    pub due_clear: bool,

    /// Mark a one-off task as completed
    #[arg(long)]
    pub done: bool,
    /// Mark a one-off task as not completed
    #[arg(long, conflicts_with = "done")]
    pub undone: bool,

    /// Repeat every N units
    #[arg(long, requires = "unit")]
    pub every: Option<i64>,
    /// Repeat unit (day, week, month)
    #[arg(long, requires = "every")]
    pub unit: Option<String>,
    /// Turn a recurring task back into a one-off task
    #[arg(long, conflicts_with_all = ["every", "unit"])]
    pub recurrence_clear: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteCommand {
    /// The ID (or unique prefix) of the task to delete
    pub id: String,
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum OccurrencesCommand {
    /// List occurrences of a task in a window
    List(OccurrenceListCommand),
    /// Mark an occurrence as completed
    Done(OccurrenceToggleCommand),
    /// Mark an occurrence as not completed
    Undo(OccurrenceToggleCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct OccurrenceListCommand {
    /// The ID (or unique prefix) of the recurring task
    pub task: String,
    /// Start of the window (default: 30 days ago)
    #[arg(long)]
    pub from: Option<String>,
    /// End of the window (default: 60 days ahead)
    #[arg(long)]
    pub to: Option<String>,
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct OccurrenceToggleCommand {
    /// The ID (or unique prefix) of the recurring task
    pub task: String,
    /// The ID (or unique prefix) of the occurrence
    pub occurrence: String,
}

#[derive(Parser, Debug, Clone)]
pub struct AgendaCommand {
    /// Start of the window (default: 1 day ago)
    #[arg(long)]
    pub from: Option<String>,
    /// End of the window (default: 7 days ahead)
    #[arg(long)]
    pub to: Option<String>,
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}
