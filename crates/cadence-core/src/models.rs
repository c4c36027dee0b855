use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::error::CoreError;
use crate::recurrence::RecurrenceRule;

/// Unit of a fixed recurrence cadence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RepeatUnit {
    Day,
    Week,
    Month,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid repeat unit: {0}")]
pub struct ParseRepeatUnitError(String);

impl FromStr for RepeatUnit {
    type Err = ParseRepeatUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" | "days" => Ok(RepeatUnit::Day),
            "week" | "weeks" => Ok(RepeatUnit::Week),
            "month" | "months" => Ok(RepeatUnit::Month),
            _ => Err(ParseRepeatUnitError(s.to_string())),
        }
    }
}

impl std::fmt::Display for RepeatUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepeatUnit::Day => write!(f, "day"),
            RepeatUnit::Week => write!(f, "week"),
            RepeatUnit::Month => write!(f, "month"),
        }
    }
}

/// Whether a task is a one-off task or a recurring template.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskMode {
    Normal,
    Recurring,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub user_id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Authoritative only for normal tasks; always NULL on recurring templates.
    pub due_at: Option<DateTime<Utc>>,
    /// Authoritative only for normal tasks; always NULL on recurring templates.
    pub completed_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub repeat_every: Option<i64>,
    /// Stored as text and parsed on use, so a bad value surfaces as
    /// `CoreError::InvalidRecurrenceRule` instead of a decode failure.
    pub repeat_unit: Option<String>,
    /// Anchor of the series.
    pub recurrence_start_at: Option<DateTime<Utc>>,
    /// Earliest incomplete occurrence at or after the last refresh.
    pub next_due_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Task {
    fn default() -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id: Uuid::nil(),
            project_id: Uuid::nil(),
            title: "".to_string(),
            description: None,
            due_at: None,
            completed_at: None,
            deleted_at: None,
            repeat_every: None,
            repeat_unit: None,
            recurrence_start_at: None,
            next_due_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

impl Task {
    /// A task is recurring when both rule columns are set.
    pub fn is_recurring(&self) -> bool {
        self.repeat_every.is_some() && self.repeat_unit.is_some()
    }

    pub fn mode(&self) -> TaskMode {
        if self.is_recurring() {
            TaskMode::Recurring
        } else {
            TaskMode::Normal
        }
    }

    /// Parses the stored rule. `Ok(None)` for normal tasks.
    pub fn recurrence_rule(&self) -> Result<Option<RecurrenceRule>, CoreError> {
        match (self.repeat_every, self.repeat_unit.as_deref()) {
            (Some(every), Some(unit)) => RecurrenceRule::parse(every, unit).map(Some),
            _ => Ok(None),
        }
    }

    /// The date a client should show as "due": the next occurrence for
    /// recurring templates, the task's own due date otherwise.
    pub fn effective_due_at(&self) -> Option<DateTime<Utc>> {
        if self.is_recurring() {
            self.next_due_at
        } else {
            self.due_at
        }
    }
}

/// One concrete scheduled instance of a recurring task.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct Occurrence {
    pub id: Uuid,
    pub user_id: Uuid,
    pub task_id: Uuid,
    pub due_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Occurrence {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewTaskData {
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// For recurring tasks this is the anchor of the series and is required.
    pub due_at: Option<DateTime<Utc>>,
    pub repeat_every: Option<i64>,
    pub repeat_unit: Option<String>,
}

/// Partial update of a task. `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default)]
pub struct UpdateTaskData {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    /// On a recurring template a new date moves the anchor.
    pub due_at: Option<Option<DateTime<Utc>>>,
    /// Rejected while the task is, or becomes, a recurring template.
    pub completed: Option<bool>,
    /// Must be given together with `repeat_unit`.
    pub repeat_every: Option<i64>,
    pub repeat_unit: Option<String>,
    /// Demotes a recurring template to a normal task. Wins over `repeat_*`.
    pub clear_recurrence: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AgendaItemKind {
    /// A normal task's own due date.
    Task,
    /// An occurrence of a recurring task.
    Occurrence,
}

/// One row of the combined due-items view.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct AgendaItem {
    pub kind: AgendaItemKind,
    pub task_id: Uuid,
    pub occurrence_id: Option<Uuid>,
    pub project_id: Uuid,
    pub title: String,
    pub due_at: DateTime<Utc>,
}

/// Outcome of one `ensure_occurrences_up_to` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializationSummary {
    /// Rows actually inserted; conflicts on (task, due) are not counted.
    pub occurrences_created: usize,
    /// The refreshed next-due cache, `None` when the refresh failed or
    /// nothing is pending.
    pub next_due_at: Option<DateTime<Utc>>,
}
