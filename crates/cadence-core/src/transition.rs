//! Normal/recurring transitions applied on task update.
//!
//! Planning is pure: [`Transition::plan`] inspects the stored task and the
//! requested update and picks exactly one of the four cases, and
//! [`Transition::patch`] derives the resulting column values. Side effects
//! on occurrence rows (anchor insert, reschedule purge) are carried out by
//! the repository inside the same transaction as the column write.

use chrono::{DateTime, Utc};

use crate::error::CoreError;
use crate::models::{Task, TaskMode, UpdateTaskData};
use crate::recurrence::RecurrenceRule;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Due date and completion live on the task itself.
    NormalToNormal,
    /// The anchor occurrence is created and the task's own due/completion
    /// are cleared.
    NormalToRecurring {
        rule: RecurrenceRule,
        anchor: DateTime<Utc>,
    },
    /// `reschedule` moves the anchor. Moving the anchor or changing the rule
    /// purges uncompleted occurrences at or after the anchor.
    RecurringToRecurring {
        rule: RecurrenceRule,
        reschedule: Option<DateTime<Utc>>,
    },
    /// The chosen date becomes the task's own due date. Occurrences stay as
    /// history.
    RecurringToNormal { due_at: Option<DateTime<Utc>> },
}

/// Column values of a task after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: String,
    pub description: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub repeat_every: Option<i64>,
    pub repeat_unit: Option<String>,
    pub recurrence_start_at: Option<DateTime<Utc>>,
    pub next_due_at: Option<DateTime<Utc>>,
}

impl Transition {
    pub fn plan(current: &Task, update: &UpdateTaskData) -> Result<Self, CoreError> {
        if matches!(&update.title, Some(title) if title.trim().is_empty()) {
            return Err(CoreError::Validation("title cannot be empty".to_string()));
        }

        let requested = if update.clear_recurrence {
            None
        } else {
            RecurrenceRule::from_input(update.repeat_every, update.repeat_unit.as_deref())?
        };

        let was_recurring = current.is_recurring();
        let will_be_recurring = !update.clear_recurrence && (was_recurring || requested.is_some());

        if update.completed.is_some() && (was_recurring || will_be_recurring) {
            return Err(CoreError::Validation(
                "cannot complete a recurring task template; complete an occurrence instead"
                    .to_string(),
            ));
        }

        let explicit_due = update.due_at.flatten();

        let transition = match (was_recurring, will_be_recurring, requested) {
            (false, false, _) | (false, true, None) => Transition::NormalToNormal,
            (false, true, Some(rule)) => {
                let anchor = requested_due(current, update).ok_or_else(|| {
                    CoreError::Validation("due_at is required to enable recurrence".to_string())
                })?;
                Transition::NormalToRecurring { rule, anchor }
            }
            (true, true, requested) => {
                let rule = match requested {
                    Some(rule) => rule,
                    None => current.recurrence_rule()?.ok_or_else(|| {
                        CoreError::InvalidRecurrenceRule(format!(
                            "task {} has an incomplete recurrence rule",
                            current.id
                        ))
                    })?,
                };
                Transition::RecurringToRecurring {
                    rule,
                    reschedule: explicit_due,
                }
            }
            (true, false, _) => Transition::RecurringToNormal {
                due_at: explicit_due
                    .or(current.next_due_at)
                    .or(current.recurrence_start_at)
                    .or_else(|| requested_due(current, update)),
            },
        };

        Ok(transition)
    }

    pub fn from_mode(&self) -> TaskMode {
        match self {
            Transition::NormalToNormal | Transition::NormalToRecurring { .. } => TaskMode::Normal,
            Transition::RecurringToRecurring { .. } | Transition::RecurringToNormal { .. } => {
                TaskMode::Recurring
            }
        }
    }

    pub fn to_mode(&self) -> TaskMode {
        match self {
            Transition::NormalToNormal | Transition::RecurringToNormal { .. } => TaskMode::Normal,
            Transition::NormalToRecurring { .. } | Transition::RecurringToRecurring { .. } => {
                TaskMode::Recurring
            }
        }
    }

    /// Computes the task's columns after this transition.
    pub fn patch(&self, current: &Task, update: &UpdateTaskData, now: DateTime<Utc>) -> TaskPatch {
        let title = update.title.clone().unwrap_or_else(|| current.title.clone());
        let description = update
            .description
            .clone()
            .unwrap_or_else(|| current.description.clone());

        match self {
            Transition::NormalToNormal => TaskPatch {
                title,
                description,
                due_at: requested_due(current, update),
                completed_at: match update.completed {
                    Some(true) => Some(now),
                    Some(false) => None,
                    None => current.completed_at,
                },
                repeat_every: None,
                repeat_unit: None,
                recurrence_start_at: None,
                next_due_at: None,
            },
            Transition::NormalToRecurring { rule, anchor } => {
                let (every, unit) = rule.to_columns();
                TaskPatch {
                    title,
                    description,
                    due_at: None,
                    completed_at: None,
                    repeat_every: Some(every),
                    repeat_unit: Some(unit),
                    recurrence_start_at: Some(*anchor),
                    next_due_at: None,
                }
            }
            Transition::RecurringToRecurring { rule, reschedule } => {
                let (every, unit) = rule.to_columns();
                TaskPatch {
                    title,
                    description,
                    due_at: None,
                    completed_at: None,
                    repeat_every: Some(every),
                    repeat_unit: Some(unit),
                    recurrence_start_at: reschedule.or(current.recurrence_start_at),
                    next_due_at: current.next_due_at,
                }
            }
            Transition::RecurringToNormal { due_at } => TaskPatch {
                title,
                description,
                due_at: *due_at,
                completed_at: current.completed_at,
                repeat_every: None,
                repeat_unit: None,
                recurrence_start_at: None,
                next_due_at: None,
            },
        }
    }
}

/// The task's own due date after applying the update's due change.
fn requested_due(current: &Task, update: &UpdateTaskData) -> Option<DateTime<Utc>> {
    match update.due_at {
        Some(due) => due,
        None => current.due_at,
    }
}
