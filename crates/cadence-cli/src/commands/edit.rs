use anyhow::{anyhow, Result};
use cadence_core::error::CoreError;
use cadence_core::models::{TaskMode, UpdateTaskData};
use cadence_core::repository::Repository;
use owo_colors::{OwoColorize, Style};

use crate::cli::EditCommand;
use crate::commands::Context;
use crate::parser::parse_date;
use crate::util::resolve_task_id;

/// Maps edit flags onto a partial update. `None` when no flag was given.
pub fn build_update(command: &EditCommand) -> Result<Option<UpdateTaskData>> {
    let description = if command.description_clear {
        Some(None)
    } else {
        command.description.clone().map(Some)
    };

    let due_at = if command.due_clear {
        Some(None)
    } else {
        command.due.as_deref().map(parse_date).transpose()?.map(Some)
    };

    let completed = match (command.done, command.undone) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    };

    let data = UpdateTaskData {
        title: command.title.clone(),
        description,
        due_at,
        completed,
        repeat_every: command.every,
        repeat_unit: command.unit.clone(),
        clear_recurrence: command.recurrence_clear,
    };

    let untouched = data.title.is_none()
        && data.description.is_none()
        && data.due_at.is_none()
        && data.completed.is_none()
        && data.repeat_every.is_none()
        && data.repeat_unit.is_none()
        && !data.clear_recurrence;

    Ok((!untouched).then_some(data))
}

pub async fn edit_task(repo: &impl Repository, ctx: &Context, command: EditCommand) -> Result<()> {
    let Some(data) = build_update(&command)? else {
        return Err(anyhow!(CoreError::Validation(
            "Nothing to update. Pass at least one field to change.".to_string()
        )));
    };

    let task_id = resolve_task_id(repo, ctx.user_id, &command.id).await?;
    let before = repo
        .find_task(ctx.user_id, task_id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("task {}", task_id)))?;

    let task = repo.update_task(ctx.user_id, task_id, data).await?;

    let success_style = Style::new().green().bold();
    let info_style = Style::new().blue();
    println!(
        "{} Updated task: {}",
        "✓".style(success_style),
        task.title.bright_white().bold()
    );

    match (before.mode(), task.mode()) {
        (TaskMode::Normal, TaskMode::Recurring) => {
            if let Some(rule) = task.recurrence_rule()? {
                println!("  {} Now repeats {}", "→".style(info_style), rule);
            }
        }
        (TaskMode::Recurring, TaskMode::Normal) => {
            println!("  {} Now a one-off task", "→".style(info_style));
        }
        _ => {}
    }
    if let Some(due) = task.effective_due_at() {
        println!(
            "  {} Due: {}",
            "→".style(info_style),
            due.format("%Y-%m-%d %H:%M UTC")
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn parse_edit(args: &[&str]) -> EditCommand {
        let mut full = vec!["cadence", "edit", "abcd"];
        full.extend_from_slice(args);
        match Cli::parse_from(full).command {
            Commands::Edit(cmd) => cmd,
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_no_flags_is_no_update() {
        assert!(build_update(&parse_edit(&[])).unwrap().is_none());
    }

    #[test]
    fn test_clear_flags() {
        let data = build_update(&parse_edit(&["--due-clear", "--description-clear"]))
            .unwrap()
            .unwrap();
        assert_eq!(data.due_at, Some(None));
        assert_eq!(data.description, Some(None));
    }

    #[test]
    fn test_rule_and_completion_flags() {
        let data = build_update(&parse_edit(&["--every", "2", "--unit", "weeks", "--undone"]))
            .unwrap()
            .unwrap();
        assert_eq!(data.repeat_every, Some(2));
        assert_eq!(data.repeat_unit.as_deref(), Some("weeks"));
        assert_eq!(data.completed, Some(false));
        assert!(!data.clear_recurrence);
    }

    #[test]
    fn test_exact_due() {
        let data = build_update(&parse_edit(&["--due", "2100-01-04T09:00:00Z"]))
            .unwrap()
            .unwrap();
        assert!(matches!(data.due_at, Some(Some(_))));
    }
}
