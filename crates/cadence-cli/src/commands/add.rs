use anyhow::Result;
use cadence_core::models::NewTaskData;
use cadence_core::repository::Repository;
use owo_colors::{OwoColorize, Style};
use uuid::Uuid;

use crate::cli::AddCommand;
use crate::commands::Context;
use crate::parser::parse_optional_date;

pub async fn add_task(repo: &impl Repository, ctx: &Context, command: AddCommand) -> Result<()> {
    let due_at = parse_optional_date(command.due.as_deref())?;

    let data = NewTaskData {
        project_id: command
            .project
            .or(ctx.default_project)
            .unwrap_or_else(Uuid::nil),
        title: command.title,
        description: command.description,
        due_at,
        repeat_every: command.every,
        repeat_unit: command.unit,
    };

    let task = repo.add_task(ctx.user_id, data).await?;

    let success_style = Style::new().green().bold();
    let info_style = Style::new().blue();

    match task.recurrence_rule()? {
        Some(rule) => {
            println!(
                "{} Created recurring task: {}",
                "✓".style(success_style),
                task.title.bright_white().bold()
            );
            println!("  {} Task ID: {}", "→".style(info_style), task.id.to_string().yellow());
            println!("  {} Repeats {}", "→".style(info_style), rule);
            if let Some(next_due) = task.next_due_at {
                println!(
                    "  {} Next due: {}",
                    "→".style(info_style),
                    next_due.format("%Y-%m-%d %H:%M UTC")
                );
            }
        }
        None => {
            println!(
                "{} Created task: {}",
                "✓".style(success_style),
                task.title.bright_white().bold()
            );
            println!("  {} Task ID: {}", "→".style(info_style), task.id.to_string().yellow());
            if let Some(due) = task.due_at {
                println!(
                    "  {} Due: {}",
                    "→".style(info_style),
                    due.format("%Y-%m-%d %H:%M UTC")
                );
            }
        }
    }

    Ok(())
}
