use anyhow::Result;
use cadence_core::repository::Repository;
use chrono::Utc;
use owo_colors::{OwoColorize, Style};
use tracing::warn;

use crate::cli::{OccurrenceListCommand, OccurrenceToggleCommand, OccurrencesCommand};
use crate::commands::Context;
use crate::parser::parse_optional_date;
use crate::util::{resolve_occurrence_id, resolve_task_id};
use crate::views::{print_json, table::display_occurrences};

pub async fn occurrences_command(
    repo: &impl Repository,
    ctx: &Context,
    command: OccurrencesCommand,
) -> Result<()> {
    match command {
        OccurrencesCommand::List(cmd) => list_occurrences(repo, ctx, cmd).await,
        OccurrencesCommand::Done(cmd) => set_completed(repo, ctx, cmd, true).await,
        OccurrencesCommand::Undo(cmd) => set_completed(repo, ctx, cmd, false).await,
    }
}

async fn list_occurrences(
    repo: &impl Repository,
    ctx: &Context,
    command: OccurrenceListCommand,
) -> Result<()> {
    let task_id = resolve_task_id(repo, ctx.user_id, &command.task).await?;
    let from = parse_optional_date(command.from.as_deref())?;
    let to = parse_optional_date(command.to.as_deref())?;
    let (from, to) = ctx.materialization.occurrence_window(from, to, Utc::now());

    // The core listing does not generate, so extend first.
    if let Err(e) = repo.ensure_occurrences_up_to(ctx.user_id, task_id, to).await {
        warn!(%task_id, error = %e, "could not extend occurrences before listing");
    }

    let occurrences = repo.list_occurrences(ctx.user_id, task_id, from, to).await?;
    if command.json {
        print_json(&occurrences)
    } else {
        display_occurrences(&occurrences);
        Ok(())
    }
}

async fn set_completed(
    repo: &impl Repository,
    ctx: &Context,
    command: OccurrenceToggleCommand,
    completed: bool,
) -> Result<()> {
    let task_id = resolve_task_id(repo, ctx.user_id, &command.task).await?;
    let occurrence_id =
        resolve_occurrence_id(repo, ctx.user_id, task_id, &command.occurrence).await?;

    let occurrence = repo
        .set_occurrence_completed(ctx.user_id, task_id, occurrence_id, completed)
        .await?;

    let success_style = Style::new().green().bold();
    let info_style = Style::new().blue();
    let verb = if completed { "Completed" } else { "Reopened" };
    println!(
        "{} {} occurrence due {}",
        "✓".style(success_style),
        verb,
        occurrence.due_at.format("%Y-%m-%d %H:%M UTC")
    );

    let horizon = ctx.materialization.default_horizon(Utc::now());
    match repo
        .ensure_occurrences_up_to(ctx.user_id, task_id, horizon)
        .await
    {
        Ok(summary) => match summary.next_due_at {
            Some(next) => println!(
                "  {} Next due: {}",
                "→".style(info_style),
                next.format("%Y-%m-%d %H:%M UTC")
            ),
            None => println!("  {} Nothing pending", "→".style(info_style)),
        },
        Err(e) => warn!(%task_id, error = %e, "next-due refresh after completion failed"),
    }

    Ok(())
}
