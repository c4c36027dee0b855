use anyhow::Result;
use cadence_core::repository::Repository;
use owo_colors::{OwoColorize, Style};
use uuid::Uuid;

use crate::commands::Context;

pub async fn delete_task(repo: &impl Repository, ctx: &Context, task_id: Uuid) -> Result<()> {
    repo.delete_task(ctx.user_id, task_id).await?;
    println!(
        "{} Deleted task {}",
        "✓".style(Style::new().green().bold()),
        task_id.to_string().yellow()
    );
    Ok(())
}
