use anyhow::Result;
use cadence_core::repository::Repository;

use crate::cli::ListCommand;
use crate::commands::Context;
use crate::views::{print_json, table::display_tasks};

pub async fn list_tasks(repo: &impl Repository, ctx: &Context, command: ListCommand) -> Result<()> {
    let tasks = repo.list_tasks(ctx.user_id, command.project).await?;

    if command.json {
        print_json(&tasks)
    } else {
        display_tasks(&tasks);
        Ok(())
    }
}
