use anyhow::Result;
use cadence_core::repository::Repository;

use crate::cli::ShowCommand;
use crate::commands::Context;
use crate::util::resolve_task_id;
use crate::views::{print_json, table::display_task_detail};

pub async fn show_task(repo: &impl Repository, ctx: &Context, command: ShowCommand) -> Result<()> {
    let task_id = resolve_task_id(repo, ctx.user_id, &command.id).await?;
    let task = repo.get_task(ctx.user_id, task_id).await?;

    if command.json {
        print_json(&task)
    } else {
        display_task_detail(&task);
        Ok(())
    }
}
