use anyhow::Result;
use cadence_core::repository::Repository;

use crate::cli::AgendaCommand;
use crate::commands::Context;
use crate::parser::parse_optional_date;
use crate::views::{print_json, table::display_agenda};

pub async fn show_agenda(repo: &impl Repository, ctx: &Context, command: AgendaCommand) -> Result<()> {
    let from = parse_optional_date(command.from.as_deref())?;
    let to = parse_optional_date(command.to.as_deref())?;

    let items = repo.agenda(ctx.user_id, from, to).await?;
    if command.json {
        print_json(&items)
    } else {
        display_agenda(&items);
        Ok(())
    }
}
