use cadence_core::db;
use cadence_core::deadline::with_deadline;
use cadence_core::error::CoreError;
use cadence_core::recurrence::MaterializationManager;
use cadence_core::repository::{Repository, SqliteRepository};
use clap::Parser;
use dialoguer::Confirm;
use owo_colors::{OwoColorize, Style};
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};
use util::resolve_task_id;

mod cli;
mod commands;
mod config;
mod parser;
mod util;
mod views;

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = cli::Cli::parse();

    let config = match config::Config::new() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} Invalid configuration: {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };
    debug!(database = %config.database_path, user_id = %config.user_id, "configuration loaded");

    let db_pool = match db::establish_connection(&config.database_path).await {
        Ok(pool) => pool,
        Err(e) => {
            handle_error(e.into());
            std::process::exit(1);
        }
    };
    let repository =
        SqliteRepository::new(db_pool, MaterializationManager::new(config.materialization()));
    let ctx = commands::Context::from_config(&config);
    let timeout = config.operation_timeout();

    let result = match cli.command {
        cli::Commands::Add(command) => {
            with_deadline(timeout, commands::add::add_task(&repository, &ctx, command)).await
        }
        cli::Commands::Show(command) => {
            with_deadline(timeout, commands::show::show_task(&repository, &ctx, command)).await
        }
        cli::Commands::List(command) => {
            with_deadline(timeout, commands::list::list_tasks(&repository, &ctx, command)).await
        }
        cli::Commands::Edit(command) => {
            with_deadline(timeout, commands::edit::edit_task(&repository, &ctx, command)).await
        }
        cli::Commands::Delete(command) => {
            // The prompt runs outside any deadline.
            match with_deadline(timeout, confirm_target(&repository, &ctx, &command.id)).await {
                Ok((task_id, title)) => {
                    if !command.force && !confirm_delete(&title) {
                        println!("Deletion cancelled.");
                        return;
                    }
                    with_deadline(
                        timeout,
                        commands::delete::delete_task(&repository, &ctx, task_id),
                    )
                    .await
                }
                Err(e) => Err(e),
            }
        }
        cli::Commands::Occurrences(command) => {
            with_deadline(
                timeout,
                commands::occurrences::occurrences_command(&repository, &ctx, command),
            )
            .await
        }
        cli::Commands::Agenda(command) => {
            with_deadline(timeout, commands::agenda::show_agenda(&repository, &ctx, command)).await
        }
    };

    if let Err(e) = result {
        handle_error(e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_env("CADENCE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

async fn confirm_target(
    repo: &impl Repository,
    ctx: &commands::Context,
    id: &str,
) -> anyhow::Result<(uuid::Uuid, String)> {
    let task_id = resolve_task_id(repo, ctx.user_id, id).await?;
    let task = repo
        .find_task(ctx.user_id, task_id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("Task with ID '{}' not found.", task_id)))?;
    Ok((task.id, task.title))
}

fn confirm_delete(title: &str) -> bool {
    Confirm::new()
        .with_prompt(format!("Are you sure you want to delete task '{}'?", title))
        .default(false)
        .interact()
        .unwrap_or(false)
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();

    if let Some(core_error) = err.downcast_ref::<CoreError>() {
        match core_error {
            CoreError::NotFound(s) => {
                eprintln!("{} Not found: {}", "Error:".style(error_style), s);
            }
            CoreError::AmbiguousId(candidates) => {
                eprintln!("{}", "Error: Ambiguous ID.".style(error_style));
                eprintln!("Did you mean one of these?");
                for (id, label) in candidates {
                    eprintln!("  {} ({})", id.yellow(), label);
                }
            }
            CoreError::Validation(s) => {
                eprintln!("{} Invalid input: {}", "Error:".style(error_style), s);
            }
            CoreError::InvalidRecurrenceRule(s) => {
                eprintln!(
                    "{} Invalid recurrence rule: {}",
                    "Error:".style(error_style),
                    s.yellow()
                );
            }
            CoreError::Timeout(limit) => {
                eprintln!(
                    "{} Operation timed out after {}s",
                    "Error:".style(error_style),
                    limit.as_secs()
                );
            }
            CoreError::Database(inner) => {
                eprintln!("{} Database error: {}", "Error:".style(error_style), inner);
            }
            _ => eprintln!("{} {:#}", "Error:".style(error_style), err),
        }
    } else {
        eprintln!("{} {:#}", "Error:".style(error_style), err);
    }
}
