//! quotd CLI - quote collection and sync from the command line

mod cli;
mod commands;
mod error;

use clap::Parser;

use crate::cli::{Cli, Commands, SyncCommands};
use crate::commands::common::resolve_db_path;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quotd=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);

    match cli.command {
        Some(Commands::Add {
            text,
            category,
            author,
        }) => commands::add::run_add(&text, &category, &author, &db_path).await?,
        Some(Commands::List { category, json }) => {
            commands::list::run_list(category.as_deref(), json, &db_path).await?;
        }
        Some(Commands::Random { category }) => {
            commands::random::run_random(category.as_deref(), &db_path).await?;
        }
        Some(Commands::Categories) => commands::list::run_categories(&db_path).await?,
        Some(Commands::Stats { json }) => commands::list::run_stats(json, &db_path).await?,
        Some(Commands::Import { file }) => {
            commands::import::run_import(&file, &db_path).await?;
        }
        Some(Commands::Export {
            format,
            output,
            stdout,
        }) => {
            commands::export::run_export(format, output.as_deref(), stdout, &db_path).await?;
        }
        Some(Commands::Clear) => commands::clear::run_clear(&db_path).await?,
        Some(Commands::Filter { category }) => {
            let store = commands::common::open_store(&db_path).await?;
            let filter = quotd_core::store::CategoryFilter::parse(Some(&category));
            store.set_category_filter(&filter).await?;
            println!("Category filter set to '{filter}'");
        }
        Some(Commands::Sync { command }) => match command {
            SyncCommands::Now { resolve } => {
                commands::sync::run_sync_now(resolve, &db_path).await?;
            }
            SyncCommands::Auto { state } => {
                commands::sync::run_sync_auto(state, &db_path).await?;
            }
            SyncCommands::Watch { interval, resolve } => {
                commands::sync::run_sync_watch(interval, resolve, &db_path).await?;
            }
            SyncCommands::Conflicts { limit, json } => {
                commands::sync::run_sync_conflicts(limit, json, &db_path).await?;
            }
        },
        Some(Commands::Completions { shell, output }) => {
            commands::completions::run_completions(shell, output.as_deref())?;
        }
        None => {
            // Quick mode: show a random quote from the saved filter
            commands::random::run_random(None, &db_path).await?;
        }
    }

    Ok(())
}
