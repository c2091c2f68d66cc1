//! procdocs CLI - factory process documentation from the terminal
//!
//! Reads the local cache instantly and syncs with Supabase when online.

mod cli;
mod commands;
mod error;


use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::auth_cmd::run_auth;
use crate::commands::common::Context;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::delete::run_delete;
use crate::commands::list::run_list;
use crate::commands::show::run_show;
use crate::commands::status::run_status;
use crate::commands::sync::run_sync;
use crate::error::CliError;

const DEFAULT_LOG_FILTER: &str = "procdocs=info,procdocs_core=info";

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
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help().map_err(CliError::Io)?;
        println!();
        return Ok(());
    };

    if let Commands::Completions { shell, output } = &command {
        return run_completions(*shell, output.as_deref());
    }

    let context = Context::resolve(cli.db_path, cli.config_path)?;
    match command {
        Commands::Sync { json } => run_sync(json, &context).await?,
        Commands::List { limit, json } => run_list(limit, json, &context).await?,
        Commands::Show { query, json } => run_show(&query, json, &context).await?,
        Commands::Add {
            title,
            description,
            images,
        } => run_add(&title, &description, &images, &context).await?,
        Commands::Delete { ids } => run_delete(&ids, &context).await?,
        Commands::Status { json } => run_status(json, &context).await?,
        Commands::Auth { command } => run_auth(command, &context).await?,
        Commands::Config { command } => run_config(command, &context)?,
        Commands::Completions { .. } => {}
    }

    Ok(())
}
