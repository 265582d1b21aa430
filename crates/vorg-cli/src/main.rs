//! vorg CLI
//!
//! Command-line interface for generating, previewing, linking and rolling
//! back virtual views.

mod cli;
mod commands;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use commands::Workspace;
use error::{CliError, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.verbose)
        .map_err(|e| CliError::user(format!("failed to initialize logging: {e}")))?;
    tracing::debug!(db = %cli.db.display(), rules = %cli.rules.display(), "Starting");

    let workspace = Workspace::new(cli.db, cli.rules, cli.views_root);
    execute_command(&workspace, cli.command)
}

fn execute_command(workspace: &Workspace, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Views => commands::run_views(workspace),
        Commands::Generate { view, output } => commands::run_generate(workspace, &view, &output),
        Commands::Preview { output } => commands::run_preview(workspace, &output),
        Commands::Link {
            view,
            mappings,
            dry_run,
        } => commands::run_link(workspace, &view, mappings.as_deref(), dry_run),
        Commands::Rollback { view } => commands::run_rollback(workspace, &view),
        Commands::History { view, json } => commands::run_history(workspace, &view, json),
    }
}
