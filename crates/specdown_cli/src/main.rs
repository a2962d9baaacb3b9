//! specdown CLI
//!
//! Parses, validates and merges markdown specifications, change proposals
//! and task lists.

mod cli;
mod commands;
mod output;

use std::process::ExitCode;

use clap::Parser;
use miette::Result;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, TasksCommands};
use crate::commands::{
    run_archive, run_check, run_delta, run_init, run_query, run_requirements, run_tasks_export,
    run_tasks_sync, run_validate,
};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(has_errors) => {
            if has_errors {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    match &cli.command {
        Commands::Check { patterns } => run_check(&cli, patterns),
        Commands::Validate {
            patterns,
            base,
            format,
        } => run_validate(&cli, patterns, base.as_deref(), *format),
        Commands::Requirements { file, format } => {
            run_requirements(&cli, file, *format).map(|_| false)
        }
        Commands::Delta { file, format } => run_delta(&cli, file, *format).map(|_| false),
        Commands::Query { selector, patterns } => run_query(&cli, selector, patterns),
        Commands::Tasks { command } => match command {
            TasksCommands::Sync {
                file,
                store,
                dry_run,
            } => run_tasks_sync(&cli, file, store.as_deref(), *dry_run),
            TasksCommands::Export { file, store } => {
                run_tasks_export(&cli, file, store.as_deref()).map(|_| false)
            }
        },
        Commands::Archive { delta, base, write } => run_archive(&cli, delta, base, *write),
        Commands::Init { force } => run_init(*force).map(|_| false),
    }
}
