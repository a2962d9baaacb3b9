//! Task list and task store commands

use std::path::Path;

use miette::{IntoDiagnostic, Result};
use specdown_core::{TaskStore, sync_tasks};
use tracing::info;

use super::{default_store_path, load_config, load_file};
use crate::cli::Cli;

pub fn run_tasks_sync(
    cli: &Cli,
    file: &Path,
    store: Option<&Path>,
    dry_run: bool,
) -> Result<bool> {
    let config = load_config(cli)?;
    let document = load_file(&config, file)?;
    let store_path = store.map_or_else(|| default_store_path(file), Path::to_path_buf);
    let store = TaskStore::from_file(&store_path).into_diagnostic()?;

    let outcome = sync_tasks(&document, &store, config.tasks.auto_number).into_diagnostic()?;

    for change in &outcome.changed {
        let mark = if change.checked { "x" } else { " " };
        println!("[{}] {}", mark, change.id);
    }
    for id in &outcome.unknown {
        eprintln!("Unknown task id in {}: {}", store_path.display(), id);
    }

    if outcome.changed.is_empty() {
        info!("{} is up to date", file.display());
    } else if dry_run {
        info!(
            "Would update {} task(s) in {}",
            outcome.changed.len(),
            file.display()
        );
    } else {
        std::fs::write(file, outcome.document.print()).into_diagnostic()?;
        info!("Updated {} task(s) in {}", outcome.changed.len(), file.display());
    }

    Ok(!outcome.unknown.is_empty())
}

pub fn run_tasks_export(cli: &Cli, file: &Path, store: Option<&Path>) -> Result<()> {
    let config = load_config(cli)?;
    let document = load_file(&config, file)?;
    let store_path = store.map_or_else(|| default_store_path(file), Path::to_path_buf);

    let previous = if store_path.is_file() {
        Some(TaskStore::from_file(&store_path).into_diagnostic()?)
    } else {
        None
    };

    let exported = TaskStore::export(&document, config.tasks.auto_number, previous.as_ref());
    exported.write(&store_path).into_diagnostic()?;
    info!(
        "Wrote {} task(s) to {}",
        exported.tasks.len(),
        store_path.display()
    );
    Ok(())
}
