//! Command implementations

mod archive;
mod check;
mod init;
mod query;
mod show;
mod tasks;
mod validate;

pub use archive::run_archive;
pub use check::run_check;
pub use init::run_init;
pub use query::run_query;
pub use show::{run_delta, run_requirements};
pub use tasks::{run_tasks_export, run_tasks_sync};
pub use validate::run_validate;

use std::path::{Path, PathBuf};

use miette::{IntoDiagnostic, Result};
use specdown_ast::Document;
use specdown_core::{FileFinder, LoadedDocument, SpecdownConfig, load_document, load_documents};
use tracing::info;

use crate::cli::Cli;

/// Loads `--config`, or the config file in the working directory, or the
/// defaults.
pub fn load_config(cli: &Cli) -> Result<SpecdownConfig> {
    let source = cli
        .config
        .clone()
        .or_else(|| SpecdownConfig::find_in(Path::new(".")));
    match &source {
        Some(path) => info!("Using config: {}", path.display()),
        None => info!("No config file found, using defaults"),
    }
    SpecdownConfig::load(source.as_deref(), Path::new(".")).into_diagnostic()
}

/// Discovers and parses the documents named by `patterns`.
///
/// Returns the parsed documents and the number of files that failed to
/// load. Failures are printed to stderr.
pub fn load_patterns(
    config: &SpecdownConfig,
    patterns: &[String],
) -> Result<(Vec<LoadedDocument>, usize)> {
    let patterns = if patterns.is_empty() {
        FileFinder::default_patterns()
    } else {
        patterns.to_vec()
    };

    let finder = FileFinder::new(&config.include, &config.exclude).into_diagnostic()?;
    let files = finder
        .discover_files(&patterns, config.base_dir())
        .into_diagnostic()?;

    let outcome = load_documents(&files, config.max_file_size);
    if !outcome.failures.is_empty() {
        eprintln!("\n{} file(s) failed to load:", outcome.failures.len());
        for (path, error) in &outcome.failures {
            eprintln!("  {}: {}", path.display(), error);
        }
    }

    Ok((outcome.documents, outcome.failures.len()))
}

/// Parses one file named on the command line.
pub fn load_file(config: &SpecdownConfig, path: &Path) -> Result<Document> {
    load_document(path, config.max_file_size)
        .map_err(|e| miette::miette!("{}: {}", path.display(), e))
}

/// Store path used when `--store` is not given.
pub fn default_store_path(task_list: &Path) -> PathBuf {
    task_list.with_file_name("tasks.jsonc")
}
