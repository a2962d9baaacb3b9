//! Archive command implementation

use std::path::Path;

use miette::{IntoDiagnostic, Result};
use specdown_core::{ValidationOptions, apply_delta, extract_delta, validate_delta};
use tracing::info;

use super::{load_config, load_file};
use crate::cli::{Cli, OutputFormat};
use crate::output::{FileReport, output_reports};

pub fn run_archive(cli: &Cli, delta: &Path, base: &Path, write: bool) -> Result<bool> {
    let config = load_config(cli)?;
    let options = ValidationOptions::from(&config.validation);
    let base_document = load_file(&config, base)?;
    let delta_document = load_file(&config, delta)?;

    let issues = validate_delta(&delta_document, Some(&base_document), &options);
    if options.fails(&issues) {
        let report = FileReport {
            path: delta.to_path_buf(),
            issues,
        };
        output_reports(std::slice::from_ref(&report), OutputFormat::Text)?;
        eprintln!("Not archiving {}: fix the issues above first", delta.display());
        return Ok(true);
    }

    let plan = extract_delta(&delta_document);
    let outcome = apply_delta(&base_document, &plan).into_diagnostic()?;
    let summary = outcome.summary;

    if write {
        std::fs::write(base, outcome.text()).into_diagnostic()?;
        info!(
            "Archived {} into {}: {} added, {} modified, {} removed, {} renamed",
            delta.display(),
            base.display(),
            summary.added,
            summary.modified,
            summary.removed,
            summary.renamed
        );
    } else {
        print!("{}", outcome.text());
    }

    Ok(false)
}
