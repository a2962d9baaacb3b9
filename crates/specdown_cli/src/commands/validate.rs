//! Validate command implementation

use std::path::Path;

use miette::Result;
use specdown_core::{ValidationOptions, is_delta, validate_delta, validate_spec};
use tracing::info;

use super::{load_config, load_file, load_patterns};
use crate::cli::{Cli, OutputFormat};
use crate::output::{FileReport, output_reports};

pub fn run_validate(
    cli: &Cli,
    patterns: &[String],
    base: Option<&Path>,
    format: OutputFormat,
) -> Result<bool> {
    let config = load_config(cli)?;
    let options = ValidationOptions::from(&config.validation);

    let base = match base {
        Some(path) => Some(load_file(&config, path)?),
        None => None,
    };
    let (documents, failed) = load_patterns(&config, patterns)?;

    let reports: Vec<FileReport> = documents
        .iter()
        .map(|loaded| {
            let issues = if is_delta(&loaded.document) {
                validate_delta(&loaded.document, base.as_ref(), &options)
            } else {
                validate_spec(&loaded.document, &options)
            };
            FileReport {
                path: loaded.path.clone(),
                issues,
            }
        })
        .collect();

    output_reports(&reports, format)?;

    let failing = reports
        .iter()
        .filter(|r| options.fails(&r.issues))
        .count();
    info!("{} of {} files failed validation", failing, reports.len());

    Ok(failing > 0 || failed > 0)
}
