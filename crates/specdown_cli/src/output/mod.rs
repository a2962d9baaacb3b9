//! Output formatting module

mod json;
mod text;

use std::path::PathBuf;

use miette::Result;
use specdown_core::{DeltaPlan, Issue, Requirement, Severity};

use crate::cli::OutputFormat;

/// Validation issues found in one file.
pub struct FileReport {
    pub path: PathBuf,
    pub issues: Vec<Issue>,
}

impl FileReport {
    pub fn count(&self, severity: Severity) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == severity)
            .count()
    }
}

pub fn output_reports(reports: &[FileReport], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => json::output_reports(reports),
        OutputFormat::Text => {
            text::output_reports(reports);
            Ok(())
        }
    }
}

pub fn output_requirements(requirements: &[Requirement], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => json::output_value(requirements),
        OutputFormat::Text => {
            text::output_requirements(requirements);
            Ok(())
        }
    }
}

pub fn output_delta(plan: &DeltaPlan, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => json::output_value(plan),
        OutputFormat::Text => {
            text::output_delta(plan);
            Ok(())
        }
    }
}
