//! JSON output formatter

use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use super::FileReport;

pub fn output_reports(reports: &[FileReport]) -> Result<()> {
    let output: Vec<_> = reports
        .iter()
        .map(|r| {
            serde_json::json!({
                "path": r.path.display().to_string(),
                "issues": r.issues,
            })
        })
        .collect();
    output_value(&output)
}

pub fn output_value<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}
