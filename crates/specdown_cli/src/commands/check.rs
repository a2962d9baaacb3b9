//! Check command implementation

use miette::Result;
use specdown_ast::Document;
use tracing::{debug, warn};

use super::{load_config, load_patterns};
use crate::cli::Cli;

pub fn run_check(cli: &Cli, patterns: &[String]) -> Result<bool> {
    let config = load_config(cli)?;
    let (documents, failed) = load_patterns(&config, patterns)?;

    let mut mismatches = 0;
    for loaded in &documents {
        match round_trip_error(&loaded.document) {
            None => debug!("{}: ok", loaded.path.display()),
            Some(reason) => {
                warn!("{}: {}", loaded.path.display(), reason);
                println!("{}: {}", loaded.path.display(), reason);
                mismatches += 1;
            }
        }
    }

    println!();
    println!(
        "Checked {} files, {} failed to round-trip, {} failed to load",
        documents.len(),
        mismatches,
        failed
    );

    Ok(mismatches > 0 || failed > 0)
}

fn round_trip_error(document: &Document) -> Option<String> {
    let printed = document.print();
    if printed != document.source() {
        return Some("printed text differs from the source".to_string());
    }
    match specdown_parser::parse(&printed) {
        Ok(reparsed) if reparsed.structurally_eq(document) => None,
        Ok(_) => Some("re-parsing the printed text gives a different tree".to_string()),
        Err(e) => Some(format!("re-parsing failed: {}", e)),
    }
}
