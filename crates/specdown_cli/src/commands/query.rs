//! Query command implementation

use miette::{IntoDiagnostic, Result};
use specdown_ast::Query;
use tracing::info;

use super::{load_config, load_patterns};
use crate::cli::Cli;

pub fn run_query(cli: &Cli, selector: &str, patterns: &[String]) -> Result<bool> {
    let query = Query::parse(selector).into_diagnostic()?;
    let config = load_config(cli)?;
    let (documents, failed) = load_patterns(&config, patterns)?;

    let mut matches = 0;
    for loaded in &documents {
        for node in query.matches(&loaded.document) {
            let location = node.location();
            let text = node.display_text().lines().next().unwrap_or_default();
            println!(
                "{}:{}:{} {:?} {}",
                loaded.path.display(),
                location.start.line,
                location.start.column + 1,
                node.node_type(),
                text.trim()
            );
            matches += 1;
        }
    }

    info!("{} nodes matched `{}`", matches, query);
    Ok(failed > 0)
}
