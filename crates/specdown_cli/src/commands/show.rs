//! Requirements and delta listing

use std::path::Path;

use miette::Result;
use specdown_core::{extract_delta, extract_requirements};

use super::{load_config, load_file};
use crate::cli::{Cli, OutputFormat};
use crate::output::{output_delta, output_requirements};

pub fn run_requirements(cli: &Cli, file: &Path, format: OutputFormat) -> Result<()> {
    let config = load_config(cli)?;
    let document = load_file(&config, file)?;
    output_requirements(&extract_requirements(&document), format)
}

pub fn run_delta(cli: &Cli, file: &Path, format: OutputFormat) -> Result<()> {
    let config = load_config(cli)?;
    let document = load_file(&config, file)?;
    output_delta(&extract_delta(&document), format)
}
