//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// specdown - structural tooling for markdown specifications
#[derive(Parser)]
#[command(name = "specdown")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse documents and verify they print back byte for byte
    Check {
        /// Files, directories or glob patterns (defaults to every markdown file)
        patterns: Vec<String>,
    },

    /// Validate specs, or change proposals against a base spec
    Validate {
        /// Files, directories or glob patterns (defaults to every markdown file)
        patterns: Vec<String>,

        /// Base spec to check change proposals against
        #[arg(long)]
        base: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List the requirements of a spec
    Requirements {
        /// Spec file
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the operations of a change proposal
    Delta {
        /// Change proposal file
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the nodes matching a selector
    Query {
        /// Selector, e.g. `task[checked=false]`
        selector: String,

        /// Files, directories or glob patterns (defaults to every markdown file)
        patterns: Vec<String>,
    },

    /// Keep task checkboxes and a task store in step
    Tasks {
        #[command(subcommand)]
        command: TasksCommands,
    },

    /// Apply a change proposal to its base spec
    Archive {
        /// Change proposal file
        delta: PathBuf,

        /// Spec file the proposal applies to
        base: PathBuf,

        /// Write the merged spec back to the base file instead of stdout
        #[arg(long)]
        write: bool,
    },

    /// Initialize configuration
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum TasksCommands {
    /// Set checkboxes in a task list from its store
    Sync {
        /// Task list file
        file: PathBuf,

        /// Task store (defaults to `tasks.jsonc` next to the task list)
        #[arg(long)]
        store: Option<PathBuf>,

        /// Report changes without writing the task list
        #[arg(long)]
        dry_run: bool,
    },

    /// Write a task store from the checkboxes of a task list
    Export {
        /// Task list file
        file: PathBuf,

        /// Task store (defaults to `tasks.jsonc` next to the task list)
        #[arg(long)]
        store: Option<PathBuf>,
    },
}
