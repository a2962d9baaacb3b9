//! # specdown_core
//!
//! Workspace-level operations over parsed specdown documents.
//!
//! This crate provides:
//! - Requirement and delta extraction
//! - Validation of specs and change proposals
//! - Merging a delta into its base spec
//! - Task sync between `tasks.md` and `tasks.jsonc`
//! - Configuration loading, file discovery and parallel loading
//!
//! ## Example
//!
//! ```rust
//! use specdown_core::{ValidationOptions, extract_delta, validate_delta};
//!
//! let delta = specdown_parser::parse(
//!     "## ADDED Requirements\n### Requirement: Export\n#### Scenario: CSV\n",
//! ).unwrap();
//! assert_eq!(extract_delta(&delta).added[0].name, "Export");
//! assert!(validate_delta(&delta, None, &ValidationOptions::default()).is_empty());
//! ```

mod config;
mod error;
mod extract;
pub mod file_finder;
mod merge;
mod tasks;
mod validate;
pub mod workspace;

pub use config::{
    CONFIG_FILE_NAMES, CONFIG_TEMPLATE, SpecdownConfig, TasksConfig, ValidationConfig,
};
pub use error::CoreError;
pub use extract::{
    DeltaPlan, RenameOp, Requirement, extract_delta, extract_requirements, is_delta,
    requirement_name,
};
pub use file_finder::FileFinder;
pub use merge::{MergeOutcome, MergeSummary, apply_delta};
pub use tasks::{
    SyncOutcome, TaskChange, TaskEntry, TaskRecord, TaskStatus, TaskStore, collect_tasks,
    sync_tasks,
};
pub use validate::{Issue, Severity, ValidationOptions, validate_delta, validate_spec};
pub use workspace::{LoadOutcome, LoadedDocument, load_document, load_documents};
