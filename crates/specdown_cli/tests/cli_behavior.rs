//! Integration tests for CLI behavior
//!
//! These tests verify the external behavior of the CLI tool: help,
//! exit codes and the global flags.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to create a command for the specdown CLI
fn specdown_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_specdown"))
}

mod help_command {
    use super::*;

    #[test]
    fn shows_help_with_flag() {
        specdown_cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Usage:"));
    }

    #[test]
    fn shows_version_with_flag() {
        specdown_cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn lists_subcommands() {
        specdown_cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("validate"))
            .stdout(predicate::str::contains("archive"))
            .stdout(predicate::str::contains("tasks"));
    }

    #[test]
    fn rejects_unknown_subcommand() {
        specdown_cmd()
            .arg("frobnicate")
            .assert()
            .failure()
            .stderr(predicate::str::contains("unrecognized subcommand"));
    }
}

mod exit_codes {
    use super::*;

    #[test]
    fn missing_file_is_fatal() {
        let temp_dir = TempDir::new().unwrap();

        specdown_cmd()
            .current_dir(temp_dir.path())
            .args(["requirements", "missing.md"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("missing.md"));
    }

    #[test]
    fn invalid_config_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(".specdown.jsonc"), r#"{ "unknown": 1 }"#).unwrap();

        specdown_cmd()
            .current_dir(temp_dir.path())
            .arg("check")
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Configuration error"));
    }

    #[test]
    fn validation_problems_exit_with_one() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("spec.md"),
            "# S\n\n## Requirements\n\n### Requirement: Bare\nNo scenarios here.\n",
        )
        .unwrap();

        specdown_cmd()
            .current_dir(temp_dir.path())
            .arg("validate")
            .assert()
            .code(1);
    }
}

mod global_flags {
    use super::*;

    #[test]
    fn explicit_config_overrides_discovery() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("spec.md"),
            "# S\n\n## Requirements\n\n### Requirement: Bare\nNo scenarios here.\n",
        )
        .unwrap();
        fs::write(temp_dir.path().join(".specdown.jsonc"), "{}").unwrap();
        fs::write(
            temp_dir.path().join("lenient.json"),
            r#"{ "validation": { "requireScenarios": false } }"#,
        )
        .unwrap();

        specdown_cmd()
            .current_dir(temp_dir.path())
            .args(["--config", "lenient.json", "validate", "spec.md"])
            .assert()
            .success()
            .stderr(predicate::str::contains("Using config: lenient.json"))
            .stdout(predicate::str::contains("found 0 errors and 1 warnings"));
    }

    #[test]
    fn verbose_enables_debug_logging() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.md"), "# A\n").unwrap();

        specdown_cmd()
            .current_dir(temp_dir.path())
            .args(["check", "--verbose"])
            .assert()
            .success()
            .stderr(predicate::str::contains("DEBUG"));
    }
}
