//! End-to-end tests for a change proposal's life: validate it against its
//! spec, archive it, and keep the change's task list in step with its
//! store.

use std::path::PathBuf;

use assert_fs::TempDir;
use assert_fs::prelude::*;
use pretty_assertions::assert_eq;
use specdown_ast::Document;
use specdown_core::{
    FileFinder, SpecdownConfig, TaskStatus, TaskStore, ValidationOptions, apply_delta,
    extract_delta, extract_requirements, load_documents, sync_tasks, validate_delta,
    validate_spec,
};
use specdown_parser::{incremental_update, parse};

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/auth")
        .join(name);
    std::fs::read_to_string(path).unwrap()
}

fn names(doc: &Document) -> Vec<String> {
    extract_requirements(doc)
        .into_iter()
        .map(|r| r.name)
        .collect()
}

mod archive {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn delta_is_valid_against_its_base() {
        let base = parse(&fixture("spec.md")).unwrap();
        let change = parse(&fixture("change.md")).unwrap();

        let issues = validate_delta(&change, Some(&base), &ValidationOptions::default());
        assert_eq!(issues, vec![]);
    }

    #[test]
    fn archived_spec_matches_expected_text() {
        let base = parse(&fixture("spec.md")).unwrap();
        let plan = extract_delta(&parse(&fixture("change.md")).unwrap());
        assert_eq!(plan.len(), 4);

        let outcome = apply_delta(&base, &plan).unwrap();
        assert_eq!(outcome.text(), fixture("merged.md"));
        assert_eq!(
            names(&outcome.document),
            vec!["Password login", "Session timeout", "Two-factor"]
        );
        assert_eq!(
            validate_spec(&outcome.document, &ValidationOptions::default()),
            vec![]
        );
    }

    #[test]
    fn archived_spec_round_trips() {
        let base = parse(&fixture("spec.md")).unwrap();
        let plan = extract_delta(&parse(&fixture("change.md")).unwrap());
        let merged = apply_delta(&base, &plan).unwrap().document;

        let printed = merged.print();
        assert_eq!(printed, merged.source());
        assert!(parse(&printed).unwrap().structurally_eq(&merged));
        assert_eq!(merged.query("h3").unwrap().count(), 3);
    }

    #[test]
    fn archiving_twice_is_rejected() {
        let base = parse(&fixture("spec.md")).unwrap();
        let change = parse(&fixture("change.md")).unwrap();
        let plan = extract_delta(&change);
        let merged = apply_delta(&base, &plan).unwrap().document;

        let issues = validate_delta(&change, Some(&merged), &ValidationOptions::default());
        let messages: Vec<_> = issues.iter().map(|i| i.message.as_str()).collect();
        assert!(messages.contains(&"ADDED requirement `Two-factor` already exists"));
        assert!(messages.contains(&"REMOVED requirement `Remember me` does not exist"));
        assert!(apply_delta(&merged, &plan).is_err());
    }

    #[test]
    fn editing_the_archived_spec_incrementally() {
        let base = parse(&fixture("spec.md")).unwrap();
        let plan = extract_delta(&parse(&fixture("change.md")).unwrap());
        let merged = apply_delta(&base, &plan).unwrap().document;

        let source = merged.source();
        let at = source.find("15 minutes.").unwrap();
        let edited = incremental_update(&merged, at..at + 2, "10").unwrap();

        let expected = source.replacen("15 minutes.", "10 minutes.", 1);
        assert_eq!(edited.print(), expected);
        assert!(edited.structurally_eq(&parse(&expected).unwrap()));
    }
}

mod tasks {
    use super::*;
    use pretty_assertions::assert_eq;

    const STORE: &str = r#"{
  "tasks": [
    { "id": "1.1", "status": "done" },
    { "id": "1.2", "status": "in_progress" },
    { "id": "2.2", "status": "done", "description": "Error messages" }
  ]
}"#;

    #[test]
    fn sync_then_export_is_stable() {
        let doc = parse(&fixture("tasks.md")).unwrap();
        let store = TaskStore::from_jsonc(STORE).unwrap();

        let outcome = sync_tasks(&doc, &store, true).unwrap();
        let changed: Vec<_> = outcome.changed.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(changed, vec!["1.1", "2.2"]);
        assert!(outcome.unknown.is_empty());

        let synced = outcome.document.print();
        assert!(synced.contains("- [x] 1.1 Add one-time code table\n"));
        assert!(synced.contains("- [ ] 1.2 Send codes by email\n"));
        assert!(synced.contains("- [x] Error messages\n"));

        let exported = TaskStore::export(&outcome.document, true, Some(&store));
        let statuses: Vec<_> = exported
            .tasks
            .iter()
            .map(|t| (t.id.as_str(), t.status))
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("1.1", TaskStatus::Done),
                ("1.2", TaskStatus::InProgress),
                ("2.1", TaskStatus::Pending),
                ("2.2", TaskStatus::Done),
            ]
        );

        let again = sync_tasks(&parse(&synced).unwrap(), &exported, true).unwrap();
        assert!(again.changed.is_empty());
    }
}

mod workspace {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn changes_directory_is_validated_file_by_file() {
        let temp = TempDir::new().unwrap();
        temp.child("specs/auth/spec.md")
            .write_str(&fixture("spec.md"))
            .unwrap();
        temp.child("changes/harden-sessions/spec.md")
            .write_str(&fixture("change.md"))
            .unwrap();
        temp.child("changes/harden-sessions/tasks.md")
            .write_str(&fixture("tasks.md"))
            .unwrap();
        temp.child(".specdown.json")
            .write_str(r#"{ "include": ["specs/**", "changes/**/spec.md"] }"#)
            .unwrap();

        let config = SpecdownConfig::load(None, temp.path()).unwrap();
        let finder = FileFinder::new(&config.include, &config.exclude).unwrap();
        let files = finder
            .discover_files(&FileFinder::default_patterns(), config.base_dir())
            .unwrap();
        assert_eq!(files.len(), 2);

        let outcome = load_documents(&files, config.max_file_size);
        assert!(outcome.failures.is_empty());

        let base = &outcome.documents[1];
        let change = &outcome.documents[0];
        assert!(base.path.ends_with("specs/auth/spec.md"));
        assert!(change.path.ends_with("changes/harden-sessions/spec.md"));

        let options = ValidationOptions::from(&config.validation);
        assert_eq!(validate_spec(&base.document, &options), vec![]);
        assert_eq!(
            validate_delta(&change.document, Some(&base.document), &options),
            vec![]
        );
    }
}
