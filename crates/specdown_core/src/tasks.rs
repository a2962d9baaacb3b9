//! Task list sync between `tasks.md` and a `tasks.jsonc` status store.
//!
//! # Overview
//!
//! - [`collect_tasks`] lists the task items of a document with their ids
//! - [`TaskStore`] is the machine-readable side: `{"tasks": [{"id", "status"}]}`
//! - [`sync_tasks`] flips the checkboxes whose state disagrees with the
//!   store; the printed document differs from the source only in those
//!   mark bytes
//!
//! ## Numbering
//!
//! Tasks without an explicit id are numbered `<section>.<position>` when
//! auto-numbering is on. The section is the leading number of the nearest
//! level-2 header (`## 2. Parser`), or that header's ordinal. Nested tasks
//! extend their parent's id. Explicit ids reset the running position, so
//! numbering continues after them.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use jsonc_parser::ParseOptions;
use serde::{Deserialize, Serialize};
use specdown_ast::{Document, NodeId, NodeKind, NodeRef, NodeType};
use tracing::{debug, info, warn};

use crate::error::CoreError;

/// A task item found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEntry {
    /// Explicit or generated id. `None` only without auto-numbering.
    pub id: Option<String>,
    /// Whether `id` was written in the document.
    pub explicit: bool,
    pub checked: bool,
    pub description: String,
    pub node: NodeId,
    /// 1-indexed line of the task.
    pub line: u32,
}

/// Lists every task item in document order.
pub fn collect_tasks(doc: &Document, auto_number: bool) -> Vec<TaskEntry> {
    let mut collector = Collector {
        auto_number,
        tasks: Vec::new(),
    };
    let mut section: Option<String> = None;
    let mut counter = 0;
    let mut ordinal = 0;

    for block in doc.top_level() {
        match block.kind() {
            NodeKind::Header { level: 2, text } => {
                ordinal += 1;
                let number = leading_number(text).unwrap_or(ordinal);
                section = Some(number.to_string());
                counter = 0;
            }
            NodeKind::List { .. } => collector.list(block, section.as_deref(), &mut counter),
            _ => {}
        }
    }
    collector.tasks
}

struct Collector {
    auto_number: bool,
    tasks: Vec<TaskEntry>,
}

impl Collector {
    /// Collects the tasks of `list`; `prefix` is the parent task's id or
    /// the section number.
    fn list(&mut self, list: NodeRef<'_>, prefix: Option<&str>, counter: &mut u32) {
        for item in list.children() {
            match item.kind() {
                NodeKind::TaskItem(task) => {
                    let explicit = task.id.as_ref().map(|id| id.to_string());
                    let id = match &explicit {
                        Some(id) => {
                            *counter = continued_position(prefix, id).unwrap_or(*counter + 1);
                            Some(id.clone())
                        }
                        None if self.auto_number => {
                            *counter += 1;
                            Some(match prefix {
                                Some(prefix) => format!("{prefix}.{counter}"),
                                None => counter.to_string(),
                            })
                        }
                        None => None,
                    };
                    self.tasks.push(TaskEntry {
                        id: id.clone(),
                        explicit: explicit.is_some(),
                        checked: task.checked,
                        description: task.description.clone(),
                        node: item.id(),
                        line: item.location().start.line,
                    });

                    let mut child_counter = 0;
                    for child in nested_lists(item) {
                        self.list(child, id.as_deref().or(prefix), &mut child_counter);
                    }
                }
                // Plain items are transparent: their nested tasks number
                // as siblings of the surrounding ones.
                NodeKind::ListItem => {
                    for child in nested_lists(item) {
                        self.list(child, prefix, counter);
                    }
                }
                _ => {}
            }
        }
    }
}

fn nested_lists<'d>(item: NodeRef<'d>) -> impl Iterator<Item = NodeRef<'d>> {
    item.children()
        .filter(|child| child.node_type() == NodeType::List)
}

/// The last segment of `id` if the rest of it is `prefix`.
fn continued_position(prefix: Option<&str>, id: &str) -> Option<u32> {
    let (head, last) = match id.rsplit_once('.') {
        Some((head, last)) => (Some(head), last),
        None => (None, id),
    };
    (head == prefix).then(|| last.parse().ok()).flatten()
}

fn leading_number(text: &str) -> Option<u32> {
    let digits: &str = text
        .trim_start()
        .split(|c: char| !c.is_ascii_digit())
        .next()?;
    digits.parse().ok()
}

/// Status of a task in the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn is_done(self) -> bool {
        self == TaskStatus::Done
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The `tasks.jsonc` status store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStore {
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
}

impl TaskStore {
    /// Parses a store. Comments and trailing commas are accepted; task ids
    /// must be unique.
    pub fn from_jsonc(text: &str) -> Result<Self, CoreError> {
        let value = jsonc_parser::parse_to_serde_value(text, &ParseOptions::default())
            .map_err(|e| CoreError::task_store(format!("Invalid JSON: {}", e)))?;
        let store: TaskStore = match value {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| CoreError::task_store(format!("Invalid task store: {}", e)))?,
            None => TaskStore::default(),
        };

        let mut seen = HashSet::new();
        if let Some(dup) = store.tasks.iter().find(|t| !seen.insert(t.id.as_str())) {
            return Err(CoreError::task_store(format!(
                "duplicate task id `{}`",
                dup.id
            )));
        }
        Ok(store)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let store = Self::from_jsonc(&content)?;
        debug!("Loaded {} task records from {}", store.tasks.len(), path.display());
        Ok(store)
    }

    /// Serializes the store as pretty JSON with a trailing newline.
    pub fn to_json(&self) -> Result<String, CoreError> {
        let mut json = serde_json::to_string_pretty(self)
            .map_err(|e| CoreError::task_store(format!("Failed to serialize: {}", e)))?;
        json.push('\n');
        Ok(json)
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), CoreError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&TaskRecord> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Builds a store from the checkboxes of `doc`.
    pub fn from_document(doc: &Document, auto_number: bool) -> Self {
        Self::export(doc, auto_number, None)
    }

    /// Like [`from_document`](Self::from_document), but unchecked tasks
    /// keep an `in_progress` status recorded in `previous`.
    pub fn export(doc: &Document, auto_number: bool, previous: Option<&TaskStore>) -> Self {
        let mut tasks = Vec::new();
        for entry in collect_tasks(doc, auto_number) {
            let Some(id) = entry.id else {
                warn!("Task on line {} has no id; not exported", entry.line);
                continue;
            };
            let status = if entry.checked {
                TaskStatus::Done
            } else {
                match previous.and_then(|store| store.get(&id)) {
                    Some(record) if record.status == TaskStatus::InProgress => {
                        TaskStatus::InProgress
                    }
                    _ => TaskStatus::Pending,
                }
            };
            tasks.push(TaskRecord {
                id,
                status,
                description: Some(entry.description).filter(|d| !d.is_empty()),
            });
        }
        Self { tasks }
    }
}

/// A checkbox changed by [`sync_tasks`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskChange {
    pub id: String,
    pub checked: bool,
}

/// Result of [`sync_tasks`].
#[derive(Debug)]
pub struct SyncOutcome {
    /// The document with store states applied. Print it to get the text.
    pub document: Document,
    pub changed: Vec<TaskChange>,
    /// Store ids that match no task in the document.
    pub unknown: Vec<String>,
}

/// Sets every checkbox whose state disagrees with `store`.
pub fn sync_tasks(
    doc: &Document,
    store: &TaskStore,
    auto_number: bool,
) -> Result<SyncOutcome, CoreError> {
    let entries = collect_tasks(doc, auto_number);
    let mut document: Option<Document> = None;
    let mut changed = Vec::new();

    for entry in &entries {
        let Some(id) = &entry.id else {
            continue;
        };
        let Some(record) = store.get(id) else {
            continue;
        };
        let checked = record.status.is_done();
        if checked == entry.checked {
            continue;
        }
        let current = document.as_ref().unwrap_or(doc);
        document = Some(
            current
                .with_task_checked(entry.node, checked)
                .map_err(|e| CoreError::internal(e.to_string()))?,
        );
        changed.push(TaskChange {
            id: id.clone(),
            checked,
        });
    }

    let known: HashSet<&str> = entries.iter().filter_map(|e| e.id.as_deref()).collect();
    let unknown: Vec<String> = store
        .tasks
        .iter()
        .filter(|t| !known.contains(t.id.as_str()))
        .map(|t| t.id.clone())
        .collect();
    for id in &unknown {
        warn!("Task `{}` is in the store but not in the document", id);
    }

    info!("Synced tasks: {} changed", changed.len());
    Ok(SyncOutcome {
        document: document.unwrap_or_else(|| doc.clone()),
        changed,
        unknown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use specdown_parser::parse;

    const TASKS: &str = "\
# Tasks

- [ ] Before any section

## 1. Setup
- [x] 1.1 Create crate
- [ ]  Wire   config
  - [ ] Nested unlabeled

## Polish
- [ ] First
- Notes
  - [x] Second
  - [ ] 2.2.5 Explicit nested

```text
- [ ] 9.9 not a task
```
";

    fn ids(doc: &Document, auto_number: bool) -> Vec<Option<String>> {
        collect_tasks(doc, auto_number)
            .into_iter()
            .map(|t| t.id)
            .collect()
    }

    #[test]
    fn test_auto_numbering() {
        let doc = parse(TASKS).unwrap();
        let expected = ["1", "1.1", "1.2", "1.2.1", "2.1", "2.2", "2.2.5"];
        assert_eq!(
            ids(&doc, true),
            expected.map(|id| Some(id.to_string())).to_vec()
        );
    }

    #[test]
    fn test_without_auto_numbering() {
        let doc = parse(TASKS).unwrap();
        let tasks = collect_tasks(&doc, false);
        let explicit: Vec<_> = tasks.iter().filter_map(|t| t.id.as_deref()).collect();
        assert_eq!(explicit, vec!["1.1", "2.2.5"]);
        assert_eq!(tasks.len(), 7);
        assert_eq!(tasks[2].description, "Wire   config");
        assert_eq!(tasks[2].line, 7);
    }

    #[rstest]
    #[case(None, "3", Some(3))]
    #[case(Some("2"), "2.4", Some(4))]
    #[case(Some("2.4"), "2.4.1", Some(1))]
    #[case(Some("2"), "3.1", None)]
    #[case(None, "1.1", None)]
    fn test_continued_position(
        #[case] prefix: Option<&str>,
        #[case] id: &str,
        #[case] expected: Option<u32>,
    ) {
        assert_eq!(continued_position(prefix, id), expected);
    }

    #[rstest]
    #[case("1. Setup", Some(1))]
    #[case("12 Parser", Some(12))]
    #[case("Phase 2", None)]
    #[case("", None)]
    fn test_leading_number(#[case] text: &str, #[case] expected: Option<u32>) {
        assert_eq!(leading_number(text), expected);
    }

    #[test]
    fn test_store_from_jsonc() {
        let store = TaskStore::from_jsonc(
            r#"{
                // generated
                "tasks": [
                    { "id": "1.1", "status": "done" },
                    { "id": "1.2", "status": "in_progress", "description": "Wire config" },
                    { "id": "2.1" },
                ],
            }"#,
        )
        .unwrap();
        assert_eq!(store.tasks.len(), 3);
        assert_eq!(store.get("1.2").map(|t| t.status), Some(TaskStatus::InProgress));
        assert_eq!(store.get("2.1").map(|t| t.status), Some(TaskStatus::Pending));
        assert!(store.get("9").is_none());
    }

    #[rstest]
    #[case::duplicate(r#"{ "tasks": [{ "id": "1" }, { "id": "1" }] }"#, "duplicate task id")]
    #[case::bad_status(r#"{ "tasks": [{ "id": "1", "status": "finished" }] }"#, "Invalid task store")]
    #[case::syntax(r#"{ "tasks": [ "#, "Invalid JSON")]
    fn test_store_rejected(#[case] json: &str, #[case] expected: &str) {
        let err = TaskStore::from_jsonc(json).unwrap_err();
        assert!(matches!(err, CoreError::TaskStore(_)));
        assert!(err.to_string().contains(expected), "{err}");
    }

    #[test]
    fn test_store_json_shape() {
        let store = TaskStore {
            tasks: vec![
                TaskRecord {
                    id: "1.1".to_string(),
                    status: TaskStatus::Done,
                    description: None,
                },
                TaskRecord {
                    id: "1.2".to_string(),
                    status: TaskStatus::InProgress,
                    description: Some("Wire".to_string()),
                },
            ],
        };
        insta::assert_snapshot!(store.to_json().unwrap(), @r#"
        {
          "tasks": [
            {
              "id": "1.1",
              "status": "done"
            },
            {
              "id": "1.2",
              "status": "in_progress",
              "description": "Wire"
            }
          ]
        }
        "#);
    }

    #[test]
    fn test_sync_patches_only_marks() {
        let doc = parse(TASKS).unwrap();
        let store = TaskStore::from_jsonc(
            r#"{ "tasks": [
                { "id": "1.1", "status": "pending" },
                { "id": "1.2", "status": "done" },
                { "id": "2.2", "status": "done" },
                { "id": "7.7", "status": "done" }
            ] }"#,
        )
        .unwrap();

        let outcome = sync_tasks(&doc, &store, true).unwrap();
        assert_eq!(
            outcome.changed,
            vec![
                TaskChange {
                    id: "1.1".to_string(),
                    checked: false,
                },
                TaskChange {
                    id: "1.2".to_string(),
                    checked: true,
                },
            ]
        );
        assert_eq!(outcome.unknown, vec!["7.7"]);

        let expected = TASKS
            .replace("- [x] 1.1", "- [ ] 1.1")
            .replace("- [ ]  Wire", "- [x]  Wire");
        assert_eq!(outcome.document.print(), expected);
        assert_eq!(outcome.document.source(), TASKS);
    }

    #[test]
    fn test_export_then_sync_is_a_no_op() {
        let doc = parse(TASKS).unwrap();
        let store = TaskStore::from_document(&doc, true);
        assert_eq!(store.tasks.len(), 7);
        assert_eq!(store.get("2.2").map(|t| t.status), Some(TaskStatus::Done));

        let outcome = sync_tasks(&doc, &store, true).unwrap();
        assert!(outcome.changed.is_empty());
        assert!(outcome.unknown.is_empty());
        assert_eq!(outcome.document.print(), TASKS);
    }

    #[test]
    fn test_export_keeps_in_progress() {
        let doc = parse("- [ ] 1 A\n- [x] 2 B\n").unwrap();
        let previous = TaskStore::from_jsonc(
            r#"{ "tasks": [{ "id": "1", "status": "in_progress" }, { "id": "2", "status": "in_progress" }] }"#,
        )
        .unwrap();
        let store = TaskStore::export(&doc, true, Some(&previous));
        let statuses: Vec<_> = store.tasks.iter().map(|t| t.status).collect();
        assert_eq!(statuses, vec![TaskStatus::InProgress, TaskStatus::Done]);
    }
}
