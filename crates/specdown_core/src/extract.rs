//! Requirement and delta extraction.
//!
//! # Overview
//!
//! Specs are organized by headers:
//!
//! ```text
//! ## ADDED Requirements          <- selects the delta section
//! ### Requirement: Two-factor    <- opens a requirement
//! The system SHALL ...           <- raw text
//! #### Scenario: Code accepted   <- scenario name
//! ```
//!
//! [`extract_requirements`] and [`extract_delta`] run the same state
//! machine over the top-level blocks of a document. They never fail:
//! missing or empty sections simply produce nothing.
//!
//! ## Example
//!
//! ```rust
//! use specdown_core::extract_requirements;
//!
//! let doc = specdown_parser::parse(
//!     "### Requirement: Foo\n#### Scenario: A\n#### Scenario: B\n",
//! ).unwrap();
//! let requirements = extract_requirements(&doc);
//! assert_eq!(requirements.len(), 1);
//! assert_eq!(requirements[0].scenarios, vec!["A", "B"]);
//! ```

use serde::Serialize;
use specdown_ast::{Document, NodeKind, NodeRef, NodeType, Span, VisitResult, Visitor};
use tracing::debug;

const REQUIREMENT_PREFIX: &str = "Requirement:";
const SCENARIO_PREFIX: &str = "Scenario:";

/// One `### Requirement:` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Requirement {
    pub name: String,
    /// The block verbatim, from its header line to the end of its last
    /// non-blank block.
    pub raw_text: String,
    pub scenarios: Vec<String>,
    /// Source span of `raw_text`.
    pub span: Span,
}

/// A `FROM:`/`TO:` pair from a `RENAMED Requirements` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameOp {
    pub from: String,
    pub to: String,
}

/// The operations of a change proposal, by section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeltaPlan {
    pub added: Vec<Requirement>,
    pub modified: Vec<Requirement>,
    pub removed: Vec<String>,
    pub renamed: Vec<RenameOp>,
}

impl DeltaPlan {
    /// Returns true if the plan has no operations at all.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.modified.is_empty()
            && self.removed.is_empty()
            && self.renamed.is_empty()
    }

    /// Total number of operations.
    pub fn len(&self) -> usize {
        self.added.len() + self.modified.len() + self.removed.len() + self.renamed.len()
    }
}

/// Returns the name of a `Requirement: <name>` header text.
pub fn requirement_name(header_text: &str) -> Option<&str> {
    header_text
        .trim()
        .strip_prefix(REQUIREMENT_PREFIX)
        .map(str::trim)
}

/// Extracts every requirement of a spec, regardless of section.
pub fn extract_requirements(doc: &Document) -> Vec<Requirement> {
    let mut extractor = Extractor::new(doc, Mode::Spec);
    doc.visit(&mut extractor);
    extractor.finish();
    extractor.requirements
}

/// Classifies the requirements of a change proposal by delta section.
pub fn extract_delta(doc: &Document) -> DeltaPlan {
    let mut extractor = Extractor::new(doc, Mode::Delta);
    doc.visit(&mut extractor);
    extractor.finish();
    debug!(
        "Extracted delta: {} added, {} modified, {} removed, {} renamed",
        extractor.plan.added.len(),
        extractor.plan.modified.len(),
        extractor.plan.removed.len(),
        extractor.plan.renamed.len()
    );
    extractor.plan
}

/// Returns true if the document has at least one delta section header,
/// even an empty one.
pub fn is_delta(doc: &Document) -> bool {
    doc.descendants().any(|node| match node.kind() {
        NodeKind::Header { text, .. } => Section::from_header(text) != Section::None,
        _ => false,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Spec,
    Delta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Added,
    Modified,
    Removed,
    Renamed,
}

impl Section {
    fn from_header(text: &str) -> Self {
        let text = text.to_ascii_lowercase();
        if !text.contains("requirements") {
            return Section::None;
        }
        [
            ("added", Section::Added),
            ("modified", Section::Modified),
            ("removed", Section::Removed),
            ("renamed", Section::Renamed),
        ]
        .into_iter()
        .find(|(keyword, _)| text.contains(&format!("{keyword} requirements")))
        .map_or(Section::None, |(_, section)| section)
    }
}

struct OpenRequirement {
    name: String,
    scenarios: Vec<String>,
    span: Span,
}

struct Extractor<'d> {
    doc: &'d Document,
    mode: Mode,
    section: Section,
    open: Option<OpenRequirement>,
    pending_from: Option<String>,
    requirements: Vec<Requirement>,
    plan: DeltaPlan,
}

impl<'d> Extractor<'d> {
    fn new(doc: &'d Document, mode: Mode) -> Self {
        Self {
            doc,
            mode,
            section: Section::None,
            open: None,
            pending_from: None,
            requirements: Vec::new(),
            plan: DeltaPlan::default(),
        }
    }

    /// Whether requirement blocks are captured in the current section.
    fn captures(&self) -> bool {
        match self.mode {
            Mode::Spec => true,
            Mode::Delta => matches!(self.section, Section::Added | Section::Modified),
        }
    }

    fn header(&mut self, node: NodeRef<'d>, level: u8, text: &str) {
        if level <= 2 {
            self.flush();
            if level == 2 {
                self.section = Section::from_header(text);
                self.pending_from = None;
            }
            return;
        }

        if level == 3
            && let Some(name) = requirement_name(text)
        {
            self.flush();
            if self.mode == Mode::Delta && self.section == Section::Removed {
                self.plan.removed.push(name.to_string());
            } else if self.captures() {
                self.open = Some(OpenRequirement {
                    name: name.to_string(),
                    scenarios: Vec::new(),
                    span: node.span(),
                });
            }
            return;
        }

        let Some(open) = self.open.as_mut() else {
            return;
        };
        if level == 4
            && let Some(scenario) = text.trim().strip_prefix(SCENARIO_PREFIX)
        {
            open.scenarios.push(scenario.trim().to_string());
        }
        open.span.end = node.span().end;
    }

    fn content(&mut self, node: NodeRef<'d>) {
        if node.node_type() == NodeType::BlankLines {
            return;
        }
        if self.mode == Mode::Delta && self.section == Section::Renamed {
            if node.node_type() == NodeType::List {
                self.renames(node);
            }
            return;
        }
        if let Some(open) = self.open.as_mut() {
            open.span.end = node.span().end;
        }
    }

    fn renames(&mut self, list: NodeRef<'d>) {
        for item in list.children() {
            let Some((label, name)) = rename_entry(item) else {
                continue;
            };
            match label {
                RenameLabel::From => self.pending_from = Some(name.to_string()),
                RenameLabel::To => {
                    if let Some(from) = self.pending_from.take() {
                        self.plan.renamed.push(RenameOp {
                            from,
                            to: name.to_string(),
                        });
                    }
                }
            }
        }
    }

    fn flush(&mut self) {
        let Some(open) = self.open.take() else {
            return;
        };
        let requirement = Requirement {
            name: open.name,
            raw_text: self.doc.slice(open.span).to_string(),
            scenarios: open.scenarios,
            span: open.span,
        };
        match (self.mode, self.section) {
            (Mode::Spec, _) => self.requirements.push(requirement),
            (Mode::Delta, Section::Added) => self.plan.added.push(requirement),
            (Mode::Delta, Section::Modified) => self.plan.modified.push(requirement),
            _ => {}
        }
    }

    fn finish(&mut self) {
        self.flush();
    }
}

impl<'d> Visitor<'d> for Extractor<'d> {
    fn enter_node(&mut self, node: NodeRef<'d>) -> VisitResult {
        if node.node_type() == NodeType::Document {
            return VisitResult::Continue;
        }
        match node.kind() {
            NodeKind::Header { level, text } => self.header(node, *level, text),
            _ => self.content(node),
        }
        VisitResult::SkipChildren
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenameLabel {
    From,
    To,
}

/// Reads `FROM: `### Requirement: Name`` from one list item.
fn rename_entry(item: NodeRef<'_>) -> Option<(RenameLabel, &str)> {
    let mut scan = RenameScan::default();
    item.document().visit_from(item.id(), &mut scan);
    Some((scan.label?, scan.name?))
}

#[derive(Default)]
struct RenameScan<'d> {
    label: Option<RenameLabel>,
    name: Option<&'d str>,
}

impl<'d> Visitor<'d> for RenameScan<'d> {
    // Nested lists belong to their own items.
    fn visit_list(&mut self, _node: NodeRef<'d>, _ordered: bool) -> VisitResult {
        VisitResult::SkipChildren
    }

    fn visit_text(&mut self, _node: NodeRef<'d>, text: &'d str) -> VisitResult {
        if self.label.is_none() && self.name.is_none() {
            let text = text.trim_start();
            if text.starts_with("FROM:") {
                self.label = Some(RenameLabel::From);
            } else if text.starts_with("TO:") {
                self.label = Some(RenameLabel::To);
            }
        }
        VisitResult::Continue
    }

    fn visit_inline_code(&mut self, _node: NodeRef<'d>, code: &'d str) -> VisitResult {
        if self.label.is_some() && self.name.is_none() {
            let header = code.trim().trim_start_matches('#');
            if let Some(name) = requirement_name(header) {
                self.name = Some(name);
                return VisitResult::Stop;
            }
        }
        VisitResult::Continue
    }
}
