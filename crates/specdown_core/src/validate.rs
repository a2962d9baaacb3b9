//! Structural validation of specs and change proposals.
//!
//! Extraction is permissive; this module is where missing scenarios,
//! duplicate names and deltas that do not fit their base spec become
//! [`Issue`]s.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use serde::Serialize;
use specdown_ast::{Document, Location, NodeType, Span};

use crate::config::ValidationConfig;
use crate::extract::{
    DeltaPlan, Requirement, extract_delta, extract_requirements, requirement_name,
};

/// Severity of an [`Issue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub severity: Severity,
    pub message: String,
    pub span: Span,
    pub location: Location,
}

impl Issue {
    fn new(doc: &Document, severity: Severity, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity,
            message: message.into(),
            span,
            location: doc.location(span),
        }
    }
}

/// Options for [`validate_spec`] and [`validate_delta`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Missing scenarios are errors when true, warnings otherwise.
    pub require_scenarios: bool,
    /// Warnings count as failures.
    pub strict: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            require_scenarios: true,
            strict: false,
        }
    }
}

impl From<&ValidationConfig> for ValidationOptions {
    fn from(config: &ValidationConfig) -> Self {
        Self {
            require_scenarios: config.require_scenarios,
            strict: config.strict,
        }
    }
}

impl ValidationOptions {
    /// Returns true if `issues` should fail validation.
    pub fn fails(&self, issues: &[Issue]) -> bool {
        issues
            .iter()
            .any(|i| i.severity == Severity::Error || self.strict)
    }

    fn scenario_severity(&self) -> Severity {
        if self.require_scenarios {
            Severity::Error
        } else {
            Severity::Warning
        }
    }
}

/// Validates a spec document.
pub fn validate_spec(doc: &Document, options: &ValidationOptions) -> Vec<Issue> {
    let requirements = extract_requirements(doc);
    let mut issues = Vec::new();

    if requirements.is_empty() {
        issues.push(Issue::new(
            doc,
            Severity::Warning,
            "no requirements found",
            Span::new(0, 0),
        ));
    }
    check_requirements(doc, &requirements, options, &mut issues);
    issues
}

/// Validates a change proposal, optionally against the spec it modifies.
pub fn validate_delta(
    delta: &Document,
    base: Option<&Document>,
    options: &ValidationOptions,
) -> Vec<Issue> {
    let plan = extract_delta(delta);
    let mut issues = Vec::new();

    if plan.is_empty() {
        issues.push(Issue::new(
            delta,
            Severity::Error,
            "delta has no ADDED, MODIFIED, REMOVED or RENAMED requirements",
            Span::new(0, 0),
        ));
        return issues;
    }

    let changed: Vec<Requirement> = plan
        .added
        .iter()
        .chain(&plan.modified)
        .cloned()
        .collect();
    check_requirements(delta, &changed, options, &mut issues);

    // A name may be the subject of one operation only.
    let mut seen = HashSet::new();
    for name in plan
        .removed
        .iter()
        .chain(plan.renamed.iter().map(|r| &r.from))
    {
        if changed.iter().any(|r| &r.name == name) || !seen.insert(name.as_str()) {
            issues.push(Issue::new(
                delta,
                Severity::Error,
                format!("requirement `{name}` appears in more than one operation"),
                header_span(delta, name),
            ));
        }
    }

    let mut targets = HashSet::new();
    for rename in &plan.renamed {
        if !targets.insert(rename.to.as_str())
            || plan.added.iter().any(|r| r.name == rename.to)
        {
            issues.push(Issue::new(
                delta,
                Severity::Error,
                format!("rename target `{}` collides with another requirement", rename.to),
                code_span(delta, &rename.to),
            ));
        }
    }

    if let Some(base) = base {
        check_against_base(delta, &plan, base, &mut issues);
    }
    issues.sort_by_key(|i| i.span.start);
    issues
}

/// Names the delta expects to exist, or not to exist, in `base`.
fn check_against_base(
    delta: &Document,
    plan: &DeltaPlan,
    base: &Document,
    issues: &mut Vec<Issue>,
) {
    let existing: HashSet<String> = extract_requirements(base)
        .into_iter()
        .map(|r| r.name)
        .collect();
    let renamed_away: HashSet<&str> = plan
        .removed
        .iter()
        .chain(plan.renamed.iter().map(|r| &r.from))
        .map(String::as_str)
        .collect();

    for requirement in &plan.added {
        if existing.contains(&requirement.name) {
            issues.push(Issue::new(
                delta,
                Severity::Error,
                format!("ADDED requirement `{}` already exists", requirement.name),
                requirement.span,
            ));
        }
    }
    for requirement in &plan.modified {
        let via_rename = plan.renamed.iter().any(|r| r.to == requirement.name);
        if !existing.contains(&requirement.name) && !via_rename {
            issues.push(Issue::new(
                delta,
                Severity::Error,
                format!("MODIFIED requirement `{}` does not exist", requirement.name),
                requirement.span,
            ));
        }
    }
    for name in &plan.removed {
        if !existing.contains(name) {
            issues.push(Issue::new(
                delta,
                Severity::Error,
                format!("REMOVED requirement `{name}` does not exist"),
                header_span(delta, name),
            ));
        }
    }
    for rename in &plan.renamed {
        if !existing.contains(&rename.from) {
            issues.push(Issue::new(
                delta,
                Severity::Error,
                format!("RENAMED requirement `{}` does not exist", rename.from),
                code_span(delta, &rename.from),
            ));
        }
        if existing.contains(&rename.to) && !renamed_away.contains(rename.to.as_str()) {
            issues.push(Issue::new(
                delta,
                Severity::Error,
                format!("rename target `{}` already exists", rename.to),
                code_span(delta, &rename.to),
            ));
        }
    }
}

/// Missing scenarios and duplicate names.
fn check_requirements(
    doc: &Document,
    requirements: &[Requirement],
    options: &ValidationOptions,
    issues: &mut Vec<Issue>,
) {
    let mut first_seen: HashMap<&str, Span> = HashMap::new();
    for requirement in requirements {
        if requirement.scenarios.is_empty() {
            issues.push(Issue::new(
                doc,
                options.scenario_severity(),
                format!("requirement `{}` has no scenarios", requirement.name),
                requirement.span,
            ));
        }
        match first_seen.entry(requirement.name.as_str()) {
            Entry::Occupied(first) => {
                let line = doc.location(*first.get()).start.line;
                issues.push(Issue::new(
                    doc,
                    Severity::Error,
                    format!(
                        "duplicate requirement `{}` (first defined on line {line})",
                        requirement.name
                    ),
                    requirement.span,
                ));
            }
            Entry::Vacant(slot) => {
                slot.insert(requirement.span);
            }
        }
    }
}

/// Span of the first `Requirement: <name>` header.
fn header_span(doc: &Document, name: &str) -> Span {
    doc.descendants()
        .filter(|node| node.node_type() == NodeType::Header)
        .find(|node| requirement_name(node.display_text()) == Some(name))
        .map_or(Span::new(0, 0), |node| node.span())
}

/// Span of the first inline code naming the requirement.
fn code_span(doc: &Document, name: &str) -> Span {
    doc.descendants()
        .filter(|node| node.node_type() == NodeType::InlineCode)
        .find(|node| {
            requirement_name(node.text().trim_matches('`').trim_start_matches('#')) == Some(name)
        })
        .map_or(Span::new(0, 0), |node| node.span())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use specdown_parser::parse;

    const BASE: &str = "\
## Requirements

### Requirement: Login
#### Scenario: Valid

### Requirement: Logout
#### Scenario: Click
";

    fn messages(issues: &[Issue]) -> Vec<&str> {
        issues.iter().map(|i| i.message.as_str()).collect()
    }

    #[test]
    fn test_valid_spec_has_no_issues() {
        let doc = parse(BASE).unwrap();
        assert_eq!(validate_spec(&doc, &ValidationOptions::default()), vec![]);
    }

    #[rstest]
    #[case::required(true, Severity::Error)]
    #[case::optional(false, Severity::Warning)]
    fn test_missing_scenarios(#[case] require_scenarios: bool, #[case] severity: Severity) {
        let doc = parse("# S\n\n### Requirement: Bare\nText.\n").unwrap();
        let options = ValidationOptions {
            require_scenarios,
            strict: false,
        };
        let issues = validate_spec(&doc, &options);
        assert_eq!(messages(&issues), vec!["requirement `Bare` has no scenarios"]);
        assert_eq!(issues[0].severity, severity);
        assert_eq!(issues[0].location.start.line, 3);
        assert_eq!(options.fails(&issues), require_scenarios);
    }

    #[test]
    fn test_strict_fails_on_warnings() {
        let doc = parse("# Empty\n").unwrap();
        let issues = validate_spec(&doc, &ValidationOptions::default());
        assert_eq!(issues[0].severity, Severity::Warning);
        assert!(!ValidationOptions::default().fails(&issues));
        let strict = ValidationOptions {
            strict: true,
            ..Default::default()
        };
        assert!(strict.fails(&issues));
    }

    #[test]
    fn test_duplicate_requirement() {
        let src = "### Requirement: A\n#### Scenario: x\n### Requirement: A\n#### Scenario: y\n";
        let issues = validate_spec(&parse(src).unwrap(), &ValidationOptions::default());
        assert_eq!(
            messages(&issues),
            vec!["duplicate requirement `A` (first defined on line 1)"]
        );
        assert_eq!(issues[0].location.start.line, 3);
    }

    #[test]
    fn test_empty_delta() {
        let doc = parse("# Change\n\n## Why\nBecause.\n").unwrap();
        let issues = validate_delta(&doc, None, &ValidationOptions::default());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Error);
    }

    #[test]
    fn test_delta_against_base() {
        let delta = "\
## ADDED Requirements
### Requirement: Login
#### Scenario: Again

## MODIFIED Requirements
### Requirement: Signup
#### Scenario: New

## REMOVED Requirements
### Requirement: Forgotten

## RENAMED Requirements
- FROM: `### Requirement: Missing`
- TO: `### Requirement: Logout`
";
        let delta = parse(delta).unwrap();
        let base = parse(BASE).unwrap();
        let issues = validate_delta(&delta, Some(&base), &ValidationOptions::default());
        assert_eq!(
            messages(&issues),
            vec![
                "ADDED requirement `Login` already exists",
                "MODIFIED requirement `Signup` does not exist",
                "REMOVED requirement `Forgotten` does not exist",
                "RENAMED requirement `Missing` does not exist",
                "rename target `Logout` already exists",
            ]
        );
        assert!(issues.iter().all(|i| i.location.start.line > 1));
    }

    #[test]
    fn test_valid_delta_against_base() {
        let delta = "\
## MODIFIED Requirements
### Requirement: Sign out
#### Scenario: Click

## RENAMED Requirements
- FROM: `### Requirement: Logout`
- TO: `### Requirement: Sign out`
";
        let issues = validate_delta(
            &parse(delta).unwrap(),
            Some(&parse(BASE).unwrap()),
            &ValidationOptions::default(),
        );
        assert_eq!(issues, vec![]);
    }

    #[test]
    fn test_conflicting_operations_without_base() {
        let delta = "\
## ADDED Requirements
### Requirement: B
#### Scenario: s

## REMOVED Requirements
### Requirement: A

## RENAMED Requirements
- FROM: `### Requirement: A`
- TO: `### Requirement: B`
";
        let issues = validate_delta(&parse(delta).unwrap(), None, &ValidationOptions::default());
        assert_eq!(
            messages(&issues),
            vec![
                "requirement `A` appears in more than one operation",
                "rename target `B` collides with another requirement",
            ]
        );
    }
}
