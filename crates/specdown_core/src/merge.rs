//! Applying a [`DeltaPlan`] to its base spec.
//!
//! Every operation becomes a byte-range edit on the base source, and the
//! edits are applied from the end of the text to the beginning. Bytes no
//! edit touches come through unchanged.

use std::collections::HashMap;

use serde::Serialize;
use specdown_ast::{Document, NodeKind, NodeRef, NodeType, Span};
use tracing::{debug, info};

use crate::error::CoreError;
use crate::extract::{DeltaPlan, Requirement, extract_requirements, requirement_name};

/// Operation counts of an applied delta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    pub added: usize,
    pub modified: usize,
    pub removed: usize,
    pub renamed: usize,
}

/// The merged spec.
#[derive(Debug)]
pub struct MergeOutcome {
    pub document: Document,
    pub summary: MergeSummary,
}

impl MergeOutcome {
    /// The merged text.
    pub fn text(&self) -> &str {
        self.document.source()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Claim {
    Modified,
    Removed,
    Renamed,
}

#[derive(Debug)]
struct Edit {
    span: Span,
    text: String,
}

/// Applies `delta` to `base`.
///
/// - RENAMED rewrites only the name in the requirement's header line.
/// - REMOVED deletes the requirement block and the blank lines after it.
/// - MODIFIED replaces the block with the delta's text. A MODIFIED entry
///   may use the new name of a renamed requirement.
/// - ADDED blocks go after the last remaining requirement, else under a
///   `## Requirements` header, which is created if missing.
///
/// Fails without partial results if a name does not resolve or one
/// requirement is the subject of conflicting operations.
pub fn apply_delta(base: &Document, delta: &DeltaPlan) -> Result<MergeOutcome, CoreError> {
    let printed;
    let base = if base.has_patches() {
        printed = specdown_parser::parse(&base.print())?;
        &printed
    } else {
        base
    };

    let requirements = extract_requirements(base);
    let find = |name: &str| requirements.iter().find(|r| r.name == name);
    let mut claims: HashMap<&str, Claim> = HashMap::new();
    let mut edits = Vec::new();

    for modified in &delta.modified {
        let target = find(modified.name.as_str()).or_else(|| {
            delta
                .renamed
                .iter()
                .find(|r| r.to == modified.name)
                .and_then(|r| find(r.from.as_str()))
        });
        let target = target.ok_or_else(|| {
            CoreError::merge(format!(
                "MODIFIED requirement `{}` not found in base spec",
                modified.name
            ))
        })?;
        claim(&mut claims, target, Claim::Modified)?;
        edits.push(Edit {
            span: target.span,
            text: replacement(base, target, &modified.raw_text),
        });
    }

    for name in &delta.removed {
        let target = find(name.as_str()).ok_or_else(|| {
            CoreError::merge(format!("REMOVED requirement `{name}` not found in base spec"))
        })?;
        claim(&mut claims, target, Claim::Removed)?;
        edits.push(Edit {
            span: removal_extent(base, target.span),
            text: String::new(),
        });
    }

    for rename in &delta.renamed {
        let target = find(rename.from.as_str()).ok_or_else(|| {
            CoreError::merge(format!(
                "RENAMED requirement `{}` not found in base spec",
                rename.from
            ))
        })?;
        if find(rename.to.as_str()).is_some_and(|r| !claims.contains_key(r.name.as_str())) {
            return Err(CoreError::merge(format!(
                "cannot rename `{}` to `{}`: a requirement with that name exists",
                rename.from, rename.to
            )));
        }
        if claims.get(target.name.as_str()) == Some(&Claim::Modified) {
            // The replacement text already carries the new header.
            debug!("Rename of `{}` folded into its modification", rename.from);
            continue;
        }
        claim(&mut claims, target, Claim::Renamed)?;
        edits.push(rename_edit(base, target, &rename.to)?);
    }

    for added in &delta.added {
        let clashes = find(added.name.as_str()).is_some_and(|r| {
            !matches!(
                claims.get(r.name.as_str()),
                Some(Claim::Removed | Claim::Renamed)
            )
        }) || delta.renamed.iter().any(|r| r.to == added.name);
        if clashes {
            return Err(CoreError::merge(format!(
                "ADDED requirement `{}` already exists in base spec",
                added.name
            )));
        }
    }
    if !delta.added.is_empty() {
        let anchor = requirements
            .iter()
            .rev()
            .find(|r| claims.get(r.name.as_str()) != Some(&Claim::Removed));
        edits.push(addition(base, anchor, &delta.added));
    }

    let text = apply_edits(base.source(), edits)?;
    let document = specdown_parser::parse(&text)?;
    let summary = MergeSummary {
        added: delta.added.len(),
        modified: delta.modified.len(),
        removed: delta.removed.len(),
        renamed: delta.renamed.len(),
    };
    info!(
        "Merged delta: {} added, {} modified, {} removed, {} renamed",
        summary.added, summary.modified, summary.removed, summary.renamed
    );
    Ok(MergeOutcome { document, summary })
}

fn claim<'r>(
    claims: &mut HashMap<&'r str, Claim>,
    target: &'r Requirement,
    claim: Claim,
) -> Result<(), CoreError> {
    match claims.insert(target.name.as_str(), claim) {
        Some(previous) => Err(CoreError::merge(format!(
            "requirement `{}` is both {} and {}",
            target.name,
            previous.verb(),
            claim.verb()
        ))),
        None => Ok(()),
    }
}

impl Claim {
    fn verb(self) -> &'static str {
        match self {
            Claim::Modified => "modified",
            Claim::Removed => "removed",
            Claim::Renamed => "renamed",
        }
    }
}

/// The delta's block, newline-terminated if the block it replaces was.
fn replacement(base: &Document, target: &Requirement, raw: &str) -> String {
    if base.slice(target.span).ends_with('\n') && !raw.ends_with('\n') {
        format!("{raw}\n")
    } else {
        raw.to_string()
    }
}

/// Extends a removed block over the blank lines that separate it from the
/// next block. A final block takes the blank lines before it instead.
fn removal_extent(base: &Document, span: Span) -> Span {
    let blocks: Vec<NodeRef<'_>> = base.top_level().collect();
    let mut end = span.end;
    for block in blocks.iter().filter(|b| b.span().start >= span.end) {
        if block.node_type() != NodeType::BlankLines {
            return Span::new(span.start, end);
        }
        end = block.span().end;
    }
    let start = blocks
        .iter()
        .rev()
        .filter(|b| b.span().end <= span.start)
        .take_while(|b| b.node_type() == NodeType::BlankLines)
        .last()
        .map_or(span.start, |b| b.span().start);
    Span::new(start, end)
}

/// Replaces the name, and only the name, in a requirement header line.
fn rename_edit(base: &Document, target: &Requirement, to: &str) -> Result<Edit, CoreError> {
    let not_found = || {
        CoreError::internal(format!(
            "header of requirement `{}` not found at {}",
            target.name, target.span.start
        ))
    };
    let header = base
        .top_level()
        .find(|b| b.span().start == target.span.start)
        .filter(|b| {
            matches!(b.kind(), NodeKind::Header { text, .. } if requirement_name(text).is_some())
        })
        .ok_or_else(not_found)?;

    let line = header.text();
    let after_label = line.find("Requirement:").ok_or_else(not_found)? + "Requirement:".len();
    let offset = line[after_label..]
        .find(target.name.as_str())
        .ok_or_else(not_found)?
        + after_label;
    let start = header.span().start + offset as u32;
    Ok(Edit {
        span: Span::new(start, start + target.name.len() as u32),
        text: to.to_string(),
    })
}

/// One insertion holding every ADDED block.
fn addition(base: &Document, anchor: Option<&Requirement>, added: &[Requirement]) -> Edit {
    let source = base.source();
    let (at, heading) = match anchor {
        Some(requirement) => (requirement.span.end as usize, false),
        None => match requirements_header(base) {
            Some(header) => (header.span().end as usize, false),
            None => (source.len(), true),
        },
    };

    let mut text = String::new();
    if at > 0 && !source[..at].ends_with('\n') {
        text.push('\n');
    }
    if heading {
        if at > 0 {
            text.push('\n');
        }
        text.push_str("## Requirements\n");
    }
    for requirement in added {
        text.push('\n');
        text.push_str(&requirement.raw_text);
        if !requirement.raw_text.ends_with('\n') {
            text.push('\n');
        }
    }
    Edit {
        span: Span::new(at as u32, at as u32),
        text,
    }
}

fn requirements_header(base: &Document) -> Option<NodeRef<'_>> {
    base.top_level().find(|b| match b.kind() {
        NodeKind::Header { level: 2, text } => text.trim().eq_ignore_ascii_case("requirements"),
        _ => false,
    })
}

/// Applies edits back to front. Adjacent or overlapping deletions are
/// merged; any other overlap is a conflict.
fn apply_edits(source: &str, mut edits: Vec<Edit>) -> Result<String, CoreError> {
    edits.sort_by_key(|e| (e.span.start, e.span.end));

    let mut merged: Vec<Edit> = Vec::with_capacity(edits.len());
    for edit in edits {
        if let Some(last) = merged.last_mut() {
            let both_deletions = last.text.is_empty() && edit.text.is_empty();
            if both_deletions && edit.span.start <= last.span.end {
                last.span.end = last.span.end.max(edit.span.end);
                continue;
            }
            if edit.span.start < last.span.end {
                return Err(CoreError::merge(format!(
                    "conflicting edits at {}..{} and {}..{}",
                    last.span.start, last.span.end, edit.span.start, edit.span.end
                )));
            }
        }
        merged.push(edit);
    }

    let mut result = source.to_string();
    for edit in merged.iter().rev() {
        let range = edit.span.range();
        if !result.is_char_boundary(range.start) || !result.is_char_boundary(range.end) {
            return Err(CoreError::internal(format!(
                "edit {}..{} outside document of {} bytes",
                range.start,
                range.end,
                result.len()
            )));
        }
        debug!("Applying edit [{}..{}]", range.start, range.end);
        result.replace_range(range, &edit.text);
    }
    Ok(result)
}
