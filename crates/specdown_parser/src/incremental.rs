//! Incremental re-parsing.
//!
//! # Overview
//!
//! [`incremental_update`] applies one text edit to a parsed document and
//! returns a new document that is structurally equal to parsing the edited
//! text from scratch. The previous document is left untouched.
//!
//! ## Strategy
//!
//! 1. **Inline fast path.** An edit that stays on one line, inside the
//!    inline content of a paragraph or header, and leaves the line's
//!    structural prefix alone only changes that block's inline children.
//!    Replacing a checkbox mark only flips the task's state.
//! 2. **Top-level window.** Otherwise parsing restarts at the last top-level
//!    block whose first line ends before the edit, and stops at the first
//!    line after the edit where the new parse is about to open a top-level
//!    block exactly where the old tree had one. Only the old blocks inside
//!    that window are replaced.
//!
//! In both cases every node outside the rebuilt region keeps its
//! [`NodeId`]; nodes after the edit are shifted by the length change.

use std::borrow::Cow;

use specdown_ast::{ByteRange, Document, NodeArena, NodeId, NodeKind, Span};
use tracing::debug;

use crate::ParseError;
use crate::lexer::{Lexer, Token};
use crate::parser::inline::{build_inlines, header_parts, task_data, trim_tokens};
use crate::parser::{BlockParser, alloc_parent};

/// An edit in both coordinate systems.
#[derive(Debug, Clone, Copy)]
struct Edit {
    start: u32,
    /// End of the replaced range in the old text.
    old_end: u32,
    /// End of the inserted text in the new text.
    new_end: u32,
}

impl Edit {
    fn delta(&self) -> i64 {
        i64::from(self.new_end) - i64::from(self.old_end)
    }
}

/// Replaces `edit` in the text of `prev` with `new_text` and re-parses.
///
/// The edit applies to what `prev` prints, so pending checkbox changes made
/// with [`Document::with_task_checked`] are kept.
///
/// # Errors
///
/// [`ParseError::IncrementalMismatch`] if `edit` is reversed, runs past the
/// end of the text or splits a character; [`ParseError::InputTooLarge`] if
/// the result no longer fits 32-bit offsets.
///
/// # Example
///
/// ```rust
/// use specdown_parser::{incremental_update, parse};
///
/// let doc = parse("# Title\n\nBody text\n").unwrap();
/// let edited = incremental_update(&doc, 9..13, "Main").unwrap();
///
/// assert_eq!(edited.source(), "# Title\n\nMain text\n");
/// assert!(edited.structurally_eq(&parse(edited.source()).unwrap()));
/// ```
pub fn incremental_update(
    prev: &Document,
    edit: ByteRange,
    new_text: &str,
) -> Result<Document, ParseError> {
    let base: Cow<'_, str> = if prev.has_patches() {
        Cow::Owned(prev.print())
    } else {
        Cow::Borrowed(prev.source())
    };

    let (start, end) = (edit.start, edit.end);
    if start > end || end > base.len() || !base.is_char_boundary(start) || !base.is_char_boundary(end)
    {
        return Err(ParseError::mismatch(start, end, base.len()));
    }
    let mut text = String::with_capacity(base.len() - (end - start) + new_text.len());
    text.push_str(&base[..start]);
    text.push_str(new_text);
    text.push_str(&base[end..]);
    ParseError::check_len(text.len())?;

    let edit = Edit {
        start: start as u32,
        old_end: end as u32,
        new_end: (start + new_text.len()) as u32,
    };
    let mut arena = prev.arena().clone();
    if fast_path(prev, &base, &text, edit, &mut arena) {
        debug!(start, end, inserted = new_text.len(), "incremental update on inline fast path");
    } else {
        let replaced = reparse_window(prev, &base, &text, edit, &mut arena);
        debug!(start, end, replaced, "incremental update re-parsed top-level window");
    }
    Ok(Document::new(text, arena, prev.root()))
}

// Fast path.

fn fast_path(prev: &Document, base: &str, text: &str, edit: Edit, arena: &mut NodeArena) -> bool {
    let removed = &base[edit.start as usize..edit.old_end as usize];
    let inserted = &text[edit.start as usize..edit.new_end as usize];
    if removed.contains(['\n', '\r']) || inserted.contains(['\n', '\r']) {
        return false;
    }

    if removed.len() == 1
        && matches!(inserted, " " | "x" | "X")
        && let Some(task) = task_at_mark(prev, edit.start)
    {
        if let Some(NodeKind::TaskItem(data)) = arena.get_mut(task).map(|node| &mut node.kind) {
            data.checked = inserted != " ";
        }
        return true;
    }

    let Some(block_id) = inline_block_at(prev, edit.start, edit.old_end) else {
        return false;
    };
    let Some(block) = prev.node(block_id) else {
        return false;
    };
    if edit.start < block.span.start || edit.old_end > content_end(base, block.span) {
        return false;
    }

    let line_start = line_start_before(base, edit.start as usize);
    let old_line = lex_line(base, line_start);
    let new_line = lex_line(text, line_start);
    let (Some(old_inline), Some(new_inline)) = (first_inline(&old_line), first_inline(&new_line))
    else {
        return false;
    };
    if old_inline != new_inline
        || old_line[..old_inline] != new_line[..new_inline]
        || edit.start < old_line[old_inline].span.start
    {
        return false;
    }

    // Everything below is decided; compute the replacement before touching
    // the arena.
    let delta = edit.delta();
    let new_span = Span::new(block.span.start, (i64::from(block.span.end) + delta) as u32);
    let (kind, tokens) = match &block.kind {
        NodeKind::Header { .. } => match header_parts(text, &new_line) {
            Some(parts) => (
                Some(NodeKind::Header {
                    level: parts.level,
                    text: parts.text,
                }),
                parts.inline,
            ),
            None => return false,
        },
        NodeKind::Paragraph => (None, paragraph_tokens(text, new_span)),
        _ => return false,
    };
    let task = block
        .parent
        .and_then(|parent| prev.node(parent).map(|node| (parent, node)))
        .filter(|(_, node)| {
            matches!(node.kind, NodeKind::TaskItem(_)) && node.span.start as usize == line_start
        })
        .and_then(|(parent, _)| task_data(text, &new_line).map(|data| (parent, data)));

    shift_around(arena, block.span, delta);
    for &child in &block.children {
        arena.free_subtree(child);
    }
    let children = build_inlines(text, trim_tokens(&tokens), arena);
    for &child in &children {
        if let Some(node) = arena.get_mut(child) {
            node.parent = Some(block_id);
        }
    }
    if let Some(node) = arena.get_mut(block_id) {
        node.children = children;
        if let Some(kind) = kind {
            node.kind = kind;
        }
    }
    if let Some((parent, data)) = task
        && let Some(node) = arena.get_mut(parent)
    {
        node.kind = NodeKind::TaskItem(data);
    }
    true
}

/// The task whose checkbox mark sits at `offset`.
fn task_at_mark(prev: &Document, offset: u32) -> Option<NodeId> {
    let mut current = prev.root();
    loop {
        let node = prev.node(current)?;
        if let NodeKind::TaskItem(task) = &node.kind
            && task.mark_offset == offset
        {
            return Some(current);
        }
        current = node
            .children
            .iter()
            .copied()
            .find(|&child| prev.node(child).is_some_and(|n| n.span.contains(offset)))?;
    }
}

/// Innermost paragraph or header whose span holds `start..end`.
fn inline_block_at(prev: &Document, start: u32, end: u32) -> Option<NodeId> {
    let mut current = prev.root();
    loop {
        let node = prev.node(current)?;
        if matches!(node.kind, NodeKind::Paragraph | NodeKind::Header { .. }) {
            return Some(current);
        }
        current = node.children.iter().copied().find(|&child| {
            prev.node(child)
                .is_some_and(|n| n.span.start <= start && end <= n.span.end)
        })?;
    }
}

fn lex_line(text: &str, start: usize) -> Vec<Token> {
    let mut tokens = Vec::new();
    Lexer::at(text, start).next_line(&mut tokens);
    tokens
}

fn first_inline(tokens: &[Token]) -> Option<usize> {
    tokens.iter().position(|t| t.kind.is_inline())
}

/// Tokens of the paragraph at `span`, lexed from the start of its first
/// line.
fn paragraph_tokens(text: &str, span: Span) -> Vec<Token> {
    let mut lexer = Lexer::at(text, line_start_before(text, span.start as usize));
    let mut tokens = Vec::new();
    while lexer.pos() < span.end as usize && lexer.next_line(&mut tokens) {}
    tokens.retain(|t| t.span.start >= span.start && t.span.end <= span.end);
    tokens
}

/// Shifts nodes that start at or after `anchor` and stretches the nodes
/// that contain it.
fn shift_around(arena: &mut NodeArena, anchor: Span, delta: i64) {
    if delta == 0 {
        return;
    }
    for (_, node) in arena.iter_mut() {
        if node.span.start >= anchor.end {
            node.span = node.span.shifted(delta);
            if let NodeKind::TaskItem(task) = &mut node.kind {
                task.mark_offset = (i64::from(task.mark_offset) + delta) as u32;
            }
        } else if node.span.start <= anchor.start && node.span.end >= anchor.end {
            node.span.end = (i64::from(node.span.end) + delta) as u32;
        }
    }
}

// Window re-parse.

fn reparse_window(
    prev: &Document,
    base: &str,
    text: &str,
    edit: Edit,
    arena: &mut NodeArena,
) -> usize {
    let root = prev.root();
    let blocks: Vec<(NodeId, Span, bool)> = prev
        .node(root)
        .map(|node| node.children.as_slice())
        .unwrap_or_default()
        .iter()
        .filter_map(|&id| {
            prev.node(id)
                .map(|n| (id, n.span, matches!(n.kind, NodeKind::BlankLines)))
        })
        .collect();

    // An edit at the end of an unterminated last line still extends that
    // line, so it only counts as behind the edit when strictly before it.
    let terminated = base.ends_with(['\n', '\r']);
    let first = blocks
        .iter()
        .rposition(|&(_, span, blank)| {
            let end = line_end_after(base, span.start as usize);
            let start = edit.start as usize;
            !blank && (end < start || (end == start && (end < base.len() || terminated)))
        })
        .unwrap_or(0);
    let restart = blocks.get(first).map_or(0, |&(_, span, _)| span.start);
    let starts: Vec<u32> = blocks.iter().map(|&(_, span, _)| span.start).collect();

    let delta = edit.delta();
    let mut parser = BlockParser::new(text, restart as usize, arena);
    let stop = loop {
        let Some(line) = parser.next_line_start() else {
            break base.len() as u32;
        };
        if line >= edit.new_end {
            let old = i64::from(line) - delta;
            if let Ok(old) = u32::try_from(old)
                && starts.binary_search(&old).is_ok()
                && parser.next_starts_top_level()
            {
                break old;
            }
        }
        parser.step();
    };
    let fresh = parser.finish();

    let last = starts.partition_point(|&start| start < stop).max(first);
    for &(id, _, _) in &blocks[first..last] {
        arena.free_subtree(id);
    }
    for &(id, _, _) in &blocks[last..] {
        shift_subtree(arena, id, delta);
    }

    let mut children: Vec<NodeId> = Vec::with_capacity(blocks.len() + fresh.len());
    children.extend(blocks[..first].iter().map(|&(id, _, _)| id));
    children.extend(fresh.iter().copied());
    children.extend(blocks[last..].iter().map(|&(id, _, _)| id));
    for &id in &fresh {
        if let Some(node) = arena.get_mut(id) {
            node.parent = Some(root);
        }
    }
    if let Some(node) = arena.get_mut(root) {
        node.children = children;
        node.span = Span::new(0, text.len() as u32);
    } else {
        alloc_parent(
            arena,
            NodeKind::Document,
            Span::new(0, text.len() as u32),
            children,
        );
    }
    last - first
}

fn shift_subtree(arena: &mut NodeArena, id: NodeId, delta: i64) {
    if delta == 0 {
        return;
    }
    let mut stack = vec![id];
    while let Some(current) = stack.pop() {
        let Some(node) = arena.get_mut(current) else {
            continue;
        };
        node.span = node.span.shifted(delta);
        if let NodeKind::TaskItem(task) = &mut node.kind {
            task.mark_offset = (i64::from(task.mark_offset) + delta) as u32;
        }
        stack.extend(node.children.iter().copied());
    }
}

// Line helpers over raw text.

fn line_start_before(text: &str, offset: usize) -> usize {
    text[..offset].rfind(['\n', '\r']).map_or(0, |i| i + 1)
}

/// Offset just past the terminator of the line starting at `start`.
fn line_end_after(text: &str, start: usize) -> usize {
    let bytes = text.as_bytes();
    match text[start..].find(['\n', '\r']) {
        Some(i) => {
            let at = start + i;
            if bytes[at] == b'\r' && bytes.get(at + 1) == Some(&b'\n') {
                at + 2
            } else {
                at + 1
            }
        }
        None => text.len(),
    }
}

/// End of `span` without its final line terminator.
fn content_end(text: &str, span: Span) -> u32 {
    let bytes = &text.as_bytes()[span.range()];
    let cut = match bytes {
        [.., b'\r', b'\n'] => 2,
        [.., b'\n' | b'\r'] => 1,
        _ => 0,
    };
    span.end - cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn apply(text: &str, edit: ByteRange, new_text: &str) -> String {
        format!("{}{}{}", &text[..edit.start], new_text, &text[edit.end..])
    }

    fn assert_equivalent(text: &str, edit: ByteRange, new_text: &str) -> Document {
        let prev = parse(text).unwrap();
        let next = incremental_update(&prev, edit.clone(), new_text).unwrap();
        let expected = apply(text, edit, new_text);
        assert_eq!(next.source(), expected);
        let fresh = parse(&expected).unwrap();
        assert_eq!(next.dump(), fresh.dump());
        assert!(next.structurally_eq(&fresh));
        next
    }

    const DOC: &str = "# Title\n\nIntro *text* here.\n\n## Tasks\n- [ ] 1 First\n  - [x] 1.1 Nested\n- [ ] 2 Second\n\n```\ncode\n```\n";

    #[rstest]
    #[case::paragraph_word(DOC.find("text").unwrap(), 4, "words")]
    #[case::header_text(2, 5, "Heading")]
    #[case::task_description(DOC.find("First").unwrap(), 5, "Primary")]
    #[case::insert_emphasis(DOC.find("here").unwrap(), 0, "**bold** ")]
    #[case::break_paragraph(DOC.find(" here").unwrap(), 0, "\n\n")]
    #[case::join_blocks(DOC.find("\n\n## Tasks").unwrap(), 2, " ")]
    #[case::turn_text_into_header(9, 0, "# ")]
    #[case::outdent_nested(DOC.find("  - [x]").unwrap(), 2, "")]
    #[case::open_fence(DOC.find("- [ ] 2").unwrap(), 0, "```\n")]
    #[case::delete_closing_fence(DOC.rfind("```").unwrap(), 3, "")]
    #[case::append_at_end(DOC.len(), 0, "tail")]
    #[case::prepend(0, 0, "intro\n")]
    #[case::delete_everything(0, DOC.len(), "")]
    #[case::change_task_id(DOC.find("2 Second").unwrap(), 1, "3")]
    fn test_matches_full_parse(#[case] at: usize, #[case] len: usize, #[case] new_text: &str) {
        assert_equivalent(DOC, at..at + len, new_text);
    }

    #[rstest]
    #[case::append_to_unterminated_list_marker("para\n-", "x")]
    #[case::append_to_unterminated_header_marker("para\n#", "x")]
    #[case::append_after_unterminated_paragraph("para", "\n- x")]
    fn test_append_to_unterminated_last_line(#[case] text: &str, #[case] new_text: &str) {
        let next = assert_equivalent(text, text.len()..text.len(), new_text);
        assert_eq!(next.print(), format!("{text}{new_text}"));
    }

    #[test]
    fn test_fast_path_keeps_sibling_ids() {
        let prev = parse(DOC).unwrap();
        let header = prev.query("h2").unwrap().next().unwrap().id();
        let at = DOC.find("text").unwrap();
        let next = incremental_update(&prev, at..at + 4, "prose").unwrap();

        let moved = next.get(header).unwrap();
        assert_eq!(moved.display_text(), "Tasks");
        assert_eq!(moved.span().start as usize, DOC.find("## Tasks").unwrap() + 1);
    }

    #[test]
    fn test_window_keeps_ids_outside_the_window() {
        let prev = parse(DOC).unwrap();
        let title = prev.top_level().next().unwrap().id();
        let code = prev.query("code").unwrap().next().unwrap().id();
        let at = DOC.find("  - [x]").unwrap();
        let next = incremental_update(&prev, at..at + 2, "").unwrap();

        assert!(next.get(title).is_some());
        assert_eq!(next.get(code).unwrap().display_text(), "code\n");
    }

    #[test]
    fn test_checkbox_edit_flips_state() {
        let prev = parse(DOC).unwrap();
        let mark = DOC.find("[ ] 1 First").unwrap() + 1;
        let next = assert_equivalent(DOC, mark..mark + 1, "X");
        let task = next.query("task[id=1]").unwrap().next().unwrap();
        assert!(task.kind().as_task().unwrap().checked);
        assert_eq!(task.id(), prev.query("task[id=1]").unwrap().next().unwrap().id());
    }

    #[test]
    fn test_edit_applies_on_top_of_pending_toggle() {
        let prev = parse("- [ ] 1 a\n").unwrap();
        let task = prev.query("task").unwrap().next().unwrap().id();
        let toggled = prev.with_task_checked(task, true).unwrap();
        let next = incremental_update(&toggled, 8..9, "b").unwrap();
        assert_eq!(next.source(), "- [x] 1 b\n");
        assert!(!next.has_patches());
    }

    #[rstest]
    #[case::reversed(ByteRange { start: 5, end: 2 })]
    #[case::past_end(0..999)]
    fn test_rejects_bad_ranges(#[case] edit: ByteRange) {
        let prev = parse(DOC).unwrap();
        let err = incremental_update(&prev, edit.clone(), "x").unwrap_err();
        assert_eq!(
            err,
            ParseError::IncrementalMismatch {
                start: edit.start,
                end: edit.end,
                len: DOC.len()
            }
        );
    }

    #[test]
    fn test_rejects_split_character() {
        let prev = parse("é\n").unwrap();
        assert!(matches!(
            incremental_update(&prev, 1..1, "x"),
            Err(ParseError::IncrementalMismatch { .. })
        ));
    }
}
