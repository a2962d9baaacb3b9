//! Block and inline parsing.
//!
//! # Overview
//!
//! [`parse`] turns text into a [`Document`]. It never fails on valid UTF-8
//! text; unrecognized constructs degrade to paragraphs and text.
//!
//! ## Architecture
//!
//! ```text
//! LineReader (lexes lines lazily)
//!     -> classify (blank / heading / fence / item / text)
//!     -> BlockParser (frame stack of lists and items)
//!     -> build_inlines (paragraph and header content)
//! ```
//!
//! The same [`BlockParser`] is started mid-document by the incremental
//! updater, which is why it can report whether its next line begins a new
//! top-level block.

mod block;
pub(crate) mod inline;
pub(crate) mod lines;

use specdown_ast::{Document, Node, NodeArena, NodeId, NodeKind, Span};
use tracing::trace;

use crate::ParseError;
pub(crate) use block::BlockParser;

/// Parses text into a document.
///
/// # Example
///
/// ```rust
/// let doc = specdown_parser::parse("# Title\n\n- [ ] 1 Do it\n").unwrap();
/// assert_eq!(doc.print(), "# Title\n\n- [ ] 1 Do it\n");
/// assert_eq!(doc.query("task").unwrap().count(), 1);
/// ```
pub fn parse(text: &str) -> Result<Document, ParseError> {
    ParseError::check_len(text.len())?;
    let mut arena = NodeArena::with_capacity(text.len() / 8 + 1);
    let children = BlockParser::new(text, 0, &mut arena).run();
    let root = alloc_parent(
        &mut arena,
        NodeKind::Document,
        Span::new(0, text.len() as u32),
        children,
    );
    trace!(bytes = text.len(), nodes = arena.len(), "parsed document");
    Ok(Document::new(text, arena, root))
}

/// Parses raw bytes, rejecting invalid UTF-8.
pub fn parse_bytes(bytes: &[u8]) -> Result<Document, ParseError> {
    ParseError::check_len(bytes.len())?;
    let text = std::str::from_utf8(bytes).map_err(ParseError::encoding)?;
    parse(text)
}

/// Allocates a node that owns `children` and points them back at it.
pub(crate) fn alloc_parent(
    arena: &mut NodeArena,
    kind: NodeKind,
    span: Span,
    children: Vec<NodeId>,
) -> NodeId {
    let id = arena.alloc(Node::with_children(kind, span, children));
    let children = arena
        .get(id)
        .map(|node| node.children.clone())
        .unwrap_or_default();
    for child in children {
        if let Some(node) = arena.get_mut(child) {
            node.parent = Some(id);
        }
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_header_blank_and_paragraph() {
        let doc = parse("# Title\n\nSome *text*.\n").unwrap();
        insta::assert_snapshot!(doc.dump(), @r#"
        Document @0..22
          Header(1) "Title" @0..8
            Text "Title" @2..7
          BlankLines @8..9
          Paragraph @9..22
            Text "Some " @9..14
            Emphasis @14..20
              Text "text" @15..19
            Text "." @20..21
        "#);
    }

    #[test]
    fn test_nested_task_list() {
        let doc = parse("- [ ] 1 Parent\n  - [x] 1.1 Child\n- Plain\n").unwrap();
        insta::assert_snapshot!(doc.dump(), @r#"
        Document @0..41
          List @0..41
            TaskItem[ ] 1 "Parent" @0..33
              Paragraph @8..15
                Text "Parent" @8..14
              List @15..33
                TaskItem[x] 1.1 "Child" @15..33
                  Paragraph @27..33
                    Text "Child" @27..32
            ListItem @33..41
              Paragraph @35..41
                Text "Plain" @35..40
        "#);
    }

    #[test]
    fn test_fenced_code_block() {
        let doc = parse("```rust\nfn main() {}\n```\ntail").unwrap();
        insta::assert_snapshot!(doc.dump(), @r#"
        Document @0..29
          CodeBlock(rust) @0..25
          Paragraph @25..29
            Text "tail" @25..29
        "#);
        let code = doc.query("code").unwrap().next().unwrap();
        assert_eq!(code.display_text(), "fn main() {}\n");
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        let doc = parse("~~~\n# not a header\n").unwrap();
        let blocks: Vec<_> = doc.top_level().map(|b| b.node_type()).collect();
        assert_eq!(blocks, vec![specdown_ast::NodeType::CodeBlock]);
        let code = doc.top_level().next().unwrap();
        assert_eq!(code.display_text(), "# not a header\n");
    }

    #[test]
    fn test_blank_line_inside_item() {
        let doc = parse("- a\n\n  b\n").unwrap();
        insta::assert_snapshot!(doc.dump(), @r#"
        Document @0..9
          List @0..9
            ListItem @0..9
              Paragraph @2..4
                Text "a" @2..3
              BlankLines @4..5
              Paragraph @5..9
                Text "b" @7..8
        "#);
    }

    #[test]
    fn test_blank_line_between_items_stays_in_list() {
        let doc = parse("- a\n\n- b\n").unwrap();
        assert_eq!(doc.top_level().count(), 1);
        assert_eq!(doc.query("list > item").unwrap().count(), 2);
        assert_eq!(doc.query("item > blank").unwrap().count(), 1);
    }

    #[test]
    fn test_lazy_continuation() {
        let doc = parse("- a\nb\n").unwrap();
        let para = doc.query("item > paragraph").unwrap().next().unwrap();
        assert_eq!(para.text(), "a\nb\n");
    }

    #[rstest]
    #[case::marker_kind("1. a\n- b\n", 2)]
    #[case::same_kind("- a\n* b\n", 1)]
    #[case::paragraph_between("- a\n\nx\n\n- b\n", 5)]
    fn test_list_splitting(#[case] src: &str, #[case] top_level: usize) {
        assert_eq!(parse(src).unwrap().top_level().count(), top_level);
    }

    #[rstest]
    #[case::empty("")]
    #[case::only_blank("\n\n   \n")]
    #[case::crlf("# A\r\n\r\n- [X] 2. Done\r\n")]
    #[case::lone_cr("a\rb\r")]
    #[case::no_final_newline("para")]
    #[case::unicode("# Ünïcödé ✓\n- [ ] 名前\n")]
    #[case::odd_markers("-[ ]x\n#nohead\n**unclosed\n[[\n`\n")]
    fn test_print_is_verbatim(#[case] src: &str) {
        assert_eq!(parse(src).unwrap().print(), src);
    }

    #[test]
    fn test_parse_bytes_rejects_invalid_utf8() {
        let err = parse_bytes(b"# ok\n\xff").unwrap_err();
        assert_eq!(err, ParseError::Encoding { valid_up_to: 5 });
    }

    #[test]
    fn test_parents_are_linked() {
        let doc = parse("## H\n- [ ] 1 a *b*\n").unwrap();
        for node in doc.descendants() {
            for child in node.children() {
                assert_eq!(child.parent(), Some(node));
            }
        }
    }
}
