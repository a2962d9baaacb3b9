//! The immutable document handle.

use std::fmt::Write as _;
use std::sync::Arc;

use thiserror::Error;

use crate::{LineIndex, Location, Node, NodeArena, NodeId, NodeKind, NodeType, Span};

static DETACHED_ROOT: Node = Node {
    kind: NodeKind::Document,
    span: Span::new(0, 0),
    parent: None,
    children: Vec::new(),
};

/// Errors from synthetic document edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// The id does not refer to a live node of this document.
    #[error("node {0} does not exist in this document")]
    StaleNode(NodeId),

    /// The node exists but is not a task item.
    #[error("node {id} is a {found:?}, not a task item")]
    NotATask { id: NodeId, found: NodeType },
}

/// A parsed document: source text, node arena and root.
///
/// Documents are never mutated after construction. Edits and task toggles
/// return a new `Document`, so a handle can be shared freely between
/// readers on different threads.
#[derive(Debug, Clone)]
pub struct Document {
    source: Arc<str>,
    arena: NodeArena,
    root: NodeId,
    line_index: Arc<LineIndex>,
}

impl Document {
    /// Assembles a document from parser output.
    ///
    /// `root` must be a `Document` node whose span covers all of `source`.
    pub fn new(source: impl Into<Arc<str>>, arena: NodeArena, root: NodeId) -> Self {
        let source = source.into();
        let line_index = Arc::new(LineIndex::new(&source));
        Self {
            source,
            arena,
            root,
            line_index,
        }
    }

    /// The text this document was parsed from.
    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Shared handle to the source text.
    #[inline]
    pub fn source_arc(&self) -> &Arc<str> {
        &self.source
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    #[inline]
    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    /// Raw node lookup.
    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.arena.get(id)
    }

    /// Returns a handle to a live node.
    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.arena.get(id).map(|node| NodeRef {
            doc: self,
            id,
            node,
        })
    }

    /// Handle to the root node.
    pub fn root_ref(&self) -> NodeRef<'_> {
        NodeRef {
            doc: self,
            id: self.root,
            node: self.arena.get(self.root).unwrap_or(&DETACHED_ROOT),
        }
    }

    /// Top-level blocks in order.
    pub fn top_level(&self) -> impl Iterator<Item = NodeRef<'_>> + '_ {
        self.root_ref().children()
    }

    /// Pre-order iterator over every node, starting at the root.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants::new(self, self.root)
    }

    /// Pre-order iterator over `id` and its descendants.
    pub fn descendants_of(&self, id: NodeId) -> Descendants<'_> {
        Descendants::new(self, id)
    }

    /// Source text under `span`. Out-of-range spans yield an empty string.
    #[inline]
    pub fn slice(&self, span: Span) -> &str {
        self.source.get(span.range()).unwrap_or_default()
    }

    /// Line/column location of `span`.
    #[inline]
    pub fn location(&self, span: Span) -> Location {
        self.line_index.location(span)
    }

    /// Returns a copy of this document with one task's checkbox state set.
    ///
    /// The source text is left alone: printing applies the change as a
    /// single-byte patch at the task's mark.
    pub fn with_task_checked(&self, id: NodeId, checked: bool) -> Result<Document, EditError> {
        let node = self.arena.get(id).ok_or(EditError::StaleNode(id))?;
        if node.node_type() != NodeType::TaskItem {
            return Err(EditError::NotATask {
                id,
                found: node.node_type(),
            });
        }

        let mut arena = self.arena.clone();
        if let Some(NodeKind::TaskItem(task)) = arena.get_mut(id).map(|node| &mut node.kind) {
            task.checked = checked;
        }
        Ok(Document {
            source: Arc::clone(&self.source),
            arena,
            root: self.root,
            line_index: Arc::clone(&self.line_index),
        })
    }

    /// Returns true if some task's checked state differs from its source
    /// mark, i.e. printing will not reproduce the source verbatim.
    pub fn has_patches(&self) -> bool {
        self.arena
            .iter()
            .filter_map(|(_, node)| node.kind.as_task())
            .any(|task| self.mark_checked(task.mark_offset) != Some(task.checked))
    }

    /// Whether the source byte at `offset` is a checked mark. `None` when
    /// the offset is not inside the source.
    pub(crate) fn mark_checked(&self, offset: u32) -> Option<bool> {
        self.source
            .as_bytes()
            .get(offset as usize)
            .map(|b| matches!(b, b'x' | b'X'))
    }

    /// Compares the two trees by node kind, span and child order.
    ///
    /// Node ids are ignored, so a document built incrementally compares
    /// equal to a fresh parse of the same text.
    pub fn structurally_eq(&self, other: &Document) -> bool {
        let mut stack = vec![(self.root, other.root)];
        while let Some((a, b)) = stack.pop() {
            let (Some(a), Some(b)) = (self.arena.get(a), other.arena.get(b)) else {
                return false;
            };
            if a.kind != b.kind || a.span != b.span || a.children.len() != b.children.len() {
                return false;
            }
            stack.extend(a.children.iter().copied().zip(b.children.iter().copied()));
        }
        true
    }

    /// Renders the tree as an indented outline, one node per line.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![(self.root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let Some(node) = self.arena.get(id) else {
                continue;
            };
            let _ = writeln!(
                out,
                "{:indent$}{} @{}..{}",
                "",
                self.label(node),
                node.span.start,
                node.span.end,
                indent = depth * 2
            );
            stack.extend(node.children.iter().rev().map(|&child| (child, depth + 1)));
        }
        out
    }

    fn label(&self, node: &Node) -> String {
        match &node.kind {
            NodeKind::Document => "Document".to_string(),
            NodeKind::Header { level, text } => format!("Header({level}) {text:?}"),
            NodeKind::Paragraph => "Paragraph".to_string(),
            NodeKind::CodeBlock { lang, .. } => match lang {
                Some(lang) => format!("CodeBlock({lang})"),
                None => "CodeBlock".to_string(),
            },
            NodeKind::List { ordered: true } => "List(ordered)".to_string(),
            NodeKind::List { ordered: false } => "List".to_string(),
            NodeKind::ListItem => "ListItem".to_string(),
            NodeKind::TaskItem(task) => {
                let mark = if task.checked { 'x' } else { ' ' };
                match &task.id {
                    Some(id) => format!("TaskItem[{mark}] {id} {:?}", task.description),
                    None => format!("TaskItem[{mark}] {:?}", task.description),
                }
            }
            NodeKind::BlankLines => "BlankLines".to_string(),
            NodeKind::Text => format!("Text {:?}", self.slice(node.span)),
            NodeKind::WikiLink { target } => format!("WikiLink {target:?}"),
            NodeKind::InlineCode => "InlineCode".to_string(),
            NodeKind::Emphasis { strong: true } => "Emphasis(strong)".to_string(),
            NodeKind::Emphasis { strong: false } => "Emphasis".to_string(),
        }
    }
}

/// A borrowed handle to one node of a [`Document`].
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'d> {
    doc: &'d Document,
    id: NodeId,
    node: &'d Node,
}

impl<'d> NodeRef<'d> {
    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn document(&self) -> &'d Document {
        self.doc
    }

    #[inline]
    pub fn node(&self) -> &'d Node {
        self.node
    }

    #[inline]
    pub fn kind(&self) -> &'d NodeKind {
        &self.node.kind
    }

    #[inline]
    pub fn node_type(&self) -> NodeType {
        self.node.node_type()
    }

    #[inline]
    pub fn span(&self) -> Span {
        self.node.span
    }

    /// Raw source text of this node, markers included.
    #[inline]
    pub fn text(&self) -> &'d str {
        self.doc.slice(self.node.span)
    }

    /// The text a query's `[text...]` filters test: header text, task
    /// description, wikilink target, code content, or the raw span for
    /// everything else.
    pub fn display_text(&self) -> &'d str {
        match &self.node.kind {
            NodeKind::Header { text, .. } => text,
            NodeKind::TaskItem(task) => &task.description,
            NodeKind::WikiLink { target } => target,
            NodeKind::CodeBlock { content, .. } => content,
            _ => self.text(),
        }
    }

    pub fn location(&self) -> Location {
        self.doc.location(self.node.span)
    }

    pub fn parent(&self) -> Option<NodeRef<'d>> {
        self.node.parent.and_then(|id| self.doc.get(id))
    }

    pub fn children(self) -> impl DoubleEndedIterator<Item = NodeRef<'d>> + 'd {
        let doc = self.doc;
        self.node.children.iter().filter_map(move |&id| doc.get(id))
    }

    /// Returns true if this node is a direct child of the document root.
    pub fn is_top_level(&self) -> bool {
        self.node.parent == Some(self.doc.root)
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}

/// Pre-order iterator produced by [`Document::descendants`].
#[derive(Debug, Clone)]
pub struct Descendants<'d> {
    doc: &'d Document,
    stack: Vec<NodeId>,
}

impl<'d> Descendants<'d> {
    fn new(doc: &'d Document, start: NodeId) -> Self {
        Self {
            doc,
            stack: vec![start],
        }
    }
}

impl<'d> Iterator for Descendants<'d> {
    type Item = NodeRef<'d>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let id = self.stack.pop()?;
            if let Some(node) = self.doc.get(id) {
                self.stack.extend(node.node.children.iter().rev());
                return Some(node);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TaskData;
    use pretty_assertions::assert_eq;

    /// `# Hi\n- [ ] 1 Go\n` assembled by hand.
    fn sample() -> (Document, NodeId) {
        let src = "# Hi\n- [ ] 1 Go\n";
        let mut arena = NodeArena::new();
        let hi = arena.alloc(Node::new(NodeKind::Text, Span::new(2, 4)));
        let header = arena.alloc(Node::with_children(
            NodeKind::Header {
                level: 1,
                text: "Hi".to_string(),
            },
            Span::new(0, 5),
            vec![hi],
        ));
        let go = arena.alloc(Node::new(NodeKind::Text, Span::new(13, 15)));
        let para = arena.alloc(Node::with_children(
            NodeKind::Paragraph,
            Span::new(13, 16),
            vec![go],
        ));
        let task = arena.alloc(Node::with_children(
            NodeKind::TaskItem(TaskData {
                id: crate::DottedNumber::parse("1"),
                checked: false,
                description: "Go".to_string(),
                mark_offset: 8,
            }),
            Span::new(5, 16),
            vec![para],
        ));
        let list = arena.alloc(Node::with_children(
            NodeKind::List { ordered: false },
            Span::new(5, 16),
            vec![task],
        ));
        let root = arena.alloc(Node::with_children(
            NodeKind::Document,
            Span::new(0, 16),
            vec![header, list],
        ));
        for (parent, children) in [
            (header, vec![hi]),
            (para, vec![go]),
            (task, vec![para]),
            (list, vec![task]),
            (root, vec![header, list]),
        ] {
            for child in children {
                arena.get_mut(child).unwrap().parent = Some(parent);
            }
        }
        (Document::new(src, arena, root), task)
    }

    #[test]
    fn test_descendants_are_pre_order() {
        let (doc, _) = sample();
        let types: Vec<_> = doc.descendants().map(|n| n.node_type()).collect();
        assert_eq!(
            types,
            vec![
                NodeType::Document,
                NodeType::Header,
                NodeType::Text,
                NodeType::List,
                NodeType::TaskItem,
                NodeType::Paragraph,
                NodeType::Text,
            ]
        );
    }

    #[test]
    fn test_node_ref_navigation() {
        let (doc, task) = sample();
        let task = doc.get(task).unwrap();
        assert_eq!(task.parent().unwrap().node_type(), NodeType::List);
        assert!(!task.is_top_level());
        assert_eq!(task.display_text(), "Go");
        assert_eq!(task.text(), "- [ ] 1 Go\n");
        assert_eq!(task.location().start.line, 2);
    }

    #[test]
    fn test_with_task_checked_leaves_original_untouched() {
        let (doc, task) = sample();
        let toggled = doc.with_task_checked(task, true).unwrap();

        assert!(!doc.has_patches());
        assert!(toggled.has_patches());
        assert_eq!(toggled.source(), doc.source());
        assert!(!doc.structurally_eq(&toggled));
    }

    #[test]
    fn test_with_task_checked_rejects_other_nodes() {
        let (doc, _) = sample();
        let root = doc.root();
        assert_eq!(
            doc.with_task_checked(root, true).unwrap_err(),
            EditError::NotATask {
                id: root,
                found: NodeType::Document
            }
        );
    }

    #[test]
    fn test_dump() {
        let (doc, _) = sample();
        insta::assert_snapshot!(doc.dump(), @r#"
        Document @0..16
          Header(1) "Hi" @0..5
            Text "Hi" @2..4
          List @5..16
            TaskItem[ ] 1 "Go" @5..16
              Paragraph @13..16
                Text "Go" @13..15
        "#);
    }
}
