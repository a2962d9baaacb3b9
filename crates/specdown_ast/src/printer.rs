//! Serializes a document back to text.
//!
//! Every byte of a node's span is either covered by a child or belongs to
//! the node itself (markers, fences, delimiters). The printer replays the
//! node's own bytes verbatim and recurses into children in between, so an
//! untouched tree prints its source exactly. The only synthetic change a
//! tree can carry is a task's `checked` flag; that is written as a single
//! byte at the task's mark offset.

use crate::{Document, Node, NodeId, NodeKind, Span};

enum Work {
    Node(NodeId),
    Raw { span: Span, patch: Option<Patch> },
}

#[derive(Clone, Copy)]
struct Patch {
    offset: u32,
    byte: char,
}

struct Printer<'d> {
    doc: &'d Document,
    out: String,
    stack: Vec<Work>,
}

impl<'d> Printer<'d> {
    fn new(doc: &'d Document, capacity: usize) -> Self {
        Self {
            doc,
            out: String::with_capacity(capacity),
            stack: Vec::new(),
        }
    }

    fn run(mut self, start: NodeId) -> String {
        self.stack.push(Work::Node(start));
        while let Some(work) = self.stack.pop() {
            match work {
                Work::Node(id) => {
                    if let Some(node) = self.doc.node(id) {
                        if node.node_type().is_block() {
                            self.block(node);
                        } else {
                            self.inline(node);
                        }
                    }
                }
                Work::Raw { span, patch } => self.emit(span, patch),
            }
        }
        self.out
    }

    fn block(&mut self, node: &Node) {
        match &node.kind {
            NodeKind::CodeBlock { .. } | NodeKind::BlankLines => self.emit(node.span, None),
            NodeKind::TaskItem(task) => {
                let patch = match self.doc.mark_checked(task.mark_offset) {
                    Some(in_source) if in_source != task.checked => Some(Patch {
                        offset: task.mark_offset,
                        byte: if task.checked { 'x' } else { ' ' },
                    }),
                    _ => None,
                };
                self.interleave(node, patch);
            }
            NodeKind::Document
            | NodeKind::Header { .. }
            | NodeKind::Paragraph
            | NodeKind::List { .. }
            | NodeKind::ListItem => self.interleave(node, None),
            NodeKind::Text
            | NodeKind::WikiLink { .. }
            | NodeKind::InlineCode
            | NodeKind::Emphasis { .. } => self.inline(node),
        }
    }

    fn inline(&mut self, node: &Node) {
        match &node.kind {
            NodeKind::Text | NodeKind::WikiLink { .. } | NodeKind::InlineCode => {
                self.emit(node.span, None)
            }
            NodeKind::Emphasis { .. } => self.interleave(node, None),
            NodeKind::Document
            | NodeKind::Header { .. }
            | NodeKind::Paragraph
            | NodeKind::CodeBlock { .. }
            | NodeKind::List { .. }
            | NodeKind::ListItem
            | NodeKind::TaskItem(_)
            | NodeKind::BlankLines => self.block(node),
        }
    }

    /// Schedules the node's own bytes and its children in source order.
    fn interleave(&mut self, node: &Node, patch: Option<Patch>) {
        let mut end = node.span.end;
        for &child in node.children.iter().rev() {
            let Some(child_span) = self.doc.node(child).map(|c| c.span) else {
                continue;
            };
            self.push_raw(child_span.end, end, patch);
            self.stack.push(Work::Node(child));
            end = child_span.start;
        }
        self.push_raw(node.span.start, end, patch);
    }

    fn push_raw(&mut self, start: u32, end: u32, patch: Option<Patch>) {
        if start < end {
            self.stack.push(Work::Raw {
                span: Span::new(start, end),
                patch,
            });
        }
    }

    fn emit(&mut self, span: Span, patch: Option<Patch>) {
        let source = self.doc.source();
        match patch.filter(|p| span.contains(p.offset)) {
            Some(patch) => {
                let at = patch.offset as usize;
                self.out
                    .push_str(source.get(span.start as usize..at).unwrap_or_default());
                self.out.push(patch.byte);
                self.out
                    .push_str(source.get(at + 1..span.end as usize).unwrap_or_default());
            }
            None => self.out.push_str(self.doc.slice(span)),
        }
    }
}

impl Document {
    /// Prints the whole document.
    ///
    /// Without task toggles the result equals [`source`](Document::source).
    pub fn print(&self) -> String {
        Printer::new(self, self.source().len()).run(self.root())
    }

    /// Prints one node and its descendants. Stale ids print as empty.
    pub fn print_node(&self, id: NodeId) -> String {
        let capacity = self.node(id).map_or(0, |node| node.span.len() as usize);
        Printer::new(self, capacity).run(id)
    }
}
