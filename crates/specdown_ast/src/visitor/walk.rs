//! Traversal driver for the [`Visitor`] trait.
//!
//! The walk keeps an explicit stack, so deeply nested lists cannot
//! overflow the call stack.

use crate::{Document, NodeId, NodeKind, NodeRef};

use super::visit::{VisitResult, Visitor};

enum Step {
    Enter(NodeId),
    Leave(NodeId),
}

/// Walks `start` and its descendants in pre-order.
///
/// Returns [`VisitResult::Stop`] if the visitor stopped the traversal,
/// otherwise [`VisitResult::Continue`].
pub fn walk<'d>(doc: &'d Document, start: NodeId, visitor: &mut dyn Visitor<'d>) -> VisitResult {
    let mut stack = vec![Step::Enter(start)];
    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(id) => {
                let Some(node) = doc.get(id) else {
                    continue;
                };
                let result = match visitor.enter_node(node) {
                    VisitResult::Continue => dispatch(visitor, node),
                    other => other,
                };
                match result {
                    VisitResult::Stop => return VisitResult::Stop,
                    VisitResult::SkipChildren => stack.push(Step::Leave(id)),
                    VisitResult::Continue => {
                        stack.push(Step::Leave(id));
                        stack.extend(node.node().children.iter().rev().map(|&c| Step::Enter(c)));
                    }
                }
            }
            Step::Leave(id) => {
                if let Some(node) = doc.get(id) {
                    visitor.leave_node(node);
                }
            }
        }
    }
    VisitResult::Continue
}

/// Calls the per-kind method for `node`.
pub fn dispatch<'d>(visitor: &mut dyn Visitor<'d>, node: NodeRef<'d>) -> VisitResult {
    match node.kind() {
        NodeKind::Document => visitor.visit_document(node),
        NodeKind::Header { level, text } => visitor.visit_header(node, *level, text),
        NodeKind::Paragraph => visitor.visit_paragraph(node),
        NodeKind::CodeBlock { lang, content } => {
            visitor.visit_code_block(node, lang.as_deref(), content)
        }
        NodeKind::List { ordered } => visitor.visit_list(node, *ordered),
        NodeKind::ListItem => visitor.visit_list_item(node),
        NodeKind::TaskItem(task) => visitor.visit_task_item(node, task),
        NodeKind::BlankLines => visitor.visit_blank_lines(node),
        NodeKind::Text => visitor.visit_text(node, node.text()),
        NodeKind::WikiLink { target } => visitor.visit_wiki_link(node, target),
        NodeKind::InlineCode => {
            let raw = node.text();
            let code = raw.trim_start_matches('`');
            let ticks = raw.len() - code.len();
            let code = code.get(..code.len().saturating_sub(ticks)).unwrap_or(code);
            visitor.visit_inline_code(node, code)
        }
        NodeKind::Emphasis { strong } => visitor.visit_emphasis(node, *strong),
    }
}

impl Document {
    /// Visits every node in pre-order. See [`Visitor`].
    pub fn visit<'d>(&'d self, visitor: &mut dyn Visitor<'d>) -> VisitResult {
        walk(self, self.root(), visitor)
    }

    /// Visits `start` and its descendants.
    pub fn visit_from<'d>(&'d self, start: NodeId, visitor: &mut dyn Visitor<'d>) -> VisitResult {
        walk(self, start, visitor)
    }
}
