//! Visitor trait for traversing document nodes.
//!
//! Every `visit_*` method defaults to [`VisitResult::Continue`], so an
//! implementation only overrides the node kinds it cares about. The trait
//! is object safe: [`Document::visit`](crate::Document::visit) takes a
//! `&mut dyn Visitor`.

use crate::{NodeRef, TaskData};

/// Controls how traversal proceeds after a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisitResult {
    /// Descend into the node's children.
    #[default]
    Continue,
    /// Do not descend into this node's children; continue with its next
    /// sibling.
    SkipChildren,
    /// End the traversal immediately.
    Stop,
}

/// Read-only, pre-order traversal callbacks.
///
/// # Lifetime
///
/// `'d` is the lifetime of the visited [`Document`](crate::Document);
/// visitors may keep the [`NodeRef`]s and strings they receive.
///
/// # Order of calls
///
/// For each node: [`enter_node`](Visitor::enter_node), then the per-kind
/// method, then the children, then [`leave_node`](Visitor::leave_node).
/// If `enter_node` returns anything other than `Continue`, the per-kind
/// method is not called. `leave_node` runs for every entered node unless
/// the traversal was stopped.
pub trait Visitor<'d> {
    /// Called before the per-kind method for every node.
    #[inline]
    fn enter_node(&mut self, _node: NodeRef<'d>) -> VisitResult {
        VisitResult::Continue
    }

    /// Called after a node's children have been visited.
    #[inline]
    fn leave_node(&mut self, _node: NodeRef<'d>) {}

    // === Block-level node visitors ===

    fn visit_document(&mut self, _node: NodeRef<'d>) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_header(&mut self, _node: NodeRef<'d>, _level: u8, _text: &'d str) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_paragraph(&mut self, _node: NodeRef<'d>) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_code_block(
        &mut self,
        _node: NodeRef<'d>,
        _lang: Option<&'d str>,
        _content: &'d str,
    ) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_list(&mut self, _node: NodeRef<'d>, _ordered: bool) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_list_item(&mut self, _node: NodeRef<'d>) -> VisitResult {
        VisitResult::Continue
    }

    /// Visit a task item. `task.checked` reflects toggles made with
    /// [`Document::with_task_checked`](crate::Document::with_task_checked).
    fn visit_task_item(&mut self, _node: NodeRef<'d>, _task: &'d TaskData) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_blank_lines(&mut self, _node: NodeRef<'d>) -> VisitResult {
        VisitResult::Continue
    }

    // === Inline-level node visitors ===

    fn visit_text(&mut self, _node: NodeRef<'d>, _text: &'d str) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_wiki_link(&mut self, _node: NodeRef<'d>, _target: &'d str) -> VisitResult {
        VisitResult::Continue
    }

    /// Visit inline code. `code` excludes the backtick delimiters.
    fn visit_inline_code(&mut self, _node: NodeRef<'d>, _code: &'d str) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_emphasis(&mut self, _node: NodeRef<'d>, _strong: bool) -> VisitResult {
        VisitResult::Continue
    }
}
