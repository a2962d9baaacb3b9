//! Visitor pattern for document traversal.
//!
//! # Overview
//!
//! - [`Visitor`] - per-kind callbacks, object safe
//! - [`VisitResult`] - continue, skip a subtree, or stop
//! - [`walk`] - iterative pre-order driver behind [`Document::visit`](crate::Document::visit)
//!
//! # Example
//!
//! ```rust
//! use specdown_ast::{Document, Node, NodeArena, NodeKind, NodeRef, Span};
//! use specdown_ast::visitor::{VisitResult, Visitor};
//!
//! struct TextCollector<'d> {
//!     texts: Vec<&'d str>,
//! }
//!
//! impl<'d> Visitor<'d> for TextCollector<'d> {
//!     fn visit_text(&mut self, _node: NodeRef<'d>, text: &'d str) -> VisitResult {
//!         self.texts.push(text);
//!         VisitResult::Continue
//!     }
//! }
//!
//! let mut arena = NodeArena::new();
//! let text = arena.alloc(Node::new(NodeKind::Text, Span::new(0, 5)));
//! let root = arena.alloc(Node::with_children(NodeKind::Document, Span::new(0, 5), vec![text]));
//! let doc = Document::new("hello", arena, root);
//!
//! let mut collector = TextCollector { texts: Vec::new() };
//! doc.visit(&mut collector);
//! assert_eq!(collector.texts, vec!["hello"]);
//! ```

mod visit;
mod walk;

pub use visit::{VisitResult, Visitor};
pub use walk::{dispatch, walk};
