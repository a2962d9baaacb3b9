//! # specdown_ast
//!
//! Lossless AST for the specdown markdown dialect.
//!
//! ## Architecture
//!
//! - Nodes are stored in a generational [`NodeArena`] and linked by [`NodeId`]
//! - Every node keeps its raw source span; bytes not covered by children
//!   are the node's own markers, so printing an untouched tree reproduces
//!   the source exactly
//! - A [`Document`] owns the source, the arena and a [`LineIndex`], and is
//!   never mutated after construction
//!
//! Parsing lives in `specdown_parser`; this crate only defines the tree and
//! the read-side operations over it: printing, visiting and querying.
//!
//! ## Example
//!
//! ```rust
//! use specdown_ast::{Document, Node, NodeArena, NodeKind, Span};
//!
//! let mut arena = NodeArena::new();
//! let text = arena.alloc(Node::new(NodeKind::Text, Span::new(0, 5)));
//! let root = arena.alloc(Node::with_children(NodeKind::Document, Span::new(0, 5), vec![text]));
//! let doc = Document::new("hello", arena, root);
//!
//! assert_eq!(doc.print(), "hello");
//! assert_eq!(doc.query("text").unwrap().count(), 1);
//! ```

mod arena;
mod document;
mod line_index;
mod node;
mod printer;
pub mod query;
mod span;
pub mod visitor;

pub use arena::NodeArena;
pub use document::{Descendants, Document, EditError, NodeRef};
pub use line_index::LineIndex;
pub use node::{DottedNumber, Node, NodeId, NodeKind, NodeType, TaskData};
pub use query::{Query, QueryIter, QuerySyntaxError};
pub use span::{ByteRange, Location, Position, Span};

// Re-export commonly used visitor items for convenience
pub use visitor::{VisitResult, Visitor};
