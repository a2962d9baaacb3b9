//! Declarative node selection.
//!
//! A selector such as
//!
//! ```text
//! h2[text*="ADDED Requirements"] > h3[text^="Requirement:"]
//! ```
//!
//! picks nodes by kind and attributes, and relates steps through the
//! document's *scope* tree: a top-level block belongs to the nearest
//! preceding header of a lower level, everything else to its tree parent.
//! `A > B` requires B's scope parent to match A; `A B` accepts any scope
//! ancestor.
//!
//! Results are lazy, come in document order, and the iterator can be
//! cloned or restarted.

mod selector;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub use selector::QuerySyntaxError;
use selector::{Attr, Combinator, Filter, KindTest, Selector, Step};

use crate::{Document, NodeId, NodeKind, NodeRef};

/// A compiled selector, reusable across documents.
#[derive(Debug, Clone)]
pub struct Query {
    source: String,
    selector: Arc<Selector>,
}

impl Query {
    /// Compiles a selector.
    pub fn parse(selector: &str) -> Result<Self, QuerySyntaxError> {
        Ok(Self {
            source: selector.to_string(),
            selector: Arc::new(selector::parse(selector)?),
        })
    }

    /// The selector text this query was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Lazily yields the nodes of `doc` matching this query.
    pub fn matches<'d>(&self, doc: &'d Document) -> QueryIter<'d> {
        QueryIter::new(doc, Arc::clone(&self.selector))
    }
}

impl FromStr for Query {
    type Err = QuerySyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Document {
    /// Compiles `selector` and returns its matches in document order.
    pub fn query(&self, selector: &str) -> Result<QueryIter<'_>, QuerySyntaxError> {
        Ok(Query::parse(selector)?.matches(self))
    }
}

/// Owning header of each top-level block.
#[derive(Debug, Default)]
struct Scope {
    owners: HashMap<NodeId, NodeId>,
}

impl Scope {
    fn build(doc: &Document) -> Self {
        let mut owners = HashMap::new();
        let mut headers: Vec<(u8, NodeId)> = Vec::new();
        for block in doc.top_level() {
            let level = match block.kind() {
                NodeKind::Header { level, .. } => Some(*level),
                _ => None,
            };
            if let Some(level) = level {
                while headers.last().is_some_and(|&(open, _)| open >= level) {
                    headers.pop();
                }
            }
            if let Some(&(_, owner)) = headers.last() {
                owners.insert(block.id(), owner);
            }
            if let Some(level) = level {
                headers.push((level, block.id()));
            }
        }
        Self { owners }
    }

    fn parent<'d>(&self, node: NodeRef<'d>) -> Option<NodeRef<'d>> {
        match self.owners.get(&node.id()) {
            Some(&owner) => node.document().get(owner),
            None => node.parent(),
        }
    }
}

/// Lazy iterator over query matches. Cloning yields an independent cursor.
#[derive(Debug, Clone)]
pub struct QueryIter<'d> {
    doc: &'d Document,
    selector: Arc<Selector>,
    scope: Arc<Scope>,
    stack: Vec<NodeId>,
}

impl<'d> QueryIter<'d> {
    fn new(doc: &'d Document, selector: Arc<Selector>) -> Self {
        Self {
            doc,
            selector,
            scope: Arc::new(Scope::build(doc)),
            stack: vec![doc.root()],
        }
    }

    /// Rewinds to the first match.
    pub fn restart(&mut self) {
        self.stack.clear();
        self.stack.push(self.doc.root());
    }

    fn matches(&self, node: NodeRef<'d>) -> bool {
        let last = self.selector.steps.len() - 1;
        self.match_at(last, node)
    }

    /// Whether `node` matches step `index` and the steps before it match
    /// along its scope chain.
    fn match_at(&self, index: usize, node: NodeRef<'d>) -> bool {
        if !step_matches(&self.selector.steps[index], node) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match self.selector.combinators[index - 1] {
            Combinator::Child => self
                .scope
                .parent(node)
                .is_some_and(|parent| self.match_at(index - 1, parent)),
            Combinator::Descendant => {
                let mut ancestor = self.scope.parent(node);
                while let Some(candidate) = ancestor {
                    if self.match_at(index - 1, candidate) {
                        return true;
                    }
                    ancestor = self.scope.parent(candidate);
                }
                false
            }
        }
    }
}

impl<'d> Iterator for QueryIter<'d> {
    type Item = NodeRef<'d>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            let Some(node) = self.doc.get(id) else {
                continue;
            };
            self.stack.extend(node.node().children.iter().rev());
            if self.matches(node) {
                return Some(node);
            }
        }
        None
    }
}

fn step_matches(step: &Step, node: NodeRef<'_>) -> bool {
    let kind_ok = match step.kind {
        KindTest::Any => true,
        KindTest::Node(node_type) => node.node_type() == node_type,
        KindTest::Item => node.node_type().is_item(),
        KindTest::Heading(level) => {
            matches!(node.kind(), NodeKind::Header { level: l, .. } if *l == level)
        }
    };
    kind_ok && step.filters.iter().all(|filter| filter_matches(filter, node))
}

fn filter_matches(filter: &Filter, node: NodeRef<'_>) -> bool {
    match filter {
        Filter::Level(level) => {
            matches!(node.kind(), NodeKind::Header { level: l, .. } if l == level)
        }
        Filter::Checked(checked) => node
            .kind()
            .as_task()
            .is_some_and(|task| task.checked == *checked),
        Filter::Ordered(ordered) => {
            matches!(node.kind(), NodeKind::List { ordered: o } if o == ordered)
        }
        Filter::Attr { attr, op, value } => match attr {
            Attr::Text => op.test(node.display_text(), value),
            Attr::Lang => match node.kind() {
                NodeKind::CodeBlock {
                    lang: Some(lang), ..
                } => op.test(lang, value),
                _ => false,
            },
            Attr::Id => match node.kind().as_task().and_then(|task| task.id.as_ref()) {
                Some(id) => op.test(&id.to_string(), value),
                None => false,
            },
            Attr::Target => match node.kind() {
                NodeKind::WikiLink { target } => op.test(target, value),
                _ => false,
            },
        },
    }
}
