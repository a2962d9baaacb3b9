//! Generational arena for AST nodes.
//!
//! All nodes of one document live in a single `NodeArena`. Nodes refer to
//! each other by [`NodeId`] instead of by reference, which lets an
//! incremental update replace part of a tree while every other id stays
//! valid.

use crate::{Node, NodeId};

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Arena of nodes addressed by generational [`NodeId`]s.
///
/// Freeing a node bumps its slot's generation and puts the slot on a free
/// list. Ids handed out before the free no longer resolve.
///
/// # Example
///
/// ```rust
/// use specdown_ast::{Node, NodeArena, NodeKind, Span};
///
/// let mut arena = NodeArena::new();
/// let id = arena.alloc(Node::new(NodeKind::Text, Span::new(0, 5)));
/// assert!(arena.get(id).is_some());
///
/// arena.free(id);
/// assert!(arena.get(id).is_none());
///
/// let reused = arena.alloc(Node::new(NodeKind::Text, Span::new(0, 1)));
/// assert_eq!(reused.index(), id.index());
/// assert_ne!(reused, id);
/// ```
#[derive(Debug, Clone, Default)]
pub struct NodeArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl NodeArena {
    /// Creates an empty arena.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an arena with room for `capacity` nodes.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Stores a node and returns its id. Freed slots are reused first.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId::new(index, 0)
    }

    /// Returns the node for `id`, or `None` if the id is stale or unknown.
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_ref())
    }

    /// Mutable variant of [`get`](Self::get).
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_mut())
    }

    /// Returns true if `id` refers to a live node.
    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Removes a single node, returning it. Children are left in place.
    pub fn free(&mut self, id: NodeId) -> Option<Node> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation() {
            return None;
        }
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index() as u32);
        self.live -= 1;
        Some(node)
    }

    /// Removes a node and all of its descendants. Returns how many nodes
    /// were freed.
    pub fn free_subtree(&mut self, id: NodeId) -> usize {
        let mut stack = vec![id];
        let mut freed = 0;
        while let Some(current) = stack.pop() {
            if let Some(node) = self.free(current) {
                stack.extend(node.children);
                freed += 1;
            }
        }
        freed
    }

    /// Number of live nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns true if the arena holds no live nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Iterates over live nodes in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.node
                .as_ref()
                .map(|node| (NodeId::new(index as u32, slot.generation), node))
        })
    }

    /// Mutable variant of [`iter`](Self::iter).
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (NodeId, &mut Node)> {
        self.slots.iter_mut().enumerate().filter_map(|(index, slot)| {
            let generation = slot.generation;
            slot.node
                .as_mut()
                .map(|node| (NodeId::new(index as u32, generation), node))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NodeKind, Span};

    fn text(start: u32, end: u32) -> Node {
        Node::new(NodeKind::Text, Span::new(start, end))
    }

    #[test]
    fn test_alloc_and_get() {
        let mut arena = NodeArena::new();
        let a = arena.alloc(text(0, 1));
        let b = arena.alloc(text(1, 2));
        assert_ne!(a, b);
        assert_eq!(arena.get(b).map(|n| n.span), Some(Span::new(1, 2)));
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_stale_id_does_not_resolve_after_reuse() {
        let mut arena = NodeArena::new();
        let old = arena.alloc(text(0, 1));
        arena.free(old);
        let new = arena.alloc(text(5, 9));

        assert_eq!(old.index(), new.index());
        assert!(arena.get(old).is_none());
        assert!(arena.get_mut(old).is_none());
        assert_eq!(arena.get(new).map(|n| n.span), Some(Span::new(5, 9)));
    }

    #[test]
    fn test_double_free_is_ignored() {
        let mut arena = NodeArena::new();
        let id = arena.alloc(text(0, 1));
        assert!(arena.free(id).is_some());
        assert!(arena.free(id).is_none());
        assert!(arena.is_empty());
    }

    #[test]
    fn test_free_subtree() {
        let mut arena = NodeArena::new();
        let leaf = arena.alloc(text(1, 2));
        let inner = arena.alloc(Node::with_children(
            NodeKind::Paragraph,
            Span::new(0, 3),
            vec![leaf],
        ));
        let keep = arena.alloc(text(3, 4));

        assert_eq!(arena.free_subtree(inner), 2);
        assert!(!arena.contains(leaf));
        assert!(arena.contains(keep));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_iter_skips_free_slots() {
        let mut arena = NodeArena::new();
        let a = arena.alloc(text(0, 1));
        let b = arena.alloc(text(1, 2));
        arena.free(a);
        let ids: Vec<_> = arena.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![b]);
    }
}
