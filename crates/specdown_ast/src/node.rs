//! Node definitions.
//!
//! Nodes live in a [`NodeArena`](crate::NodeArena) and refer to each other
//! by [`NodeId`]. Every node records the raw byte span it was parsed from;
//! the bytes of that span not covered by children are the node's own
//! syntax (markers, fences, delimiters).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Span;

/// Index of a node in its document's arena.
///
/// The generation distinguishes a live node from an earlier occupant of
/// the same slot, so ids of nodes replaced by an incremental update never
/// resolve to the nodes that took their place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index in the arena.
    #[inline]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// Generation of the slot when this id was issued.
    #[inline]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// A dotted numeric task id such as `1`, `2.3` or `4.1.7`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct DottedNumber(Vec<u32>);

impl DottedNumber {
    /// Parses `\d+(\.\d+)*`, ignoring one trailing dot (`1.2.`).
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.strip_suffix('.').unwrap_or(text);
        if text.is_empty() {
            return None;
        }
        text.split('.')
            .map(|segment| {
                if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                    None
                } else {
                    segment.parse::<u32>().ok()
                }
            })
            .collect::<Option<Vec<_>>>()
            .map(Self)
    }

    /// Builds an id from its numeric segments.
    pub fn from_segments(segments: Vec<u32>) -> Option<Self> {
        (!segments.is_empty()).then_some(Self(segments))
    }

    /// The numeric segments, outermost first.
    pub fn segments(&self) -> &[u32] {
        &self.0
    }

    /// Number of segments (`1.2.3` has depth 3).
    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for DottedNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl From<DottedNumber> for String {
    fn from(value: DottedNumber) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for DottedNumber {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid dotted number `{value}`"))
    }
}

/// Payload of a task list item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskData {
    /// Explicit dotted id, if the line carries one.
    pub id: Option<DottedNumber>,
    /// Checkbox state. May differ from the source byte after
    /// [`Document::with_task_checked`](crate::Document::with_task_checked).
    pub checked: bool,
    /// First-line description with surrounding whitespace removed.
    pub description: String,
    /// Absolute byte offset of the checkbox mark character.
    pub mark_offset: u32,
}

/// The node variants of the dialect.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Header { level: u8, text: String },
    Paragraph,
    CodeBlock { lang: Option<String>, content: String },
    List { ordered: bool },
    ListItem,
    TaskItem(TaskData),
    /// A run of blank lines between blocks.
    BlankLines,
    Text,
    WikiLink { target: String },
    InlineCode,
    Emphasis { strong: bool },
}

impl NodeKind {
    /// Returns the fieldless tag of this kind.
    pub const fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Document => NodeType::Document,
            NodeKind::Header { .. } => NodeType::Header,
            NodeKind::Paragraph => NodeType::Paragraph,
            NodeKind::CodeBlock { .. } => NodeType::CodeBlock,
            NodeKind::List { .. } => NodeType::List,
            NodeKind::ListItem => NodeType::ListItem,
            NodeKind::TaskItem(_) => NodeType::TaskItem,
            NodeKind::BlankLines => NodeType::BlankLines,
            NodeKind::Text => NodeType::Text,
            NodeKind::WikiLink { .. } => NodeType::WikiLink,
            NodeKind::InlineCode => NodeType::InlineCode,
            NodeKind::Emphasis { .. } => NodeType::Emphasis,
        }
    }

    /// Returns the task payload for task items.
    pub const fn as_task(&self) -> Option<&TaskData> {
        match self {
            NodeKind::TaskItem(task) => Some(task),
            _ => None,
        }
    }
}

/// Fieldless node type tags, used by queries and serialized output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum NodeType {
    Document,
    Header,
    Paragraph,
    CodeBlock,
    List,
    ListItem,
    TaskItem,
    BlankLines,
    Text,
    WikiLink,
    InlineCode,
    Emphasis,
}

impl NodeType {
    /// Returns true if this node type is a block element.
    #[inline]
    pub const fn is_block(&self) -> bool {
        matches!(
            self,
            NodeType::Document
                | NodeType::Header
                | NodeType::Paragraph
                | NodeType::CodeBlock
                | NodeType::List
                | NodeType::ListItem
                | NodeType::TaskItem
                | NodeType::BlankLines
        )
    }

    /// Returns true if this node type is an inline element.
    #[inline]
    pub const fn is_inline(&self) -> bool {
        !self.is_block()
    }

    /// Returns true for list items, with or without a checkbox.
    #[inline]
    pub const fn is_item(&self) -> bool {
        matches!(self, NodeType::ListItem | NodeType::TaskItem)
    }
}

/// A node stored in the arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    /// Raw source span, `[start, end)`.
    pub span: Span,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl Node {
    /// Creates a node without parent or children.
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self {
            kind,
            span,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Creates a node owning the given children.
    pub fn with_children(kind: NodeKind, span: Span, children: Vec<NodeId>) -> Self {
        Self {
            kind,
            span,
            parent: None,
            children,
        }
    }

    #[inline]
    pub const fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    #[inline]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}
