//! Span and position types for source locations.
//!
//! Spans are byte offsets into the document source. Positions are what
//! diagnostics show to people: 1-indexed lines, 0-indexed byte columns.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// A byte range in a document's source text, as passed to edit operations.
pub type ByteRange = Range<usize>;

/// A position in source text.
///
/// Uses 1-indexed lines and 0-indexed byte columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (0-indexed, in bytes).
    pub column: u32,
}

impl Position {
    /// Creates a new position.
    #[inline]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A span representing a range in source text.
///
/// Uses byte offsets (0-indexed) for efficient slicing.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Span {
    /// Start byte offset (0-indexed, inclusive).
    pub start: u32,
    /// End byte offset (0-indexed, exclusive).
    pub end: u32,
}

impl Span {
    /// Creates a new span.
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Returns the length of the span in bytes.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Returns true if the span is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns true if this span contains the given offset.
    #[inline]
    pub const fn contains(&self, offset: u32) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Returns true if `other` lies entirely inside this span.
    #[inline]
    pub const fn contains_span(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Merges two spans into one that covers both.
    #[inline]
    pub const fn merge(&self, other: &Span) -> Span {
        Span {
            start: if self.start < other.start {
                self.start
            } else {
                other.start
            },
            end: if self.end > other.end {
                self.end
            } else {
                other.end
            },
        }
    }

    /// Moves both ends of the span by `delta` bytes.
    ///
    /// Callers guarantee the result stays non-negative; edits never shift a
    /// span that starts before the edited region.
    #[inline]
    pub const fn shifted(&self, delta: i64) -> Span {
        Span {
            start: (self.start as i64 + delta) as u32,
            end: (self.end as i64 + delta) as u32,
        }
    }

    /// Returns the span as a `usize` range for slicing.
    #[inline]
    pub const fn range(&self) -> Range<usize> {
        self.start as usize..self.end as usize
    }
}

impl From<Span> for Range<usize> {
    fn from(span: Span) -> Self {
        span.range()
    }
}

/// Location information combining start and end positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    /// Start position.
    pub start: Position,
    /// End position.
    pub end: Position,
}

impl Location {
    /// Creates a new location.
    #[inline]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span() {
        let span = Span::new(10, 20);
        assert_eq!(span.len(), 10);
        assert!(!span.is_empty());
        assert!(span.contains(15));
        assert!(!span.contains(5));
        assert!(!span.contains(20));
    }

    #[test]
    fn test_span_merge() {
        let span1 = Span::new(10, 20);
        let span2 = Span::new(15, 30);
        let merged = span1.merge(&span2);
        assert_eq!(merged.start, 10);
        assert_eq!(merged.end, 30);
    }

    #[test]
    fn test_span_merge_reversed_order() {
        let merged = Span::new(20, 30).merge(&Span::new(10, 15));
        assert_eq!(merged, Span::new(10, 30));
    }

    #[test]
    fn test_empty_span_contains_nothing() {
        let span = Span::new(5, 5);
        assert!(span.is_empty());
        assert!(!span.contains(5));
    }

    #[test]
    fn test_contains_span() {
        let outer = Span::new(0, 100);
        assert!(outer.contains_span(&Span::new(20, 30)));
        assert!(outer.contains_span(&Span::new(0, 100)));
        assert!(!outer.contains_span(&Span::new(90, 101)));
    }

    #[test]
    fn test_shifted() {
        assert_eq!(Span::new(10, 20).shifted(5), Span::new(15, 25));
        assert_eq!(Span::new(10, 20).shifted(-10), Span::new(0, 10));
    }

    #[test]
    fn test_range_conversion() {
        let range: Range<usize> = Span::new(3, 7).into();
        assert_eq!(range, 3..7);
    }

    #[test]
    fn test_location() {
        let loc = Location::new(Position::new(1, 0), Position::new(1, 10));
        assert_eq!(loc.start.line, 1);
        assert_eq!(loc.end.column, 10);
    }

    #[test]
    fn test_span_serialization() {
        let json = serde_json::to_string(&Span::new(10, 20)).unwrap();
        assert_eq!(json, r#"{"start":10,"end":20}"#);
    }

    #[test]
    fn test_span_deserialization() {
        let span: Span = serde_json::from_str(r#"{"start": 5, "end": 15}"#).unwrap();
        assert_eq!(span, Span::new(5, 15));
    }
}
