//! Byte offset to line/column mapping.

use crate::{Location, Position, Span};

/// Sorted line-start offsets for a source text.
///
/// Recognizes `\n`, `\r\n` and a lone `\r` as line terminators, the same
/// set the lexer uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<u32>,
    len: u32,
}

impl LineIndex {
    /// Builds the index in a single pass over `text`.
    pub fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut line_starts = Vec::with_capacity(bytes.len() / 32 + 1);
        line_starts.push(0);

        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\n' => line_starts.push(i as u32 + 1),
                b'\r' if bytes.get(i + 1) != Some(&b'\n') => line_starts.push(i as u32 + 1),
                _ => {}
            }
            i += 1;
        }

        Self {
            line_starts,
            len: bytes.len() as u32,
        }
    }

    /// Number of lines. An empty text has one (empty) line, and a trailing
    /// terminator opens a final empty line.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Length of the indexed text in bytes.
    pub fn text_len(&self) -> u32 {
        self.len
    }

    /// Converts a byte offset to a position. O(log n).
    ///
    /// Offsets past the end are clamped to the end of the text.
    pub fn offset_to_line_col(&self, offset: u32) -> Position {
        let offset = offset.min(self.len);
        let idx = self.line_starts.partition_point(|&start| start <= offset) - 1;
        Position::new(idx as u32 + 1, offset - self.line_starts[idx])
    }

    /// Converts a position back to a byte offset, if it lies inside the text.
    pub fn line_col_to_offset(&self, position: Position) -> Option<u32> {
        let span = self.line_span(position.line)?;
        let offset = span.start.checked_add(position.column)?;
        (offset <= span.end).then_some(offset)
    }

    /// Byte offset where the given 1-indexed line starts.
    pub fn line_start(&self, line: u32) -> Option<u32> {
        if line == 0 {
            return None;
        }
        self.line_starts.get(line as usize - 1).copied()
    }

    /// Span of the given 1-indexed line, including its terminator.
    pub fn line_span(&self, line: u32) -> Option<Span> {
        let start = self.line_start(line)?;
        let end = self
            .line_starts
            .get(line as usize)
            .copied()
            .unwrap_or(self.len);
        Some(Span::new(start, end))
    }

    /// Converts a span to a start/end location pair.
    pub fn location(&self, span: Span) -> Location {
        Location::new(
            self.offset_to_line_col(span.start),
            self.offset_to_line_col(span.end),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_has_one_line() {
        let index = LineIndex::new("");
        assert_eq!(index.line_count(), 1);
        assert_eq!(index.offset_to_line_col(0), Position::new(1, 0));
    }

    #[test]
    fn test_offsets_map_to_lines() {
        let index = LineIndex::new("ab\ncd\n\nef");
        assert_eq!(index.line_count(), 4);
        assert_eq!(index.offset_to_line_col(0), Position::new(1, 0));
        assert_eq!(index.offset_to_line_col(2), Position::new(1, 2));
        assert_eq!(index.offset_to_line_col(3), Position::new(2, 0));
        assert_eq!(index.offset_to_line_col(6), Position::new(3, 0));
        assert_eq!(index.offset_to_line_col(8), Position::new(4, 1));
    }

    #[test]
    fn test_crlf_counts_once() {
        let index = LineIndex::new("a\r\nb\rc");
        assert_eq!(index.line_count(), 3);
        assert_eq!(index.offset_to_line_col(3), Position::new(2, 0));
        assert_eq!(index.offset_to_line_col(5), Position::new(3, 0));
    }

    #[test]
    fn test_offset_past_end_is_clamped() {
        let index = LineIndex::new("abc");
        assert_eq!(index.offset_to_line_col(99), Position::new(1, 3));
    }

    #[test]
    fn test_line_col_round_trip() {
        let text = "first\nsecond line\nthird";
        let index = LineIndex::new(text);
        for offset in 0..=text.len() as u32 {
            let pos = index.offset_to_line_col(offset);
            assert_eq!(index.line_col_to_offset(pos), Some(offset));
        }
    }

    #[test]
    fn test_line_span_includes_terminator() {
        let index = LineIndex::new("ab\ncd");
        assert_eq!(index.line_span(1), Some(Span::new(0, 3)));
        assert_eq!(index.line_span(2), Some(Span::new(3, 5)));
        assert_eq!(index.line_span(3), None);
        assert_eq!(index.line_span(0), None);
    }

    #[test]
    fn test_column_beyond_line_is_rejected() {
        let index = LineIndex::new("ab\ncd");
        assert_eq!(index.line_col_to_offset(Position::new(1, 7)), None);
    }
}
