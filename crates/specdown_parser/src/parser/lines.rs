//! Token lines and line classification.

use crate::lexer::{Lexer, Token, TokenKind};

/// One source line and the range of its tokens in the reader's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Line {
    pub start: u32,
    /// End of the line's content, before the terminator.
    pub content_end: u32,
    /// End of the line, terminator included.
    pub end: u32,
    pub first_token: usize,
    pub last_token: usize,
}

/// Lexes lines on demand so the block parser can look ahead.
pub(crate) struct LineReader<'s> {
    src: &'s str,
    lexer: Lexer<'s>,
    tokens: Vec<Token>,
    lines: Vec<Line>,
}

impl<'s> LineReader<'s> {
    /// Reads `src` starting at the line beginning at `start`.
    pub(crate) fn new(src: &'s str, start: usize) -> Self {
        Self {
            src,
            lexer: Lexer::at(src, start),
            tokens: Vec::new(),
            lines: Vec::new(),
        }
    }

    /// Returns line `index`, lexing up to it if needed.
    pub(crate) fn line(&mut self, index: usize) -> Option<Line> {
        while self.lines.len() <= index {
            let start = self.lexer.pos();
            let first_token = self.tokens.len();
            if !self.lexer.next_line(&mut self.tokens) {
                return None;
            }
            let end = self.lexer.pos();
            self.lines.push(Line {
                start: start as u32,
                content_end: (end - terminator_len(self.src.as_bytes(), start, end)) as u32,
                end: end as u32,
                first_token,
                last_token: self.tokens.len(),
            });
        }
        Some(self.lines[index])
    }

    #[inline]
    pub(crate) fn tokens(&self, line: Line) -> &[Token] {
        &self.tokens[line.first_token..line.last_token]
    }

    #[inline]
    pub(crate) fn token_range(&self, first: usize, last: usize) -> &[Token] {
        &self.tokens[first..last]
    }
}

fn terminator_len(bytes: &[u8], start: usize, end: usize) -> usize {
    match bytes.get(start..end) {
        Some([.., b'\r', b'\n']) => 2,
        Some([.., b'\n' | b'\r']) => 1,
        _ => 0,
    }
}

/// Block-level meaning of a line, decided by its structural prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineKind {
    Blank,
    Heading { indent: u32 },
    Fence { indent: u32 },
    Item(ItemLine),
    Text { indent: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ItemLine {
    pub marker_col: u32,
    /// Column where the item's content starts; lines indented at least
    /// this far belong to the item.
    pub content_col: u32,
    pub ordered: bool,
}

pub(crate) fn classify(src: &str, tokens: &[Token]) -> LineKind {
    let Some(first) = tokens.first() else {
        return LineKind::Blank;
    };
    if first.kind == TokenKind::BlankLine {
        return LineKind::Blank;
    }

    let (indent, rest) = if first.kind == TokenKind::Whitespace {
        (columns(first.text(src), 0), &tokens[1..])
    } else {
        (0, tokens)
    };

    match rest.first().map(|t| t.kind) {
        Some(TokenKind::HeadingMarker) => LineKind::Heading { indent },
        Some(TokenKind::FenceOpen) => LineKind::Fence { indent },
        Some(TokenKind::ListMarker) => {
            let marker = rest[0];
            let ordered = marker.text(src).starts_with(|c: char| c.is_ascii_digit());
            let marker_end = indent + marker.span.len();
            let content_col = match (rest.get(1), rest.get(2)) {
                (Some(ws), next) if ws.kind == TokenKind::Whitespace => {
                    let width = columns(ws.text(src), marker_end);
                    let empty = next.is_none_or(|t| t.kind == TokenKind::Newline);
                    if empty || width >= 5 {
                        marker_end + 1
                    } else {
                        marker_end + width
                    }
                }
                (None, _) => marker_end + 1,
                (Some(t), _) if t.kind == TokenKind::Newline => marker_end + 1,
                (Some(_), _) => marker_end,
            };
            LineKind::Item(ItemLine {
                marker_col: indent,
                content_col,
                ordered,
            })
        }
        _ => LineKind::Text { indent },
    }
}

/// Visual width of leading whitespace starting at column `from`. Tabs
/// advance to the next multiple of 4.
pub(crate) fn columns(ws: &str, from: u32) -> u32 {
    let mut col = from;
    for b in ws.bytes() {
        if b == b'\t' {
            col += 4 - (col % 4);
        } else {
            col += 1;
        }
    }
    col - from
}
