//! Line-oriented tokenizer.
//!
//! The lexer scans one line at a time and carries a single piece of state
//! between lines: whether it is inside a fenced code block. Tokens are
//! contiguous and cover every input byte exactly once. Sequences that do
//! not form a construct become [`TokenKind::TextRun`]; lexing never fails
//! on well-formed UTF-8.

use specdown_ast::Span;

use crate::ParseError;

/// Token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Spaces and tabs between structural tokens.
    Whitespace,
    /// `\n`, `\r\n` or a lone `\r`.
    Newline,
    /// A line holding only spaces and tabs, terminator included.
    BlankLine,
    /// `#` run of an ATX header.
    HeadingMarker,
    /// `-`, `*`, `+`, or digits followed by `.` or `)`.
    ListMarker,
    CheckboxOpen,
    /// The single byte between the checkbox brackets.
    CheckboxMark,
    CheckboxClose,
    /// Dotted task number after a checkbox, trailing dot included.
    TaskId,
    FenceOpen,
    FenceClose,
    TextRun,
    WikiLinkOpen,
    WikiLinkClose,
    /// A backtick run that has a partner of equal length on the same line.
    CodeSpanDelim,
    /// A `*` run, or a `_` run that is not inside a word.
    EmphasisDelim,
}

impl TokenKind {
    /// Whether the token belongs to a line's inline content rather than its
    /// structural prefix.
    #[inline]
    pub const fn is_inline(self) -> bool {
        matches!(
            self,
            TokenKind::TextRun
                | TokenKind::WikiLinkOpen
                | TokenKind::WikiLinkClose
                | TokenKind::CodeSpanDelim
                | TokenKind::EmphasisDelim
        )
    }

    /// Whether the token ends a line.
    #[inline]
    pub const fn ends_line(self) -> bool {
        matches!(self, TokenKind::Newline | TokenKind::BlankLine)
    }
}

/// A token: a kind and the bytes it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    #[inline]
    pub const fn new(kind: TokenKind, start: u32, end: u32) -> Self {
        Self {
            kind,
            span: Span::new(start, end),
        }
    }

    #[inline]
    pub const fn byte_start(&self) -> usize {
        self.span.start as usize
    }

    #[inline]
    pub const fn byte_end(&self) -> usize {
        self.span.end as usize
    }

    /// The token's text within `src`.
    #[inline]
    pub fn text<'s>(&self, src: &'s str) -> &'s str {
        src.get(self.span.range()).unwrap_or_default()
    }
}

/// Tokenizes raw bytes.
///
/// Fails on invalid UTF-8 and on inputs whose offsets do not fit in 32 bits.
pub fn tokenize(bytes: &[u8]) -> Result<Vec<Token>, ParseError> {
    ParseError::check_len(bytes.len())?;
    let src = std::str::from_utf8(bytes).map_err(ParseError::encoding)?;
    Ok(tokenize_str(src))
}

/// Tokenizes text that is already known to be valid.
pub fn tokenize_str(src: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(src);
    let mut tokens = Vec::with_capacity(src.len() / 4 + 1);
    while lexer.next_line(&mut tokens) {}
    tokens
}

/// An open fence: its character and run length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Fence {
    marker: u8,
    len: usize,
}

/// Scanner state.
#[derive(Debug, Clone)]
pub(crate) struct Lexer<'s> {
    bytes: &'s [u8],
    pos: usize,
    fence: Option<Fence>,
}

impl<'s> Lexer<'s> {
    pub(crate) fn new(src: &'s str) -> Self {
        Self::at(src, 0)
    }

    /// Starts scanning at `pos`, which must be a line start outside any
    /// fenced block.
    pub(crate) fn at(src: &'s str, pos: usize) -> Self {
        Self {
            bytes: src.as_bytes(),
            pos,
            fence: None,
        }
    }

    /// Offset of the next unscanned byte.
    #[inline]
    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    /// Lexes the next line into `out`. Returns false at end of input.
    pub(crate) fn next_line(&mut self, out: &mut Vec<Token>) -> bool {
        let start = self.pos;
        if start >= self.bytes.len() {
            return false;
        }
        let (content_end, line_end) = self.line_bounds(start);

        if self.bytes[start..content_end].iter().all(|&b| is_ws(b)) {
            push(out, TokenKind::BlankLine, start, line_end);
        } else {
            match self.fence {
                Some(fence) => self.fenced_line(start, content_end, fence, out),
                None => self.block_line(start, content_end, out),
            }
            if line_end > content_end {
                push(out, TokenKind::Newline, content_end, line_end);
            }
        }
        self.pos = line_end;
        true
    }

    /// Returns (end of content, end of line including terminator).
    fn line_bounds(&self, start: usize) -> (usize, usize) {
        let mut i = start;
        while i < self.bytes.len() {
            match self.bytes[i] {
                b'\n' => return (i, i + 1),
                b'\r' if self.bytes.get(i + 1) == Some(&b'\n') => return (i, i + 2),
                b'\r' => return (i, i + 1),
                _ => i += 1,
            }
        }
        (i, i)
    }

    fn fenced_line(&mut self, start: usize, end: usize, fence: Fence, out: &mut Vec<Token>) {
        let p = self.skip_ws(start, end);
        let run = self.run_len(p, end, fence.marker);
        if run >= fence.len && self.skip_ws(p + run, end) == end {
            if p > start {
                push(out, TokenKind::Whitespace, start, p);
            }
            push(out, TokenKind::FenceClose, p, p + run);
            if p + run < end {
                push(out, TokenKind::Whitespace, p + run, end);
            }
            self.fence = None;
        } else {
            push(out, TokenKind::TextRun, start, end);
        }
    }

    fn block_line(&mut self, start: usize, end: usize, out: &mut Vec<Token>) {
        let p = self.skip_ws(start, end);
        if p > start {
            push(out, TokenKind::Whitespace, start, p);
        }

        match self.bytes[p] {
            b'#' => {
                let after = p + self.run_len(p, end, b'#');
                if after == end || is_ws(self.bytes[after]) {
                    push(out, TokenKind::HeadingMarker, p, after);
                    self.inline_after_ws(after, end, out);
                    return;
                }
            }
            marker @ (b'`' | b'~') => {
                let run = self.run_len(p, end, marker);
                let info = &self.bytes[p + run..end];
                if run >= 3 && (marker == b'~' || !info.contains(&b'`')) {
                    push(out, TokenKind::FenceOpen, p, p + run);
                    let q = self.skip_ws(p + run, end);
                    if q > p + run {
                        push(out, TokenKind::Whitespace, p + run, q);
                    }
                    if q < end {
                        push(out, TokenKind::TextRun, q, end);
                    }
                    self.fence = Some(Fence { marker, len: run });
                    return;
                }
            }
            bullet @ (b'-' | b'*' | b'+') => {
                let after = p + 1;
                let dash_checkbox = bullet == b'-' && self.checkbox_at(after, end);
                if after == end || is_ws(self.bytes[after]) || dash_checkbox {
                    push(out, TokenKind::ListMarker, p, after);
                    if bullet == b'-' {
                        self.task_tail(after, end, out);
                    } else {
                        self.inline_after_ws(after, end, out);
                    }
                    return;
                }
            }
            b'0'..=b'9' => {
                let digits = self.digits(p, end);
                let punct = p + digits;
                if digits <= 9
                    && punct < end
                    && matches!(self.bytes[punct], b'.' | b')')
                    && (punct + 1 == end || is_ws(self.bytes[punct + 1]))
                {
                    push(out, TokenKind::ListMarker, p, punct + 1);
                    self.inline_after_ws(punct + 1, end, out);
                    return;
                }
            }
            _ => {}
        }

        self.inline(p, end, out);
    }

    /// Checkbox, task id and description after a `-` marker. Every gap
    /// accepts any amount of whitespace, including none.
    fn task_tail(&mut self, after: usize, end: usize, out: &mut Vec<Token>) {
        let q = self.skip_ws(after, end);
        if !self.checkbox_at(q, end) {
            self.inline_after_ws(after, end, out);
            return;
        }
        if q > after {
            push(out, TokenKind::Whitespace, after, q);
        }
        push(out, TokenKind::CheckboxOpen, q, q + 1);
        push(out, TokenKind::CheckboxMark, q + 1, q + 2);
        push(out, TokenKind::CheckboxClose, q + 2, q + 3);

        let r = self.skip_ws(q + 3, end);
        if r > q + 3 {
            push(out, TokenKind::Whitespace, q + 3, r);
        }
        match self.task_id_at(r, end) {
            Some(id_end) => {
                push(out, TokenKind::TaskId, r, id_end);
                self.inline_after_ws(id_end, end, out);
            }
            None => self.inline(r, end, out),
        }
    }

    /// `\d{1,9}(\.\d{1,9})*\.?` followed by whitespace or end of line.
    fn task_id_at(&self, start: usize, end: usize) -> Option<usize> {
        let first = self.digits(start, end);
        if first == 0 || first > 9 {
            return None;
        }
        let mut i = start + first;
        while i < end && self.bytes[i] == b'.' {
            let segment = self.digits(i + 1, end);
            if segment == 0 {
                i += 1;
                break;
            }
            if segment > 9 {
                return None;
            }
            i += 1 + segment;
        }
        (i == end || is_ws(self.bytes[i])).then_some(i)
    }

    fn checkbox_at(&self, i: usize, end: usize) -> bool {
        i + 3 <= end
            && self.bytes[i] == b'['
            && matches!(self.bytes[i + 1], b' ' | b'x' | b'X')
            && self.bytes[i + 2] == b']'
    }

    fn inline_after_ws(&mut self, from: usize, end: usize, out: &mut Vec<Token>) {
        let q = self.skip_ws(from, end);
        if q > from {
            push(out, TokenKind::Whitespace, from, q);
        }
        self.inline(q, end, out);
    }

    /// Inline content: wikilinks, code spans, emphasis delimiters, text.
    fn inline(&mut self, start: usize, end: usize, out: &mut Vec<Token>) {
        let bytes = self.bytes;
        let mut text_start = start;
        let mut i = start;

        while i < end {
            match bytes[i] {
                b'[' if i + 1 < end && bytes[i + 1] == b'[' => {
                    match find_pair(&bytes[i + 2..end], b"]]") {
                        Some(len) if len > 0 => {
                            let close = i + 2 + len;
                            flush_text(out, text_start, i);
                            push(out, TokenKind::WikiLinkOpen, i, i + 2);
                            push(out, TokenKind::TextRun, i + 2, close);
                            push(out, TokenKind::WikiLinkClose, close, close + 2);
                            i = close + 2;
                            text_start = i;
                        }
                        _ => i += 1,
                    }
                }
                b'`' => {
                    let run = self.run_len(i, end, b'`');
                    match self.find_backtick_run(i + run, end, run) {
                        Some(close) => {
                            flush_text(out, text_start, i);
                            push(out, TokenKind::CodeSpanDelim, i, i + run);
                            push(out, TokenKind::TextRun, i + run, close);
                            push(out, TokenKind::CodeSpanDelim, close, close + run);
                            i = close + run;
                            text_start = i;
                        }
                        None => i += run,
                    }
                }
                b'*' => {
                    let run = self.run_len(i, end, b'*');
                    flush_text(out, text_start, i);
                    push(out, TokenKind::EmphasisDelim, i, i + run);
                    i += run;
                    text_start = i;
                }
                b'_' => {
                    let run = self.run_len(i, end, b'_');
                    let word_before = i > start && bytes[i - 1].is_ascii_alphanumeric();
                    let word_after = i + run < end && bytes[i + run].is_ascii_alphanumeric();
                    if !(word_before && word_after) {
                        flush_text(out, text_start, i);
                        push(out, TokenKind::EmphasisDelim, i, i + run);
                        text_start = i + run;
                    }
                    i += run;
                }
                _ => i += 1,
            }
        }
        flush_text(out, text_start, end);
    }

    /// Start of the next backtick run of exactly `len` in `[from, end)`.
    fn find_backtick_run(&self, from: usize, end: usize, len: usize) -> Option<usize> {
        let mut k = from;
        while k < end {
            if self.bytes[k] == b'`' {
                let run = self.run_len(k, end, b'`');
                if run == len {
                    return Some(k);
                }
                k += run;
            } else {
                k += 1;
            }
        }
        None
    }

    fn skip_ws(&self, mut i: usize, end: usize) -> usize {
        while i < end && is_ws(self.bytes[i]) {
            i += 1;
        }
        i
    }

    fn run_len(&self, i: usize, end: usize, byte: u8) -> usize {
        self.bytes[i..end].iter().take_while(|&&b| b == byte).count()
    }

    fn digits(&self, i: usize, end: usize) -> usize {
        self.bytes
            .get(i..end)
            .map_or(0, |rest| rest.iter().take_while(|b| b.is_ascii_digit()).count())
    }
}

#[inline]
fn is_ws(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

fn find_pair(haystack: &[u8], needle: &[u8; 2]) -> Option<usize> {
    haystack.windows(2).position(|w| w == needle)
}

#[inline]
fn push(out: &mut Vec<Token>, kind: TokenKind, start: usize, end: usize) {
    out.push(Token::new(kind, start as u32, end as u32));
}

#[inline]
fn flush_text(out: &mut Vec<Token>, start: usize, end: usize) {
    if start < end {
        push(out, TokenKind::TextRun, start, end);
    }
}
