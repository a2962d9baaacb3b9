//! Block structure.
//!
//! The block parser consumes one *unit* per [`BlockParser::step`]: a line,
//! a run of blank lines, or a whole fenced code block. Open containers
//! (lists and items) live on a frame stack and are closed when a line no
//! longer belongs to them. A paragraph stays open across text lines until
//! a blank line or a structural line ends it.

use specdown_ast::{Node, NodeArena, NodeId, NodeKind, Span};

use super::alloc_parent;
use super::inline::{build_inlines, header_parts, task_data, trim_tokens};
use super::lines::{ItemLine, Line, LineKind, LineReader, classify};
use crate::lexer::TokenKind;

#[derive(Debug)]
enum Frame {
    Document {
        children: Vec<NodeId>,
    },
    List {
        ordered: bool,
        marker_col: u32,
        start: u32,
        end: u32,
        children: Vec<NodeId>,
    },
    Item {
        content_col: u32,
        kind: NodeKind,
        start: u32,
        end: u32,
        children: Vec<NodeId>,
    },
}

#[derive(Debug, Clone, Copy)]
struct OpenParagraph {
    start: u32,
    end: u32,
    first_token: usize,
    last_token: usize,
}

pub(crate) struct BlockParser<'s, 'a> {
    src: &'s str,
    reader: LineReader<'s>,
    arena: &'a mut NodeArena,
    stack: Vec<Frame>,
    paragraph: Option<OpenParagraph>,
    next: usize,
}

impl<'s, 'a> BlockParser<'s, 'a> {
    /// Parses `src` from `start`, which must be the start of a top-level
    /// block (or 0).
    pub(crate) fn new(src: &'s str, start: usize, arena: &'a mut NodeArena) -> Self {
        Self {
            src,
            reader: LineReader::new(src, start),
            arena,
            stack: vec![Frame::Document {
                children: Vec::new(),
            }],
            paragraph: None,
            next: 0,
        }
    }

    /// Parses to the end of input and returns the top-level blocks.
    pub(crate) fn run(mut self) -> Vec<NodeId> {
        while self.step() {}
        self.finish()
    }

    /// Start offset of the next unit, or `None` at end of input.
    pub(crate) fn next_line_start(&mut self) -> Option<u32> {
        self.reader.line(self.next).map(|line| line.start)
    }

    /// Whether the next unit would begin a new top-level block. At end of
    /// input this is trivially true.
    pub(crate) fn next_starts_top_level(&mut self) -> bool {
        let Some(line) = self.reader.line(self.next) else {
            return true;
        };
        match classify(self.src, self.reader.tokens(line)) {
            LineKind::Blank => {
                let (after, _) = self.blank_run_end(self.next);
                self.blank_keep(after) == 1
            }
            LineKind::Heading { indent } | LineKind::Fence { indent } => {
                self.content_keep(indent) == 1
            }
            LineKind::Text { indent } => {
                self.paragraph.is_none() && self.content_keep(indent) == 1
            }
            LineKind::Item(item) => self.list_keep(item) == 1,
        }
    }

    /// Consumes one unit. Returns false at end of input.
    pub(crate) fn step(&mut self) -> bool {
        let Some(line) = self.reader.line(self.next) else {
            return false;
        };
        match classify(self.src, self.reader.tokens(line)) {
            LineKind::Blank => self.blank_run(line),
            LineKind::Heading { indent } => {
                self.close_paragraph();
                let keep = self.content_keep(indent);
                self.pop_to(keep);
                self.header(line);
                self.next += 1;
            }
            LineKind::Fence { indent } => {
                self.close_paragraph();
                let keep = self.content_keep(indent);
                self.pop_to(keep);
                self.code_block(line);
            }
            LineKind::Item(item) => {
                self.close_paragraph();
                self.list_item(line, item);
                self.next += 1;
            }
            LineKind::Text { indent } => {
                self.text_line(line, indent);
                self.next += 1;
            }
        }
        true
    }

    /// Closes everything still open and returns the top-level blocks.
    pub(crate) fn finish(mut self) -> Vec<NodeId> {
        self.close_paragraph();
        self.pop_to(1);
        match self.stack.pop() {
            Some(Frame::Document { children }) => children,
            _ => Vec::new(),
        }
    }

    // Stack targets. Each returns how many frames to keep.

    /// Frames kept for a list item with marker column `item.marker_col`.
    /// The top kept frame is an item to nest in, a list to continue, or the
    /// document.
    fn list_keep(&self, item: ItemLine) -> usize {
        let mut len = self.stack.len();
        while len > 1 {
            match &self.stack[len - 1] {
                Frame::Item { content_col, .. } if item.marker_col >= *content_col => return len,
                Frame::List {
                    ordered,
                    marker_col,
                    ..
                } if *ordered == item.ordered && item.marker_col >= *marker_col => return len,
                Frame::Document { .. } => break,
                _ => len -= 1,
            }
        }
        1
    }

    /// Frames kept for non-item content indented by `indent` columns.
    fn content_keep(&self, indent: u32) -> usize {
        let mut len = self.stack.len();
        while len > 1 {
            if let Frame::Item { content_col, .. } = &self.stack[len - 1]
                && indent >= *content_col
            {
                return len;
            }
            len -= 1;
        }
        1
    }

    /// Frames kept for a blank run followed by line `after`. Blank lines
    /// stay inside a container only when the next line does.
    fn blank_keep(&mut self, after: usize) -> usize {
        let Some(line) = self.reader.line(after) else {
            return 1;
        };
        match classify(self.src, self.reader.tokens(line)) {
            LineKind::Item(item) => {
                let keep = self.list_keep(item);
                match self.stack.get(keep - 1) {
                    // The run belongs to the list's current item.
                    Some(Frame::List { .. }) if keep < self.stack.len() => keep + 1,
                    _ => keep,
                }
            }
            LineKind::Heading { indent }
            | LineKind::Fence { indent }
            | LineKind::Text { indent } => self.content_keep(indent),
            LineKind::Blank => 1,
        }
    }

    /// Index of the first non-blank line at or after `from`, and the end
    /// offset of the blank run.
    fn blank_run_end(&mut self, from: usize) -> (usize, u32) {
        let mut index = from;
        let mut end = 0;
        while let Some(line) = self.reader.line(index) {
            if !is_blank(&self.reader, line) {
                break;
            }
            end = line.end;
            index += 1;
        }
        (index, end)
    }

    // Units.

    fn blank_run(&mut self, first: Line) {
        self.close_paragraph();
        let (after, end) = self.blank_run_end(self.next);
        let keep = self.blank_keep(after);
        self.pop_to(keep);
        let id = self
            .arena
            .alloc(Node::new(NodeKind::BlankLines, Span::new(first.start, end)));
        self.push_child(id, end);
        self.next = after;
    }

    fn header(&mut self, line: Line) {
        let Some(parts) = header_parts(self.src, self.reader.tokens(line)) else {
            return;
        };
        let children = build_inlines(self.src, &parts.inline, self.arena);
        let id = alloc_parent(
            self.arena,
            NodeKind::Header {
                level: parts.level,
                text: parts.text,
            },
            Span::new(line.start, line.end),
            children,
        );
        self.push_child(id, line.end);
    }

    fn code_block(&mut self, open: Line) {
        let lang = self
            .reader
            .tokens(open)
            .iter()
            .find(|t| t.kind == TokenKind::TextRun)
            .and_then(|t| t.text(self.src).split_whitespace().next())
            .map(str::to_string);

        let mut index = self.next + 1;
        let mut end = open.end;
        let mut content_end = open.end;
        while let Some(line) = self.reader.line(index) {
            index += 1;
            let closes = self
                .reader
                .tokens(line)
                .iter()
                .any(|t| t.kind == TokenKind::FenceClose);
            if closes {
                content_end = line.start;
                end = line.end;
                break;
            }
            end = line.end;
            content_end = line.end;
        }

        let content = self
            .src
            .get(open.end as usize..content_end as usize)
            .unwrap_or_default()
            .to_string();
        let id = self.arena.alloc(Node::new(
            NodeKind::CodeBlock { lang, content },
            Span::new(open.start, end),
        ));
        self.push_child(id, end);
        self.next = index;
    }

    fn list_item(&mut self, line: Line, item: ItemLine) {
        let keep = self.list_keep(item);
        self.pop_to(keep);
        if !matches!(self.stack.last(), Some(Frame::List { .. })) {
            self.stack.push(Frame::List {
                ordered: item.ordered,
                marker_col: item.marker_col,
                start: line.start,
                end: line.end,
                children: Vec::new(),
            });
        }

        let tokens = self.reader.tokens(line);
        let kind = match task_data(self.src, tokens) {
            Some(task) => NodeKind::TaskItem(task),
            None => NodeKind::ListItem,
        };
        let first_inline = tokens.iter().position(|t| t.kind.is_inline());
        self.paragraph = first_inline.map(|offset| OpenParagraph {
            start: tokens[offset].span.start,
            end: line.end,
            first_token: line.first_token + offset,
            last_token: line.last_token,
        });
        self.stack.push(Frame::Item {
            content_col: item.content_col,
            kind,
            start: line.start,
            end: line.end,
            children: Vec::new(),
        });
    }

    fn text_line(&mut self, line: Line, indent: u32) {
        if let Some(paragraph) = &mut self.paragraph {
            paragraph.end = line.end;
            paragraph.last_token = line.last_token;
            return;
        }
        let keep = self.content_keep(indent);
        self.pop_to(keep);
        self.paragraph = Some(OpenParagraph {
            start: line.start,
            end: line.end,
            first_token: line.first_token,
            last_token: line.last_token,
        });
    }

    // Frame bookkeeping.

    fn close_paragraph(&mut self) {
        let Some(paragraph) = self.paragraph.take() else {
            return;
        };
        let tokens = trim_tokens(
            self.reader
                .token_range(paragraph.first_token, paragraph.last_token),
        );
        let children = build_inlines(self.src, tokens, self.arena);
        let id = alloc_parent(
            self.arena,
            NodeKind::Paragraph,
            Span::new(paragraph.start, paragraph.end),
            children,
        );
        self.push_child(id, paragraph.end);
    }

    fn pop_to(&mut self, keep: usize) {
        while self.stack.len() > keep.max(1) {
            self.close_frame();
        }
    }

    fn close_frame(&mut self) {
        let (kind, start, end, children) = match self.stack.pop() {
            Some(Frame::List {
                ordered,
                start,
                end,
                children,
                ..
            }) => (NodeKind::List { ordered }, start, end, children),
            Some(Frame::Item {
                kind,
                start,
                end,
                children,
                ..
            }) => (kind, start, end, children),
            Some(document @ Frame::Document { .. }) => {
                self.stack.push(document);
                return;
            }
            None => return,
        };
        let id = alloc_parent(self.arena, kind, Span::new(start, end), children);
        self.push_child(id, end);
    }

    fn push_child(&mut self, id: NodeId, child_end: u32) {
        match self.stack.last_mut() {
            Some(Frame::Document { children }) => children.push(id),
            Some(Frame::List { children, end, .. } | Frame::Item { children, end, .. }) => {
                children.push(id);
                *end = child_end;
            }
            None => {}
        }
    }
}

fn is_blank(reader: &LineReader<'_>, line: Line) -> bool {
    reader
        .tokens(line)
        .first()
        .is_some_and(|t| t.kind == TokenKind::BlankLine)
}
