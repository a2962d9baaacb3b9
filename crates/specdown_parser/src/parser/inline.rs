//! Inline tree construction.
//!
//! Inline tokens are first folded into atoms (wikilinks and code spans
//! become single atoms), emphasis delimiters are paired with a stack, and
//! the atoms are then assembled into nodes. Unpaired delimiters are plain
//! text and adjacent text merges into one `Text` node.

use specdown_ast::{DottedNumber, Node, NodeArena, NodeId, NodeKind, Span, TaskData};

use super::alloc_parent;
use crate::lexer::{Token, TokenKind};

#[derive(Debug)]
enum Atom {
    Text(Span),
    WikiLink { span: Span, target: String },
    Code(Span),
    Delim { byte: u8, len: u32, span: Span },
}

enum Pending {
    Text(Span),
    Node(NodeId),
}

struct Level {
    start: u32,
    strong: bool,
    children: Vec<Pending>,
}

impl Level {
    fn push_text(&mut self, span: Span) {
        if let Some(Pending::Text(last)) = self.children.last_mut()
            && last.end == span.start
        {
            last.end = span.end;
            return;
        }
        self.children.push(Pending::Text(span));
    }
}

/// Builds inline nodes for `tokens` and returns the top-level ids.
pub(crate) fn build_inlines(src: &str, tokens: &[Token], arena: &mut NodeArena) -> Vec<NodeId> {
    let atoms = atoms(src, tokens);
    let closers = pair_delimiters(&atoms);

    let mut stack = vec![Level {
        start: 0,
        strong: false,
        children: Vec::new(),
    }];
    for (index, atom) in atoms.into_iter().enumerate() {
        match atom {
            Atom::Delim { len, span, .. } => match closers[index] {
                Pairing::Opener => stack.push(Level {
                    start: span.start,
                    strong: len >= 2,
                    children: Vec::new(),
                }),
                Pairing::Closer if stack.len() > 1 => {
                    let Some(level) = stack.pop() else { break };
                    let children = materialize(level.children, arena);
                    let id = alloc_parent(
                        arena,
                        NodeKind::Emphasis {
                            strong: level.strong,
                        },
                        Span::new(level.start, span.end),
                        children,
                    );
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(Pending::Node(id));
                    }
                }
                _ => {
                    if let Some(level) = stack.last_mut() {
                        level.push_text(span);
                    }
                }
            },
            Atom::Text(span) => {
                if let Some(level) = stack.last_mut() {
                    level.push_text(span);
                }
            }
            Atom::WikiLink { span, target } => {
                let id = arena.alloc(Node::new(NodeKind::WikiLink { target }, span));
                if let Some(level) = stack.last_mut() {
                    level.children.push(Pending::Node(id));
                }
            }
            Atom::Code(span) => {
                let id = arena.alloc(Node::new(NodeKind::InlineCode, span));
                if let Some(level) = stack.last_mut() {
                    level.children.push(Pending::Node(id));
                }
            }
        }
    }

    // Pairs nest properly, so only the base level is left.
    stack
        .pop()
        .map(|level| materialize(level.children, arena))
        .unwrap_or_default()
}

fn materialize(children: Vec<Pending>, arena: &mut NodeArena) -> Vec<NodeId> {
    children
        .into_iter()
        .map(|child| match child {
            Pending::Text(span) => arena.alloc(Node::new(NodeKind::Text, span)),
            Pending::Node(id) => id,
        })
        .collect()
}

fn atoms(src: &str, tokens: &[Token]) -> Vec<Atom> {
    let mut atoms = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i];
        let triple = |open: TokenKind| {
            matches!(
                (tokens.get(i + 1), tokens.get(i + 2)),
                (Some(inner), Some(close)) if inner.kind == TokenKind::TextRun && close.kind == open
            )
        };
        match token.kind {
            TokenKind::WikiLinkOpen if triple(TokenKind::WikiLinkClose) => {
                let inner = tokens[i + 1].text(src);
                let target = inner.split('|').next().unwrap_or(inner).trim().to_string();
                atoms.push(Atom::WikiLink {
                    span: token.span.merge(&tokens[i + 2].span),
                    target,
                });
                i += 3;
                continue;
            }
            TokenKind::CodeSpanDelim if triple(TokenKind::CodeSpanDelim) => {
                atoms.push(Atom::Code(token.span.merge(&tokens[i + 2].span)));
                i += 3;
                continue;
            }
            TokenKind::EmphasisDelim => {
                let byte = src.as_bytes().get(token.byte_start()).copied().unwrap_or(b'*');
                atoms.push(Atom::Delim {
                    byte,
                    len: token.span.len(),
                    span: token.span,
                });
            }
            _ => atoms.push(Atom::Text(token.span)),
        }
        i += 1;
    }
    atoms
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pairing {
    Unpaired,
    Opener,
    Closer,
}

/// A delimiter closes the nearest open delimiter of the same character and
/// run length. Openers above the match stay unpaired.
fn pair_delimiters(atoms: &[Atom]) -> Vec<Pairing> {
    let mut pairing = vec![Pairing::Unpaired; atoms.len()];
    let mut open: Vec<usize> = Vec::new();
    for (index, atom) in atoms.iter().enumerate() {
        let Atom::Delim { byte, len, .. } = atom else {
            continue;
        };
        let partner = open.iter().rposition(|&o| {
            matches!(&atoms[o], Atom::Delim { byte: b, len: l, .. } if b == byte && l == len)
        });
        match partner {
            Some(pos) => {
                pairing[open[pos]] = Pairing::Opener;
                pairing[index] = Pairing::Closer;
                open.truncate(pos);
            }
            None => open.push(index),
        }
    }
    pairing
}

/// Strips leading whitespace tokens and the final line terminator.
pub(crate) fn trim_tokens(tokens: &[Token]) -> &[Token] {
    let start = tokens
        .iter()
        .position(|t| t.kind != TokenKind::Whitespace)
        .unwrap_or(tokens.len());
    let mut end = tokens.len();
    if end > start && tokens[end - 1].kind == TokenKind::Newline {
        end -= 1;
    }
    &tokens[start..end]
}

/// End of a line's content: the end of its last non-terminator token.
fn content_end(tokens: &[Token]) -> Option<u32> {
    tokens
        .iter()
        .rev()
        .find(|t| !t.kind.ends_line())
        .map(|t| t.span.end)
}

/// Level, text and inline tokens of a header line.
#[derive(Debug)]
pub(crate) struct HeaderParts {
    pub level: u8,
    pub text: String,
    pub inline: Vec<Token>,
}

pub(crate) fn header_parts(src: &str, tokens: &[Token]) -> Option<HeaderParts> {
    let marker = tokens
        .iter()
        .position(|t| t.kind == TokenKind::HeadingMarker)?;
    let level = tokens[marker].span.len().min(6) as u8;

    let rest = &tokens[marker + 1..];
    let Some(first) = rest
        .iter()
        .position(|t| !matches!(t.kind, TokenKind::Whitespace | TokenKind::Newline))
    else {
        return Some(HeaderParts {
            level,
            text: String::new(),
            inline: Vec::new(),
        });
    };
    let start = rest[first].span.start;
    let end = content_end(rest).unwrap_or(start);
    let text = strip_closing_sequence(src.get(start as usize..end as usize).unwrap_or_default());
    let text_end = start + text.len() as u32;

    let inline = rest[first..]
        .iter()
        .filter(|t| !t.kind.ends_line() && t.span.start < text_end)
        .map(|t| Token::new(t.kind, t.span.start, t.span.end.min(text_end)))
        .collect();
    Some(HeaderParts {
        level,
        text: text.to_string(),
        inline,
    })
}

/// Drops trailing whitespace and an optional closing `#` run.
fn strip_closing_sequence(raw: &str) -> &str {
    let trimmed = raw.trim_end_matches([' ', '\t']);
    let without = trimmed.trim_end_matches('#');
    if without.len() < trimmed.len()
        && (without.is_empty() || without.ends_with([' ', '\t']))
    {
        without.trim_end_matches([' ', '\t'])
    } else {
        trimmed
    }
}

/// Task fields from an item line, or `None` if the line has no checkbox.
pub(crate) fn task_data(src: &str, tokens: &[Token]) -> Option<TaskData> {
    let mark = tokens.iter().find(|t| t.kind == TokenKind::CheckboxMark)?;
    let checked = matches!(src.as_bytes().get(mark.byte_start()), Some(b'x' | b'X'));
    let id = tokens
        .iter()
        .find(|t| t.kind == TokenKind::TaskId)
        .and_then(|t| DottedNumber::parse(t.text(src)));
    let description = match (
        tokens.iter().find(|t| t.kind.is_inline()),
        content_end(tokens),
    ) {
        (Some(first), Some(end)) => src
            .get(first.byte_start()..end as usize)
            .unwrap_or_default()
            .trim()
            .to_string(),
        _ => String::new(),
    };
    Some(TaskData {
        id,
        checked,
        description,
        mark_offset: mark.span.start,
    })
}
