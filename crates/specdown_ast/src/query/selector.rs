//! Selector syntax.
//!
//! ```text
//! selector   := step (combinator step)*
//! combinator := whitespace+ | whitespace* '>' whitespace*
//! step       := kind filter* | filter+
//! kind       := '*' | document | header | h1..h6 | paragraph | code | list
//!             | item | task | text | wikilink | inline-code | emphasis | blank
//! filter     := '[' name ']' | '[' name op value ']'
//! op         := '=' | '^=' | '*=' | '$='
//! value      := '"' .. '"' | '\'' .. '\'' | bare-word
//! ```

use thiserror::Error;

use crate::NodeType;

/// A malformed selector. `position` is a byte offset into the selector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid selector at offset {position}: {message}")]
pub struct QuerySyntaxError {
    pub position: usize,
    pub message: String,
}

impl QuerySyntaxError {
    fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum KindTest {
    Any,
    Node(NodeType),
    /// `item`: plain and task list items.
    Item,
    /// `h1`..`h6`.
    Heading(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Attr {
    Text,
    Lang,
    Id,
    Target,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Op {
    Equals,
    Prefix,
    Contains,
    Suffix,
}

impl Op {
    pub(crate) fn test(self, haystack: &str, value: &str) -> bool {
        match self {
            Op::Equals => haystack == value,
            Op::Prefix => haystack.starts_with(value),
            Op::Contains => haystack.contains(value),
            Op::Suffix => haystack.ends_with(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Filter {
    Level(u8),
    Attr { attr: Attr, op: Op, value: String },
    Checked(bool),
    Ordered(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Step {
    pub kind: KindTest,
    pub filters: Vec<Filter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Combinator {
    Descendant,
    Child,
}

/// A compiled selector. `combinators[i]` joins `steps[i]` and `steps[i + 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Selector {
    pub steps: Vec<Step>,
    pub combinators: Vec<Combinator>,
}

pub(crate) fn parse(input: &str) -> Result<Selector, QuerySyntaxError> {
    SelectorParser { input, pos: 0 }.parse()
}

struct SelectorParser<'s> {
    input: &'s str,
    pos: usize,
}

impl<'s> SelectorParser<'s> {
    fn parse(mut self) -> Result<Selector, QuerySyntaxError> {
        let mut steps = Vec::new();
        let mut combinators = Vec::new();

        self.skip_ws();
        if self.at_end() {
            return Err(QuerySyntaxError::new(self.pos, "empty selector"));
        }
        steps.push(self.step()?);

        loop {
            let had_ws = self.skip_ws();
            if self.at_end() {
                break;
            }
            let combinator = if self.eat('>') {
                self.skip_ws();
                if self.at_end() {
                    return Err(QuerySyntaxError::new(self.pos, "expected a step after `>`"));
                }
                Combinator::Child
            } else if had_ws {
                Combinator::Descendant
            } else {
                return Err(self.unexpected());
            };
            combinators.push(combinator);
            steps.push(self.step()?);
        }

        Ok(Selector { steps, combinators })
    }

    fn step(&mut self) -> Result<Step, QuerySyntaxError> {
        let kind = if self.peek() == Some('[') {
            KindTest::Any
        } else {
            self.kind()?
        };
        let mut filters = Vec::new();
        while self.peek() == Some('[') {
            filters.push(self.filter()?);
        }
        Ok(Step { kind, filters })
    }

    fn kind(&mut self) -> Result<KindTest, QuerySyntaxError> {
        let start = self.pos;
        if self.eat('*') {
            return Ok(KindTest::Any);
        }
        let name = self.ident();
        if name.is_empty() {
            return Err(self.unexpected());
        }
        let kind = match name {
            "document" => KindTest::Node(NodeType::Document),
            "header" => KindTest::Node(NodeType::Header),
            "h1" => KindTest::Heading(1),
            "h2" => KindTest::Heading(2),
            "h3" => KindTest::Heading(3),
            "h4" => KindTest::Heading(4),
            "h5" => KindTest::Heading(5),
            "h6" => KindTest::Heading(6),
            "paragraph" => KindTest::Node(NodeType::Paragraph),
            "code" => KindTest::Node(NodeType::CodeBlock),
            "list" => KindTest::Node(NodeType::List),
            "item" => KindTest::Item,
            "task" => KindTest::Node(NodeType::TaskItem),
            "text" => KindTest::Node(NodeType::Text),
            "wikilink" => KindTest::Node(NodeType::WikiLink),
            "inline-code" => KindTest::Node(NodeType::InlineCode),
            "emphasis" => KindTest::Node(NodeType::Emphasis),
            "blank" => KindTest::Node(NodeType::BlankLines),
            other => {
                return Err(QuerySyntaxError::new(
                    start,
                    format!("unknown node kind `{other}`"),
                ));
            }
        };
        Ok(kind)
    }

    fn filter(&mut self) -> Result<Filter, QuerySyntaxError> {
        self.expect('[')?;
        self.skip_ws();
        let name_start = self.pos;
        let name = self.ident();
        if name.is_empty() {
            return Err(QuerySyntaxError::new(name_start, "expected an attribute name"));
        }
        self.skip_ws();

        let filter = match name {
            "checked" => Filter::Checked(true),
            "unchecked" => Filter::Checked(false),
            "ordered" => Filter::Ordered(true),
            "unordered" => Filter::Ordered(false),
            "level" => {
                self.expect('=')?;
                self.skip_ws();
                let value_start = self.pos;
                let value = self.value()?;
                match value.parse::<u8>() {
                    Ok(level @ 1..=6) => Filter::Level(level),
                    _ => {
                        return Err(QuerySyntaxError::new(
                            value_start,
                            format!("header level must be 1 to 6, got `{value}`"),
                        ));
                    }
                }
            }
            "text" | "lang" | "id" | "target" => {
                let attr = match name {
                    "text" => Attr::Text,
                    "lang" => Attr::Lang,
                    "id" => Attr::Id,
                    _ => Attr::Target,
                };
                let op = self.op()?;
                self.skip_ws();
                let value = self.value()?;
                Filter::Attr { attr, op, value }
            }
            other => {
                return Err(QuerySyntaxError::new(
                    name_start,
                    format!("unknown attribute `{other}`"),
                ));
            }
        };

        self.skip_ws();
        self.expect(']')?;
        Ok(filter)
    }

    fn op(&mut self) -> Result<Op, QuerySyntaxError> {
        let op = match self.peek() {
            Some('=') => {
                self.pos += 1;
                return Ok(Op::Equals);
            }
            Some('^') => Op::Prefix,
            Some('*') => Op::Contains,
            Some('$') => Op::Suffix,
            _ => {
                return Err(QuerySyntaxError::new(
                    self.pos,
                    "expected one of `=`, `^=`, `*=`, `$=`",
                ));
            }
        };
        self.pos += 1;
        self.expect('=')?;
        Ok(op)
    }

    fn value(&mut self) -> Result<String, QuerySyntaxError> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                let open = self.pos;
                self.pos += 1;
                let rest = &self.input[self.pos..];
                match rest.find(quote) {
                    Some(len) => {
                        let value = rest[..len].to_string();
                        self.pos += len + 1;
                        Ok(value)
                    }
                    None => Err(QuerySyntaxError::new(open, "unterminated string")),
                }
            }
            _ => {
                let start = self.pos;
                while let Some(c) = self.peek() {
                    if c == ']' || c.is_whitespace() {
                        break;
                    }
                    self.pos += c.len_utf8();
                }
                if start == self.pos {
                    Err(QuerySyntaxError::new(start, "expected a value"))
                } else {
                    Ok(self.input[start..self.pos].to_string())
                }
            }
        }
    }

    fn ident(&mut self) -> &'s str {
        let input = self.input;
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        &input[start..self.pos]
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
        self.pos > start
    }

    fn expect(&mut self, c: char) -> Result<(), QuerySyntaxError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(QuerySyntaxError::new(self.pos, format!("expected `{c}`")))
        }
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn unexpected(&self) -> QuerySyntaxError {
        match self.peek() {
            Some(c) => QuerySyntaxError::new(self.pos, format!("unexpected `{c}`")),
            None => QuerySyntaxError::new(self.pos, "unexpected end of selector"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_parse_child_chain() {
        let selector = parse(r#"h2[text*="ADDED Requirements"] > h3[text^='Requirement:']"#).unwrap();
        assert_eq!(selector.combinators, vec![Combinator::Child]);
        assert_eq!(selector.steps[0].kind, KindTest::Heading(2));
        assert_eq!(
            selector.steps[1].filters,
            vec![Filter::Attr {
                attr: Attr::Text,
                op: Op::Prefix,
                value: "Requirement:".to_string()
            }]
        );
    }

    #[test]
    fn test_parse_descendant_and_bare_filters() {
        let selector = parse("list[ordered]   task[unchecked][id=1.2]").unwrap();
        assert_eq!(selector.combinators, vec![Combinator::Descendant]);
        assert_eq!(
            selector.steps[1].filters,
            vec![
                Filter::Checked(false),
                Filter::Attr {
                    attr: Attr::Id,
                    op: Op::Equals,
                    value: "1.2".to_string()
                }
            ]
        );
    }

    #[test]
    fn test_filter_only_step_matches_any_kind() {
        let selector = parse("[level=3]").unwrap();
        assert_eq!(selector.steps[0].kind, KindTest::Any);
        assert_eq!(selector.steps[0].filters, vec![Filter::Level(3)]);
    }

    #[rstest]
    #[case::empty("", 0)]
    #[case::blank("   ", 3)]
    #[case::unknown_kind("header > bogus", 9)]
    #[case::trailing_child("header >", 8)]
    #[case::unclosed_filter("task[checked", 12)]
    #[case::bad_level("header[level=9]", 13)]
    #[case::unknown_attr("task[color=red]", 5)]
    #[case::unterminated("header[text='abc]", 12)]
    #[case::missing_op("header[text]", 11)]
    #[case::junk_after_step("task!", 4)]
    fn test_syntax_errors_carry_position(#[case] input: &str, #[case] position: usize) {
        let err = parse(input).unwrap_err();
        assert_eq!(err.position, position, "{err}");
    }
}
