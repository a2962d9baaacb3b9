//! # specdown_parser
//!
//! Lexer, parser and incremental re-parser for the specdown markdown
//! dialect.
//!
//! ## Architecture
//!
//! - [`lexer`]: one pass per line, tracking only whether a fenced block is
//!   open. Every byte lands in exactly one token.
//! - `parser`: block structure over token lines, then inline content for
//!   paragraphs and headers.
//! - `incremental`: re-parses the smallest window an edit can affect.
//! - `task`: the single-line task recognizer used by task stores.
//!
//! ## Example
//!
//! ```rust
//! use specdown_parser::parse;
//!
//! let doc = parse("## Requirement: Login\n\n- [ ] 1.1 Add form\n").unwrap();
//! let task = doc.query("task[id=1.1]").unwrap().next().unwrap();
//! assert_eq!(task.display_text(), "Add form");
//! ```

mod error;
mod incremental;
pub mod lexer;
mod parser;
mod task;

pub use error::ParseError;
pub use incremental::incremental_update;
pub use lexer::{Token, TokenKind, tokenize, tokenize_str};
pub use parser::{parse, parse_bytes};
pub use task::{TaskLine, match_task_line};

/// File extensions treated as specdown documents.
pub const EXTENSIONS: &[&str] = &["md", "markdown"];
