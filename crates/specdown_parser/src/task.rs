//! Single-line task matching.
//!
//! Task status stores work line by line on `tasks.md`; this is the same
//! recognizer the parser uses for `TaskItem`s, exposed for one line.

use specdown_ast::DottedNumber;

use crate::lexer::{Lexer, TokenKind};

/// A recognized task line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskLine {
    /// Dotted task number, normalized (`1.2.` becomes `1.2`).
    pub id: Option<String>,
    pub checked: bool,
    pub description: String,
}

/// Matches `- [ ] 1.2 Description` style lines.
///
/// Leading indentation is allowed. Whitespace between the parts may be any
/// run of spaces or tabs, including none. Only the first line of `line` is
/// considered.
///
/// ```rust
/// use specdown_parser::match_task_line;
///
/// let task = match_task_line("- [X]\t3.1.  Ship it").unwrap();
/// assert_eq!(task.id.as_deref(), Some("3.1"));
/// assert!(task.checked);
/// assert_eq!(task.description, "Ship it");
///
/// assert!(match_task_line("* [ ] starred").is_none());
/// ```
pub fn match_task_line(line: &str) -> Option<TaskLine> {
    let mut tokens = Vec::new();
    Lexer::new(line).next_line(&mut tokens);

    let mut iter = tokens
        .iter()
        .filter(|t| !matches!(t.kind, TokenKind::Whitespace))
        .peekable();
    let marker = iter.next()?;
    if marker.kind != TokenKind::ListMarker || marker.text(line) != "-" {
        return None;
    }
    if iter.next()?.kind != TokenKind::CheckboxOpen {
        return None;
    }
    let mark = iter.next()?;
    let checked = matches!(mark.text(line), "x" | "X");
    iter.next()?;

    let id = iter
        .next_if(|t| t.kind == TokenKind::TaskId)
        .map(|t| match DottedNumber::parse(t.text(line)) {
            Some(number) => number.to_string(),
            None => t.text(line).trim_end_matches('.').to_string(),
        });

    let description = match iter.find(|t| t.kind.is_inline()) {
        Some(first) => {
            let end = tokens
                .iter()
                .rev()
                .find(|t| !t.kind.ends_line())
                .map_or(first.byte_end(), |t| t.byte_end());
            line.get(first.byte_start()..end)
                .unwrap_or_default()
                .trim()
                .to_string()
        }
        None => String::new(),
    };

    Some(TaskLine {
        id,
        checked,
        description,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn task(id: Option<&str>, checked: bool, description: &str) -> Option<TaskLine> {
        Some(TaskLine {
            id: id.map(str::to_string),
            checked,
            description: description.to_string(),
        })
    }

    #[rstest]
    #[case::single_spaces("- [ ] 1.2 Task")]
    #[case::double_spaces("- [ ]  1.2  Task")]
    #[case::triple_spaces("-   [ ]   1.2   Task")]
    #[case::tabs("-\t[ ]\t1.2\tTask")]
    #[case::no_spaces("-[ ]1.2 Task")]
    #[case::trailing_dot("- [ ] 1.2. Task")]
    #[case::indented("    - [ ] 1.2 Task")]
    #[case::trailing_ws("- [ ] 1.2 Task  \n")]
    fn test_whitespace_tolerance(#[case] line: &str) {
        assert_eq!(match_task_line(line), task(Some("1.2"), false, "Task"));
    }

    #[rstest]
    #[case::lower("- [x] 1 Done", true)]
    #[case::upper("- [X] 1 Done", true)]
    #[case::open("- [ ] 1 Done", false)]
    fn test_checked_is_case_insensitive(#[case] line: &str, #[case] checked: bool) {
        assert_eq!(match_task_line(line), task(Some("1"), checked, "Done"));
    }

    #[rstest]
    #[case::no_id("- [ ] Write docs", task(None, false, "Write docs"))]
    #[case::digit_word("- [ ] 3D printing", task(None, false, "3D printing"))]
    #[case::id_only("- [x] 4", task(Some("4"), true, ""))]
    #[case::empty("- [ ]", task(None, false, ""))]
    #[case::inline_markup("- [ ] 2 Fix `parse` in [[Parser]]", task(Some("2"), false, "Fix `parse` in [[Parser]]"))]
    fn test_parts(#[case] line: &str, #[case] expected: Option<TaskLine>) {
        assert_eq!(match_task_line(line), expected);
    }

    #[rstest]
    #[case::star_bullet("* [ ] nope")]
    #[case::plus_bullet("+ [ ] nope")]
    #[case::ordered("1. [ ] nope")]
    #[case::no_checkbox("- plain item")]
    #[case::bad_mark("- [-] nope")]
    #[case::paragraph("[ ] nope")]
    #[case::blank("   ")]
    #[case::empty_input("")]
    fn test_non_tasks(#[case] line: &str) {
        assert_eq!(match_task_line(line), None);
    }
}
