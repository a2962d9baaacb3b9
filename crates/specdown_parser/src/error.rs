//! Parse error types.

use thiserror::Error;

/// Errors that can occur during parsing.
///
/// Malformed markdown is never an error; it degrades to text. Only input
/// that cannot be represented at all, or an edit that does not fit the
/// document, is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The input is not valid UTF-8.
    #[error("input is not valid UTF-8 (valid up to byte {valid_up_to})")]
    Encoding {
        /// Length of the longest valid prefix.
        valid_up_to: usize,
    },

    /// Spans are 32-bit; larger inputs cannot be represented.
    #[error("input of {len} bytes exceeds the {} byte limit", u32::MAX)]
    InputTooLarge { len: usize },

    /// An incremental edit range lies outside the document or splits a
    /// UTF-8 character.
    #[error("edit range {start}..{end} does not fit a document of {len} bytes")]
    IncrementalMismatch { start: usize, end: usize, len: usize },
}

impl ParseError {
    /// Creates an encoding error from a UTF-8 validation failure.
    pub fn encoding(err: std::str::Utf8Error) -> Self {
        Self::Encoding {
            valid_up_to: err.valid_up_to(),
        }
    }

    /// Creates an incremental mismatch error.
    pub fn mismatch(start: usize, end: usize, len: usize) -> Self {
        Self::IncrementalMismatch { start, end, len }
    }

    /// Rejects inputs whose offsets do not fit in a `u32`.
    pub(crate) fn check_len(len: usize) -> Result<(), Self> {
        if len > u32::MAX as usize {
            Err(Self::InputTooLarge { len })
        } else {
            Ok(())
        }
    }
}
