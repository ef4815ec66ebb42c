//! Source positions with line/column folding
//!
//! Every token attached to a [`TokenStore`](crate::store::TokenStore) caches
//! the position of its first byte. Positions are combined with deltas derived
//! from raw text: adding a delta that contains a newline *resets* the column
//! instead of summing it, so repositioning after a splice is a single
//! left-to-right fold over the affected suffix.

use std::fmt;
use std::ops::Add;

/// A location in the managed text: byte offset, zero-based line, and
/// zero-based byte column within that line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// The start of the text.
    pub const START: Position = Position {
        offset: 0,
        line: 0,
        column: 0,
    };

    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }

    /// Computes the positional delta spanned by `text`.
    ///
    /// The delta's `line` counts newlines in `text`; its `column` is the
    /// number of bytes after the last newline (or all of `text` when there is
    /// none).
    pub fn text_delta(text: &str) -> Self {
        let lines = text.bytes().filter(|&b| b == b'\n').count();
        let column = match text.rfind('\n') {
            Some(at) => text.len() - at - 1,
            None => text.len(),
        };
        Self {
            offset: text.len(),
            line: lines,
            column,
        }
    }
}

/// Non-commutative folding addition: `self` is an absolute position, `rhs` a
/// delta. A delta spanning a newline carries its own column; one that does
/// not extends the current line.
impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position {
            offset: self.offset + rhs.offset,
            line: self.line + rhs.line,
            column: if rhs.line > 0 {
                rhs.column
            } else {
                self.column + rhs.column
            },
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}
