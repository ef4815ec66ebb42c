//! Error types for tree editing and adaptation
//!
//! Domain failures such as claim conflicts, explicit comments missing from
//! scope, metadata mismatches reported by the parser adapter, and
//! slice-assignment length mismatches are [`TallyError`] values and
//! propagate immediately;
//! nothing in this crate retries. Structural misuse (reusing an attached
//! token, detaching a partial span, out-of-range indices) is a programming
//! error and panics instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TallyError {
    /// The comment is already owned by a different node or collection.
    #[error("comment is already claimed: {comment:?}")]
    AlreadyClaimed { comment: String },

    /// No `newline + comment` pattern adjacent to the node's span.
    #[error("no claimable comment {side} the node")]
    NoAdjacentComment { side: &'static str },

    /// A comment named in an explicit claim/unclaim list is not in scope.
    #[error("comment not found in scope: {comment:?}")]
    CommentNotFound { comment: String },

    /// Non-unit-step slice assignment with a value list of the wrong length.
    #[error("attempt to assign sequence of size {actual} to extended slice of size {expected}")]
    SliceLengthMismatch { expected: usize, actual: usize },

    /// The parse tree names a rule with no registered node spec.
    #[error("no node spec registered for rule '{rule}'")]
    UnknownRule { rule: String },

    /// A rule node's child count does not match its spec's field count.
    #[error("rule '{rule}' expects {expected} children, got {actual}")]
    FieldArity {
        rule: String,
        expected: usize,
        actual: usize,
    },

    /// A parse-tree child does not fit its field's cardinality.
    #[error("field '{field}' of rule '{rule}' cannot hold {found}")]
    ChildShape {
        rule: String,
        field: String,
        found: &'static str,
    },

    /// The parse tree consumes tokens out of stream order, or leaves a
    /// significant token unconsumed.
    #[error("inconsistent token stream at index {index}: {detail}")]
    InconsistentTokenStream { index: usize, detail: &'static str },
}

impl TallyError {
    pub fn already_claimed(comment: impl Into<String>) -> Self {
        Self::AlreadyClaimed {
            comment: comment.into(),
        }
    }

    pub fn no_adjacent_comment(side: &'static str) -> Self {
        Self::NoAdjacentComment { side }
    }

    pub fn comment_not_found(comment: impl Into<String>) -> Self {
        Self::CommentNotFound {
            comment: comment.into(),
        }
    }

    pub fn unknown_rule(rule: impl Into<String>) -> Self {
        Self::UnknownRule { rule: rule.into() }
    }
}
