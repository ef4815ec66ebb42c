//! Tokens: the smallest lexical units of the managed text
//!
//! A [`Token`] is a shared handle (`Rc`) to a mutable raw-text cell. At most
//! one [`TokenStore`](crate::store::TokenStore) owns a token at a time; a
//! token outside any store is *detached*. Each token carries a stable
//! [`TokenId`] assigned at creation, which is what
//! [`Transformer`](crate::node::Transformer) maps during deep copies instead
//! of relying on pointer identity.
//!
//! Placeholders are tokens with permanently empty raw text. They are never
//! printed, but they are always present, giving absent optional fields and
//! empty repeated fields a stable insertion point.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::position::Position;
use crate::store::{StoreData, TokenStore};

/// Stable identity handle, unique per created token for the process
/// lifetime. Copies made by [`Token::copy`] receive fresh ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(u64);

fn next_token_id() -> TokenId {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    TokenId(COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// The concrete kind of a token.
///
/// The engine only interprets the first four kinds (placeholder anchoring,
/// comment claiming, separator synthesis); every grammar terminal arrives as
/// [`TokenKind::Term`] tagged with its terminal name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Zero-width anchor; raw text is permanently empty.
    Placeholder,
    Newline,
    Whitespace,
    /// A ledger comment line (or block of consecutive comment lines).
    Comment,
    /// Any other grammar terminal, tagged with its terminal-type name.
    Term(Box<str>),
}

pub(crate) struct Attachment {
    pub(crate) store: Weak<RefCell<StoreData>>,
    pub(crate) index: usize,
    pub(crate) position: Position,
}

pub(crate) struct TokenData {
    pub(crate) kind: TokenKind,
    pub(crate) text: String,
    pub(crate) claimed: bool,
    pub(crate) attachment: Option<Attachment>,
}

/// A shared handle to one token.
///
/// Equality compares kind and raw text (two independently created `" "`
/// whitespace tokens are equal); use [`Token::same`] for identity.
#[derive(Clone)]
pub struct Token {
    id: TokenId,
    pub(crate) data: Rc<RefCell<TokenData>>,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        let text = text.into();
        if kind == TokenKind::Placeholder {
            assert!(text.is_empty(), "placeholder raw text must be empty");
        }
        Self {
            id: next_token_id(),
            data: Rc::new(RefCell::new(TokenData {
                kind,
                text,
                claimed: false,
                attachment: None,
            })),
        }
    }

    /// Creates a fresh zero-width placeholder.
    pub fn placeholder() -> Self {
        Self::new(TokenKind::Placeholder, "")
    }

    pub fn newline() -> Self {
        Self::new(TokenKind::Newline, "\n")
    }

    pub fn whitespace(text: impl Into<String>) -> Self {
        Self::new(TokenKind::Whitespace, text)
    }

    pub fn term(name: impl Into<Box<str>>, text: impl Into<String>) -> Self {
        Self::new(TokenKind::Term(name.into()), text)
    }

    pub fn id(&self) -> TokenId {
        self.id
    }

    pub fn kind(&self) -> TokenKind {
        self.data.borrow().kind.clone()
    }

    pub fn is_placeholder(&self) -> bool {
        self.data.borrow().kind == TokenKind::Placeholder
    }

    pub fn is_newline(&self) -> bool {
        self.data.borrow().kind == TokenKind::Newline
    }

    pub fn is_comment(&self) -> bool {
        self.data.borrow().kind == TokenKind::Comment
    }

    /// The token's raw source text, exactly as it will be printed.
    pub fn raw_text(&self) -> String {
        self.data.borrow().text.clone()
    }

    /// Replaces the raw text in place and repositions every later token in
    /// the owning store.
    ///
    /// # Panics
    ///
    /// Panics when called on a placeholder; placeholder text is permanently
    /// empty.
    pub fn set_raw_text(&self, text: impl Into<String>) {
        let store = {
            let mut data = self.data.borrow_mut();
            assert!(
                data.kind != TokenKind::Placeholder,
                "cannot edit the raw text of a placeholder"
            );
            data.text = text.into();
            data.attachment
                .as_ref()
                .and_then(|attachment| attachment.store.upgrade())
        };
        if let Some(store) = store {
            TokenStore::from_shared(store).update(self);
        }
    }

    /// `true` when this token is owned by some store.
    pub fn is_attached(&self) -> bool {
        self.data.borrow().attachment.is_some()
    }

    /// The cached position of the token's first byte, if attached.
    pub fn position(&self) -> Option<Position> {
        self.data
            .borrow()
            .attachment
            .as_ref()
            .map(|attachment| attachment.position)
    }

    /// The owning store, if any.
    pub fn store(&self) -> Option<TokenStore> {
        self.data
            .borrow()
            .attachment
            .as_ref()
            .and_then(|attachment| attachment.store.upgrade())
            .map(TokenStore::from_shared)
    }

    /// Identity comparison: same underlying token, not merely equal content.
    pub fn same(&self, other: &Token) -> bool {
        self.id == other.id
    }

    /// A detached copy with identical kind, text and claimed flag but a
    /// fresh [`TokenId`].
    pub fn copy(&self) -> Token {
        let data = self.data.borrow();
        Token {
            id: next_token_id(),
            data: Rc::new(RefCell::new(TokenData {
                kind: data.kind.clone(),
                text: data.text.clone(),
                claimed: data.claimed,
                attachment: None,
            })),
        }
    }

    /// Whether a comment token is currently owned by a node or repeated
    /// collection. Always `false` for non-comments.
    pub fn is_claimed(&self) -> bool {
        self.data.borrow().claimed
    }

    pub(crate) fn set_claimed(&self, claimed: bool) {
        self.data.borrow_mut().claimed = claimed;
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        let a = self.data.borrow();
        let b = other.data.borrow();
        a.kind == b.kind && a.text == b.text
    }
}

impl Eq for Token {}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data.borrow();
        f.debug_struct("Token")
            .field("id", &self.id.0)
            .field("kind", &data.kind)
            .field("text", &data.text)
            .field("attached", &data.attachment.is_some())
            .finish()
    }
}

/// Typed view over a [`TokenKind::Comment`] token.
///
/// The raw text is one or more comment lines, each shaped
/// `indent ";" [" " value]`; `indent` and `value` are derived from the raw
/// text on demand so in-place edits stay visible.
#[derive(Clone, Debug)]
pub struct BlockComment {
    token: Token,
}

impl BlockComment {
    /// Wraps an existing comment token. Returns `None` for any other kind.
    pub fn from_token(token: Token) -> Option<Self> {
        token.is_comment().then_some(Self { token })
    }

    /// Builds a detached comment token from an indent and a value; each line
    /// of `value` becomes one comment line.
    pub fn from_value(indent: &str, value: &str) -> Self {
        let raw = value
            .split('\n')
            .map(|line| {
                if line.is_empty() {
                    format!("{indent};")
                } else {
                    format!("{indent}; {line}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            token: Token::new(TokenKind::Comment, raw),
        }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn into_token(self) -> Token {
        self.token
    }

    /// The leading whitespace of the first comment line.
    pub fn indent(&self) -> String {
        let raw = self.token.raw_text();
        let first = raw.split('\n').next().unwrap_or("");
        let end = first.len() - first.trim_start_matches([' ', '\t']).len();
        first[..end].to_string()
    }

    /// The comment text with indent, `;` markers and one marker-adjacent
    /// space stripped from every line.
    pub fn value(&self) -> String {
        self.token
            .raw_text()
            .split('\n')
            .map(|line| {
                let line = line.trim_start_matches([' ', '\t']);
                let line = line.strip_prefix(';').unwrap_or(line);
                line.strip_prefix(' ').unwrap_or(line)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Rewrites the comment text, preserving the current indent.
    pub fn set_value(&self, value: &str) {
        let updated = Self::from_value(&self.indent(), value);
        self.token.set_raw_text(updated.token.raw_text());
    }

    pub fn is_claimed(&self) -> bool {
        self.token.is_claimed()
    }
}

impl PartialEq for BlockComment {
    fn eq(&self, other: &Self) -> bool {
        self.token == other.token
    }
}

impl Eq for BlockComment {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_compares_kind_and_text() {
        assert_eq!(Token::whitespace(" "), Token::whitespace(" "));
        assert_ne!(Token::whitespace(" "), Token::whitespace("  "));
        assert_ne!(
            Token::term("ACCOUNT", "Assets:Foo"),
            Token::term("CURRENCY", "Assets:Foo")
        );
    }

    #[test]
    fn identity_is_distinct_from_equality() {
        let a = Token::newline();
        let b = Token::newline();
        assert_eq!(a, b);
        assert!(!a.same(&b));
        assert!(a.same(&a.clone()));
    }

    #[test]
    fn copy_gets_a_fresh_id() {
        let token = Token::term("DATE", "2000-01-01");
        let copy = token.copy();
        assert_eq!(token, copy);
        assert!(!token.same(&copy));
        assert!(!copy.is_attached());
    }

    #[test]
    #[should_panic(expected = "placeholder raw text")]
    fn placeholder_text_must_be_empty() {
        Token::new(TokenKind::Placeholder, "x");
    }

    #[test]
    #[should_panic(expected = "cannot edit the raw text of a placeholder")]
    fn placeholder_text_cannot_change() {
        Token::placeholder().set_raw_text("x");
    }

    #[test]
    fn block_comment_round_trips_indent_and_value() {
        let comment = BlockComment::from_value("  ", "todo\ncheck");
        assert_eq!(comment.token().raw_text(), "  ; todo\n  ; check");
        assert_eq!(comment.indent(), "  ");
        assert_eq!(comment.value(), "todo\ncheck");
    }

    #[test]
    fn block_comment_set_value_keeps_indent() {
        let comment = BlockComment::from_value("    ", "old");
        comment.set_value("new");
        assert_eq!(comment.token().raw_text(), "    ; new");
    }

    #[test]
    fn block_comment_rejects_other_kinds() {
        assert!(BlockComment::from_token(Token::newline()).is_none());
    }
}
