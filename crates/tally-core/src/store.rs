//! Ordered token buffer with cached absolute positions
//!
//! A [`TokenStore`] owns the totally ordered token sequence of one managed
//! text. Concatenating the raw text of its tokens in order reproduces that
//! text exactly; this is the round-trip contract everything else builds on.
//!
//! Every mutation funnels through one splice primitive that replaces a
//! contiguous index range and then repositions/reindexes the suffix in a
//! single O(k) pass. Ownership is checked at every mutating entry point: a
//! token still attached to another store is rejected synchronously instead
//! of silently corrupting two texts at once.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use tracing::trace;

use crate::position::Position;
use crate::token::{Attachment, Token, TokenId};

pub(crate) struct StoreData {
    pub(crate) tokens: Vec<Token>,
}

/// A shared handle to one token store.
#[derive(Clone)]
pub struct TokenStore {
    inner: Rc<RefCell<StoreData>>,
}

impl TokenStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(StoreData { tokens: Vec::new() })),
        }
    }

    /// Bulk-constructs a store from detached tokens, in order.
    ///
    /// # Panics
    ///
    /// Panics if any token is already owned by a store.
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        let store = Self::new();
        store.splice_at(0, 0, tokens);
        store
    }

    pub(crate) fn from_shared(inner: Rc<RefCell<StoreData>>) -> Self {
        Self { inner }
    }

    /// Identity comparison between store handles.
    pub fn same(&self, other: &TokenStore) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().tokens.is_empty()
    }

    /// A snapshot of the token sequence.
    pub fn tokens(&self) -> Vec<Token> {
        self.inner.borrow().tokens.clone()
    }

    /// The full managed text: raw text of every token, concatenated.
    pub fn text(&self) -> String {
        self.tokens().iter().map(Token::raw_text).collect()
    }

    pub fn get(&self, index: usize) -> Option<Token> {
        self.inner.borrow().tokens.get(index).cloned()
    }

    pub fn first(&self) -> Option<Token> {
        self.get(0)
    }

    pub fn last(&self) -> Option<Token> {
        let data = self.inner.borrow();
        data.tokens.last().cloned()
    }

    /// The index of `token` within this store.
    ///
    /// # Panics
    ///
    /// Panics if the token is detached or owned by a different store.
    pub fn index_of(&self, token: &Token) -> usize {
        index_in(token, &self.inner).expect("token is not owned by this store")
    }

    /// O(1) predecessor via the cached index.
    pub fn get_prev(&self, token: &Token) -> Option<Token> {
        let index = self.index_of(token);
        if index == 0 { None } else { self.get(index - 1) }
    }

    /// O(1) successor via the cached index.
    pub fn get_next(&self, token: &Token) -> Option<Token> {
        self.get(self.index_of(token) + 1)
    }

    /// Replaces the inclusive range `[first, last]` with `new_tokens`.
    ///
    /// Tokens in `new_tokens` must be detached, or already owned by this
    /// store *inside* the replaced range (which lets an edit keep existing
    /// separators). Replaced tokens that do not reappear are detached. There
    /// is no partial-splice rollback; misuse panics before any mutation.
    pub fn splice(&self, new_tokens: Vec<Token>, first: &Token, last: &Token) {
        let start = self.index_of(first);
        let end = self.index_of(last);
        assert!(start <= end, "splice range is reversed");
        self.splice_at(start, end + 1, new_tokens);
    }

    /// Inserts detached tokens immediately before `anchor`.
    pub fn insert_before(&self, anchor: &Token, new_tokens: Vec<Token>) {
        let index = self.index_of(anchor);
        self.splice_at(index, index, new_tokens);
    }

    /// Inserts detached tokens immediately after `anchor`.
    pub fn insert_after(&self, anchor: &Token, new_tokens: Vec<Token>) {
        let index = self.index_of(anchor);
        self.splice_at(index + 1, index + 1, new_tokens);
    }

    /// Appends one detached token at the end.
    pub fn push(&self, token: Token) {
        let len = self.len();
        self.splice_at(len, len, vec![token]);
    }

    /// Removes the inclusive range `[first, last]`, returning the removed
    /// tokens, detached, in order.
    pub fn remove(&self, first: &Token, last: &Token) -> Vec<Token> {
        let start = self.index_of(first);
        let end = self.index_of(last);
        assert!(start <= end, "remove range is reversed");
        let removed = {
            let data = self.inner.borrow();
            data.tokens[start..=end].to_vec()
        };
        self.splice_at(start, end + 1, Vec::new());
        removed
    }

    /// Removes a single token, returning it detached.
    pub fn remove_one(&self, token: &Token) -> Token {
        self.remove(token, token).remove(0)
    }

    /// Replaces a single token with a detached one.
    pub fn replace(&self, old: &Token, new: Token) {
        let index = self.index_of(old);
        self.splice_at(index, index + 1, vec![new]);
    }

    /// Re-derives cached positions after `token`'s raw text changed in
    /// place. Invoked by [`Token::set_raw_text`].
    pub fn update(&self, token: &Token) {
        let index = self.index_of(token);
        self.reposition_from(index);
    }

    /// Binary-searches for the token covering byte `offset`.
    ///
    /// Zero-width placeholders never cover any offset; the search lands on
    /// the printed token whose span contains `offset`.
    pub fn get_by_offset(&self, offset: usize) -> Option<Token> {
        let tokens = self.tokens();
        let idx = tokens.partition_point(|token| {
            token.position().expect("attached token has a position").offset <= offset
        });
        // Everything before `idx` starts at or before `offset`; only the
        // nearest printed token can cover it, so step back just across the
        // zero-width placeholders stacked in front of it.
        let candidate = tokens[..idx]
            .iter()
            .rev()
            .find(|token| !token.raw_text().is_empty())?;
        let start = candidate
            .position()
            .expect("attached token has a position")
            .offset;
        (offset < start + candidate.raw_text().len()).then(|| candidate.clone())
    }

    /// Binary-searches for all tokens starting on the given zero-based line.
    pub fn find_by_line(&self, line: usize) -> Vec<Token> {
        let tokens = self.tokens();
        let start = tokens.partition_point(|token| {
            token.position().expect("attached token has a position").line < line
        });
        let end = tokens.partition_point(|token| {
            token.position().expect("attached token has a position").line <= line
        });
        tokens[start..end].to_vec()
    }

    /// The single splice primitive: replaces `[start, end)` with
    /// `new_tokens` and repositions everything from `start` to the tail.
    pub(crate) fn splice_at(&self, start: usize, end: usize, new_tokens: Vec<Token>) {
        let len = self.len();
        assert!(start <= end && end <= len, "splice range out of bounds");

        let mut seen = HashSet::new();
        for token in &new_tokens {
            assert!(seen.insert(token.id()), "duplicate token in splice input");
            match index_in(token, &self.inner) {
                Some(index) => assert!(
                    index >= start && index < end,
                    "token is already owned by this store outside the spliced range"
                ),
                None => assert!(
                    !token.is_attached(),
                    "token is already owned by another store"
                ),
            }
        }
        trace!(
            start,
            end,
            inserted = new_tokens.len(),
            "splicing token range"
        );

        let kept: HashSet<TokenId> = new_tokens.iter().map(Token::id).collect();
        let removed: Vec<Token> = {
            let data = self.inner.borrow();
            data.tokens[start..end].to_vec()
        };
        for token in &removed {
            if !kept.contains(&token.id()) {
                token.data.borrow_mut().attachment = None;
            }
        }
        self.inner
            .borrow_mut()
            .tokens
            .splice(start..end, new_tokens);
        self.reposition_from(start);
    }

    /// One left-to-right pass re-deriving `(index, position)` for every
    /// token from `start` to the tail.
    fn reposition_from(&self, start: usize) {
        let tokens = self.tokens();
        let mut running = if start == 0 {
            Position::START
        } else {
            let prev = &tokens[start - 1];
            prev.position().expect("attached token has a position")
                + Position::text_delta(&prev.raw_text())
        };
        for (index, token) in tokens.iter().enumerate().skip(start) {
            let delta = Position::text_delta(&token.raw_text());
            token.data.borrow_mut().attachment = Some(Attachment {
                store: Rc::downgrade(&self.inner),
                index,
                position: running,
            });
            running = running + delta;
        }
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("len", &self.len())
            .field("text", &self.text())
            .finish()
    }
}

fn index_in(token: &Token, inner: &Rc<RefCell<StoreData>>) -> Option<usize> {
    let data = token.data.borrow();
    let attachment = data.attachment.as_ref()?;
    let store = attachment.store.upgrade()?;
    Rc::ptr_eq(&store, inner).then_some(attachment.index)
}
