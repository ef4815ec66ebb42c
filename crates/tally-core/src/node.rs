//! Node abstractions: span contract, deep copy, detach/reattach
//!
//! Everything that lives in a tree (a single token, a composite node, a
//! [`Maybe`](crate::maybe::Maybe), a [`Repeated`](crate::repeated::Repeated))
//! implements [`CstNode`]: it can name the first and last token of its
//! exact, contiguous span, and it can rebuild itself through a
//! [`Transformer`] that maps token identities during a deep copy.
//!
//! Ownership transfer follows one protocol: a subtree is only ever grafted
//! from a store it spans *entirely* (so partial moves go through field-level
//! edits or explicit copies), and after its tokens are spliced into the
//! destination the structure is re-pointed via `reattach`.

use std::collections::HashMap;

use crate::store::TokenStore;
use crate::token::{BlockComment, Token, TokenId};

/// Maps each original token to its counterpart in a destination store,
/// keyed by stable [`TokenId`] rather than object identity.
#[derive(Debug, Default)]
pub struct Transformer {
    map: HashMap<TokenId, Token>,
}

impl Transformer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, old: &Token, new: Token) {
        self.map.insert(old.id(), new);
    }

    /// The mapped counterpart, or the token itself when unmapped (which
    /// supports structural sharing during partial copies).
    pub fn apply(&self, token: &Token) -> Token {
        self.map.get(&token.id()).cloned().unwrap_or_else(|| token.clone())
    }
}

/// The span and copy contract shared by every tree participant.
pub trait CstNode: Sized {
    /// The first token of the node's exact span within its store.
    fn first_token(&self) -> Token;

    /// The last token of the node's exact span within its store.
    fn last_token(&self) -> Token;

    /// Rebuilds the node with every held token mapped through `transformer`.
    fn clone_with(&self, transformer: &Transformer) -> Self;

    /// The store owning this node's tokens, if attached.
    fn token_store(&self) -> Option<TokenStore> {
        self.first_token().store()
    }

    /// Snapshot of the node's span, in store order, including interleaved
    /// ignored tokens.
    ///
    /// # Panics
    ///
    /// Panics when the node is detached.
    fn tokens(&self) -> Vec<Token> {
        let store = self
            .token_store()
            .expect("node is not attached to a store");
        let first = store.index_of(&self.first_token());
        let last = store.index_of(&self.last_token());
        assert!(first <= last, "node span is reversed");
        (first..=last)
            .map(|index| store.get(index).expect("span index in bounds"))
            .collect()
    }

    /// Prints the node: raw text of its span, concatenated.
    fn text(&self) -> String {
        self.tokens().iter().map(Token::raw_text).collect()
    }

    /// Deep-copies the node into a fresh store holding copies of exactly its
    /// span. The returned node shares no token identities with the original.
    fn deep_clone(&self) -> (Self, TokenStore) {
        let span = self.tokens();
        let mut transformer = Transformer::new();
        let copies = span
            .iter()
            .map(|token| {
                let copy = token.copy();
                transformer.insert(token, copy.clone());
                copy
            })
            .collect();
        let store = TokenStore::from_tokens(copies);
        (self.clone_with(&transformer), store)
    }

    /// Removes the node's tokens from their store, returning them detached
    /// and in order, ready to be spliced elsewhere.
    ///
    /// # Panics
    ///
    /// Panics unless the node's span is its *entire* current store; moving a
    /// fragment of a store goes through field-level edits or a deep copy.
    fn detach(&self) -> Vec<Token> {
        let store = self
            .token_store()
            .expect("cannot detach a node that is not attached to a store");
        let first = self.first_token();
        let last = self.last_token();
        assert!(
            store.index_of(&first) == 0 && store.index_of(&last) == store.len() - 1,
            "detach requires the node to span its entire store"
        );
        store.remove(&first, &last)
    }

    /// Re-homes the node's structure after its tokens were copied into
    /// another store, remapping every held token through `transformer`.
    fn reattach(&mut self, transformer: &Transformer) {
        *self = self.clone_with(transformer);
    }

    /// Takes the node's tokens for grafting into another store: detaches a
    /// standalone node, or yields an already-detached leaf as-is.
    fn take_tokens(&self) -> Vec<Token> {
        self.detach()
    }
}

impl CstNode for Token {
    fn first_token(&self) -> Token {
        self.clone()
    }

    fn last_token(&self) -> Token {
        self.clone()
    }

    fn clone_with(&self, transformer: &Transformer) -> Self {
        transformer.apply(self)
    }

    fn take_tokens(&self) -> Vec<Token> {
        if self.is_attached() {
            self.detach()
        } else {
            vec![self.clone()]
        }
    }
}

impl CstNode for BlockComment {
    fn first_token(&self) -> Token {
        self.token().clone()
    }

    fn last_token(&self) -> Token {
        self.token().clone()
    }

    fn clone_with(&self, transformer: &Transformer) -> Self {
        BlockComment::from_token(transformer.apply(self.token()))
            .expect("transformer preserves token kinds")
    }

    fn take_tokens(&self) -> Vec<Token> {
        self.token().take_tokens()
    }
}
