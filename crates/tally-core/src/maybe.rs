//! `Maybe<X>`: an optional child anchored by a placeholder
//!
//! The placeholder exists whether or not the value does, so an absent field
//! still has a stable insertion point and a well-defined (collapsed) span.
//! The floating direction fixes the relative order when the value is
//! present: LEFT puts the placeholder before the value, RIGHT after it, with
//! the field's separators in between.

use tracing::debug;

use crate::field::{FieldSpec, Floating};
use crate::node::{CstNode, Transformer};
use crate::store::TokenStore;
use crate::token::Token;

#[derive(Debug)]
pub struct Maybe<X: CstNode> {
    placeholder: Token,
    floating: Floating,
    inner: Option<X>,
}

impl<X: CstNode> Maybe<X> {
    /// An absent field with a fresh, detached placeholder. Useful as a child
    /// for [`Node::from_children`](crate::tree::Node::from_children).
    pub fn absent(floating: Floating) -> Self {
        Self {
            placeholder: Token::placeholder(),
            floating,
            inner: None,
        }
    }

    /// Wraps a placeholder (and value) whose tokens are already laid out in
    /// a store; used by the parser adapter.
    pub fn from_parsed(placeholder: Token, floating: Floating, inner: Option<X>) -> Self {
        assert!(placeholder.is_placeholder(), "anchor must be a placeholder");
        Self {
            placeholder,
            floating,
            inner,
        }
    }

    pub fn placeholder(&self) -> &Token {
        &self.placeholder
    }

    pub fn floating(&self) -> Floating {
        self.floating
    }

    pub fn is_present(&self) -> bool {
        self.inner.is_some()
    }

    pub fn inner(&self) -> Option<&X> {
        self.inner.as_ref()
    }

    pub fn inner_mut(&mut self) -> Option<&mut X> {
        self.inner.as_mut()
    }

    pub(crate) fn set_parsed_inner(&mut self, inner: Option<X>) {
        self.inner = inner;
    }

    fn store(&self) -> TokenStore {
        self.placeholder
            .store()
            .expect("optional field is not attached to a store")
    }

    /// Absent → Present with the field's default separators.
    pub fn create(&mut self, field: &FieldSpec, value: X) {
        self.create_with(field.make_separators(), value);
    }

    /// Absent → Present with explicit separators; the override hook for call
    /// sites that need non-default formatting.
    pub fn create_with(&mut self, separators: Vec<Token>, value: X) {
        assert!(self.inner.is_none(), "optional field is already present");
        let store = self.store();
        let value_tokens = value.take_tokens();
        debug!(
            floating = ?self.floating,
            tokens = value_tokens.len(),
            "creating optional value"
        );
        match self.floating {
            Floating::Left => {
                let mut tokens = separators;
                tokens.extend(value_tokens);
                store.insert_after(&self.placeholder, tokens);
            }
            Floating::Right => {
                let mut tokens = value_tokens;
                tokens.extend(separators);
                store.insert_before(&self.placeholder, tokens);
            }
        }
        self.inner = Some(value);
    }

    /// Present → Absent: removes the value together with its separators,
    /// leaving only the placeholder.
    pub fn remove(&mut self) {
        let inner = self.inner.take().expect("optional field is already absent");
        let store = self.store();
        match self.floating {
            Floating::Left => {
                let first = store
                    .get_next(&self.placeholder)
                    .expect("present value follows its placeholder");
                store.remove(&first, &inner.last_token());
            }
            Floating::Right => {
                let last = store
                    .get_prev(&self.placeholder)
                    .expect("present value precedes its placeholder");
                store.remove(&inner.first_token(), &last);
            }
        }
    }

    /// Present → Present: splices only the inner span, reusing the existing
    /// separators.
    pub fn replace(&mut self, value: X) {
        let old = self.inner.as_ref().expect("optional field is absent");
        let store = self.store();
        let first = old.first_token();
        let last = old.last_token();
        store.splice(value.take_tokens(), &first, &last);
        self.inner = Some(value);
    }

    /// Dispatches all four state transitions: `set(None)` on an absent field
    /// is a no-op, `set(Some)` creates or replaces, `set(None)` on a present
    /// field removes.
    pub fn set(&mut self, field: &FieldSpec, value: Option<X>) {
        match (self.inner.is_some(), value) {
            (false, None) => {}
            (false, Some(value)) => self.create(field, value),
            (true, None) => self.remove(),
            (true, Some(value)) => self.replace(value),
        }
    }
}

impl<X: CstNode> CstNode for Maybe<X> {
    fn first_token(&self) -> Token {
        match (self.floating, &self.inner) {
            (Floating::Right, Some(inner)) => inner.first_token(),
            _ => self.placeholder.clone(),
        }
    }

    fn last_token(&self) -> Token {
        match (self.floating, &self.inner) {
            (Floating::Left, Some(inner)) => inner.last_token(),
            _ => self.placeholder.clone(),
        }
    }

    fn clone_with(&self, transformer: &Transformer) -> Self {
        Self {
            placeholder: transformer.apply(&self.placeholder),
            floating: self.floating,
            inner: self.inner.as_ref().map(|inner| inner.clone_with(transformer)),
        }
    }

    fn take_tokens(&self) -> Vec<Token> {
        if self.token_store().is_some() {
            return self.detach();
        }
        assert!(
            self.inner.is_none(),
            "a detached optional field must be absent; build present values through a store"
        );
        vec![self.placeholder.clone()]
    }
}

impl<X: CstNode + PartialEq> PartialEq for Maybe<X> {
    fn eq(&self, other: &Self) -> bool {
        self.floating == other.floating && self.inner == other.inner
    }
}
