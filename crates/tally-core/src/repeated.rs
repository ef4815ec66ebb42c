//! `Repeated<X>`: a placeholder-anchored list of children
//!
//! The placeholder always precedes the first item, or stands alone when the
//! list is empty, so an empty field still has a span and a stable insertion
//! point. Item order always matches store order; every list operation is a
//! bounded splice against neighboring items (or the placeholder at index 0).
//!
//! Gap ownership: the tokens between the end of item *i-1* (or the
//! placeholder) and the start of item *i* are item *i*'s separators. Each
//! insertion materializes the field's separator templates afresh; separator
//! tokens are never shared across positions.

use tracing::debug;

use crate::error::TallyError;
use crate::field::FieldSpec;
use crate::node::{CstNode, Transformer};
use crate::slice::{SliceSpec, resolve_index};
use crate::store::TokenStore;
use crate::token::Token;

#[derive(Debug)]
pub struct Repeated<X: CstNode> {
    placeholder: Token,
    items: Vec<X>,
}

impl<X: CstNode> Repeated<X> {
    /// An empty list with a fresh, detached placeholder.
    pub fn empty() -> Self {
        Self {
            placeholder: Token::placeholder(),
            items: Vec::new(),
        }
    }

    /// Wraps a placeholder and items whose tokens are already laid out in a
    /// store; used by the parser adapter.
    pub fn from_parsed(placeholder: Token, items: Vec<X>) -> Self {
        assert!(placeholder.is_placeholder(), "anchor must be a placeholder");
        Self { placeholder, items }
    }

    pub fn placeholder(&self) -> &Token {
        &self.placeholder
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&X> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut X> {
        self.items.get_mut(index)
    }

    /// Python-style integer access: negative indices count from the end.
    ///
    /// # Panics
    ///
    /// Panics on an out-of-range index.
    pub fn get_at(&self, index: isize) -> &X {
        &self.items[resolve_index(index, self.items.len())]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, X> {
        self.items.iter()
    }

    pub fn items(&self) -> &[X] {
        &self.items
    }

    pub(crate) fn items_mut(&mut self) -> &mut Vec<X> {
        &mut self.items
    }

    fn store(&self) -> TokenStore {
        self.placeholder
            .store()
            .expect("repeated field is not attached to a store")
    }

    /// The token right before the gap owned by index `index`: the previous
    /// item's last token, or the placeholder.
    fn anchor_before(&self, index: usize) -> Token {
        if index == 0 {
            self.placeholder.clone()
        } else {
            self.items[index - 1].last_token()
        }
    }

    /// Inserts `value` at `index`, materializing fresh separators.
    ///
    /// Inserting at index 0 ahead of an existing first item splices the new
    /// item *after* the existing leading gap, so before-first separators
    /// already in the text are inherited and no existing token moves.
    pub fn insert(&mut self, field: &FieldSpec, index: usize, value: X) {
        assert!(index <= self.items.len(), "index out of range");
        let store = self.store();
        let value_tokens = value.take_tokens();
        debug!(index, tokens = value_tokens.len(), "inserting repeated item");
        if index == 0 && !self.items.is_empty() {
            let mut tokens = value_tokens;
            tokens.extend(field.make_separators());
            store.insert_before(&self.items[0].first_token(), tokens);
        } else {
            let mut tokens = if index == 0 {
                field.make_separators_before_first()
            } else {
                field.make_separators()
            };
            tokens.extend(value_tokens);
            store.insert_after(&self.anchor_before(index), tokens);
        }
        self.items.insert(index, value);
    }

    pub fn append(&mut self, field: &FieldSpec, value: X) {
        self.insert(field, self.items.len(), value);
    }

    pub fn extend(&mut self, field: &FieldSpec, values: impl IntoIterator<Item = X>) {
        for value in values {
            self.append(field, value);
        }
    }

    /// Replaces the item at `index`, splicing only its span and keeping the
    /// surrounding separators.
    pub fn set(&mut self, index: usize, value: X) {
        assert!(index < self.items.len(), "index out of range");
        let store = self.store();
        let first = self.items[index].first_token();
        let last = self.items[index].last_token();
        store.splice(value.take_tokens(), &first, &last);
        self.items[index] = value;
    }

    /// Removes the tokens of item `index` plus the gap that travels with it,
    /// returning the item's tokens detached. Removing the first item ahead
    /// of a successor removes the *following* gap, so the successor inherits
    /// the leading separators.
    fn remove_item_tokens(&mut self, index: usize) -> Vec<Token> {
        assert!(index < self.items.len(), "index out of range");
        let store = self.store();
        let first = self.items[index].first_token();
        let last = self.items[index].last_token();
        let gap = if index == 0 && self.items.len() > 1 {
            gap_between(&store, &last, &self.items[1].first_token())
        } else {
            gap_between(&store, &self.anchor_before(index), &first)
        };
        if let Some((gap_first, gap_last)) = gap {
            store.remove(&gap_first, &gap_last);
        }
        store.remove(&first, &last)
    }

    /// Deletes the item at `index`; its tokens are discarded.
    pub fn remove(&mut self, index: usize) {
        self.remove_item_tokens(index);
        self.items.remove(index);
    }

    /// Removes and returns the item at `index`, detached into its own
    /// standalone store so it remains independently usable and movable.
    pub fn pop(&mut self, index: usize) -> (X, TokenStore) {
        let tokens = self.remove_item_tokens(index);
        let item = self.items.remove(index);
        (item, TokenStore::from_tokens(tokens))
    }

    /// Removes and returns the last item.
    pub fn pop_last(&mut self) -> (X, TokenStore) {
        assert!(!self.items.is_empty(), "pop from empty repeated field");
        self.pop(self.items.len() - 1)
    }

    /// Deletes every item and gap, collapsing the span to the placeholder.
    pub fn clear(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let store = self.store();
        let first = store
            .get_next(&self.placeholder)
            .expect("items follow the placeholder");
        let last = self.items.last().expect("non-empty").last_token();
        store.remove(&first, &last);
        self.items.clear();
    }

    /// Removes the items at `indices` (in descending index order, so
    /// earlier boundaries stay valid), ignoring duplicates.
    pub fn drop_many(&mut self, indices: &[usize]) {
        let mut sorted = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        for &index in sorted.iter().rev() {
            self.remove(index);
        }
    }

    /// The items selected by `slice`, in iteration order.
    pub fn get_slice(&self, slice: SliceSpec) -> Vec<&X> {
        slice
            .indices(self.items.len())
            .into_iter()
            .map(|index| &self.items[index])
            .collect()
    }

    /// Slice assignment with Python semantics: a contiguous slice accepts
    /// any replacement length; a non-unit-step slice requires an exact
    /// length match and fails before mutating anything.
    pub fn set_slice(
        &mut self,
        field: &FieldSpec,
        slice: SliceSpec,
        values: Vec<X>,
    ) -> Result<(), TallyError> {
        let selected = slice.indices(self.items.len());
        if slice.is_contiguous() {
            let at = selected
                .first()
                .copied()
                .unwrap_or_else(|| slice.insertion_point(self.items.len()));
            for &index in selected.iter().rev() {
                self.remove(index);
            }
            for (offset, value) in values.into_iter().enumerate() {
                self.insert(field, at + offset, value);
            }
        } else {
            if selected.len() != values.len() {
                return Err(TallyError::SliceLengthMismatch {
                    expected: selected.len(),
                    actual: values.len(),
                });
            }
            for (index, value) in selected.into_iter().zip(values) {
                self.set(index, value);
            }
        }
        Ok(())
    }

    /// Slice deletion with Python semantics.
    pub fn delete_slice(&mut self, slice: SliceSpec) {
        self.drop_many(&slice.indices(self.items.len()));
    }
}

impl<X: CstNode> CstNode for Repeated<X> {
    fn first_token(&self) -> Token {
        self.placeholder.clone()
    }

    fn last_token(&self) -> Token {
        self.items
            .last()
            .map_or_else(|| self.placeholder.clone(), CstNode::last_token)
    }

    fn clone_with(&self, transformer: &Transformer) -> Self {
        Self {
            placeholder: transformer.apply(&self.placeholder),
            items: self
                .items
                .iter()
                .map(|item| item.clone_with(transformer))
                .collect(),
        }
    }

    fn take_tokens(&self) -> Vec<Token> {
        if self.token_store().is_some() {
            return self.detach();
        }
        assert!(
            self.items.is_empty(),
            "a detached repeated field must be empty; build items through a store"
        );
        vec![self.placeholder.clone()]
    }
}

impl<X: CstNode + PartialEq> PartialEq for Repeated<X> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<X: CstNode> std::ops::Index<usize> for Repeated<X> {
    type Output = X;

    fn index(&self, index: usize) -> &X {
        &self.items[index]
    }
}

impl<'a, X: CstNode> IntoIterator for &'a Repeated<X> {
    type Item = &'a X;
    type IntoIter = std::slice::Iter<'a, X>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

fn gap_between(store: &TokenStore, left: &Token, right: &Token) -> Option<(Token, Token)> {
    let first = store.get_next(left)?;
    if first.same(right) {
        return None;
    }
    let last = store.get_prev(right)?;
    Some((first, last))
}
