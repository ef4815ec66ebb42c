//! Comment ownership: claiming free comments as node adornments
//!
//! A parsed comment starts out as free trivia in the store. A node with a
//! dedicated `Maybe<BlockComment>` slot can *claim* an adjacent one, either
//! leading (the line above) or trailing (the line below). A claim marks the
//! comment token `claimed`, records it in the slot, and when anchor
//! placeholders sat in between, physically relocates the newline+comment
//! pair flush against the node. A repeated field can claim the comments
//! interleaved between its items as pseudo-items, so they travel with the
//! list through edits.
//!
//! Claiming an already-owned comment from a different context fails with
//! [`TallyError::AlreadyClaimed`]; re-claiming from the same context is
//! idempotent. Unclaiming clears the flag and the structural slot but leaves
//! the tokens in place, turning the comment back into free trivia.

use tracing::debug;

use crate::error::TallyError;
use crate::field::Floating;
use crate::maybe::Maybe;
use crate::node::CstNode;
use crate::repeated::Repeated;
use crate::store::TokenStore;
use crate::token::{BlockComment, Token, TokenKind};
use crate::tree::Element;

/// An item type that can also carry a claimed comment as a pseudo-item.
pub trait CommentHolder: CstNode {
    fn from_comment(comment: BlockComment) -> Self;

    /// The held comment, when this item is a comment pseudo-item.
    fn as_block_comment(&self) -> Option<BlockComment>;
}

impl CommentHolder for BlockComment {
    fn from_comment(comment: BlockComment) -> Self {
        comment
    }

    fn as_block_comment(&self) -> Option<BlockComment> {
        Some(self.clone())
    }
}

impl CommentHolder for Token {
    fn from_comment(comment: BlockComment) -> Self {
        comment.into_token()
    }

    fn as_block_comment(&self) -> Option<BlockComment> {
        BlockComment::from_token(self.clone())
    }
}

impl CommentHolder for Element {
    fn from_comment(comment: BlockComment) -> Self {
        Element::Comment(comment)
    }

    fn as_block_comment(&self) -> Option<BlockComment> {
        self.as_comment().cloned()
    }
}

/// The newline+comment pattern found next to a slot's placeholder, plus the
/// anchor placeholders that were skipped on the way.
struct AdjacentComment {
    skipped: Vec<Token>,
    newline: Token,
    comment: Token,
}

fn scan(store: &TokenStore, from: &Token, forward: bool) -> Option<AdjacentComment> {
    let step = |token: &Token| {
        if forward {
            store.get_next(token)
        } else {
            store.get_prev(token)
        }
    };
    let mut skipped = Vec::new();
    let mut cursor = step(from)?;
    while cursor.is_placeholder() {
        skipped.push(cursor.clone());
        cursor = step(&cursor)?;
    }
    if !cursor.is_newline() {
        return None;
    }
    let newline = cursor;
    let mut cursor = step(&newline)?;
    while cursor.is_placeholder() {
        skipped.push(cursor.clone());
        cursor = step(&cursor)?;
    }
    cursor.is_comment().then_some(AdjacentComment {
        skipped,
        newline,
        comment: cursor,
    })
}

impl<X: CommentHolder> Maybe<X> {
    /// Claims the comment on the line *below* the owning node: the tokens
    /// after this slot's placeholder must be exactly one newline then one
    /// comment, skipping over anchor placeholders.
    ///
    /// Claiming twice from the same slot is idempotent and returns the same
    /// comment.
    pub fn claim_trailing(&mut self) -> Result<BlockComment, TallyError> {
        assert_eq!(
            self.floating(),
            Floating::Left,
            "a trailing-comment slot floats left"
        );
        if let Some(owned) = self.inner() {
            let owned = owned
                .as_block_comment()
                .expect("comment slot holds a non-comment value");
            return Ok(owned);
        }
        let store = self
            .placeholder()
            .store()
            .expect("comment slot is not attached to a store");
        let found = scan(&store, self.placeholder(), true)
            .ok_or_else(|| TallyError::no_adjacent_comment("after"))?;
        self.claim_found(&store, found, true)
    }

    /// Claims the comment on the line *above* the owning node.
    pub fn claim_leading(&mut self) -> Result<BlockComment, TallyError> {
        assert_eq!(
            self.floating(),
            Floating::Right,
            "a leading-comment slot floats right"
        );
        if let Some(owned) = self.inner() {
            let owned = owned
                .as_block_comment()
                .expect("comment slot holds a non-comment value");
            return Ok(owned);
        }
        let store = self
            .placeholder()
            .store()
            .expect("comment slot is not attached to a store");
        let found = scan(&store, self.placeholder(), false)
            .ok_or_else(|| TallyError::no_adjacent_comment("before"))?;
        self.claim_found(&store, found, false)
    }

    fn claim_found(
        &mut self,
        store: &TokenStore,
        found: AdjacentComment,
        forward: bool,
    ) -> Result<BlockComment, TallyError> {
        let block = BlockComment::from_token(found.comment.clone())
            .expect("scan only yields comment tokens");
        if found.comment.is_claimed() {
            return Err(TallyError::already_claimed(block.value()));
        }
        if !found.skipped.is_empty() {
            // Move the newline+comment pair flush against the placeholder,
            // pushing the skipped anchors to the far side. Skipped anchors
            // may sit before the newline, between it and the comment, or
            // both, so the spliced range runs from whichever involved token
            // comes first in the store to whichever comes last.
            let mut reordered: Vec<Token> = Vec::with_capacity(found.skipped.len() + 2);
            let nearest = &found.skipped[0];
            let (first, last) = if forward {
                reordered.push(found.newline.clone());
                reordered.push(found.comment.clone());
                reordered.extend(found.skipped.iter().cloned());
                let first = if store.index_of(nearest) < store.index_of(&found.newline) {
                    nearest.clone()
                } else {
                    found.newline.clone()
                };
                (first, found.comment.clone())
            } else {
                reordered.extend(found.skipped.iter().rev().cloned());
                reordered.push(found.comment.clone());
                reordered.push(found.newline.clone());
                let last = if store.index_of(nearest) > store.index_of(&found.newline) {
                    nearest.clone()
                } else {
                    found.newline.clone()
                };
                (found.comment.clone(), last)
            };
            debug!(skipped = found.skipped.len(), "relocating claimed comment");
            store.splice(reordered, &first, &last);
        }
        found.comment.set_claimed(true);
        self.set_parsed_inner(Some(X::from_comment(block.clone())));
        Ok(block)
    }

    /// Best-effort variant of [`claim_trailing`](Self::claim_trailing):
    /// returns `None` instead of failing.
    pub fn try_claim_trailing(&mut self) -> Option<BlockComment> {
        self.claim_trailing().ok()
    }

    /// Best-effort variant of [`claim_leading`](Self::claim_leading).
    pub fn try_claim_leading(&mut self) -> Option<BlockComment> {
        self.claim_leading().ok()
    }

    /// Releases the held comment: clears its `claimed` flag and empties the
    /// slot, leaving the tokens physically in place as free trivia.
    pub fn unclaim(&mut self) -> Option<BlockComment> {
        let owned = self.inner().and_then(X::as_block_comment)?;
        owned.token().set_claimed(false);
        self.set_parsed_inner(None);
        Some(owned)
    }
}

fn is_gap_trivia(token: &Token) -> bool {
    matches!(
        token.kind(),
        TokenKind::Placeholder | TokenKind::Newline | TokenKind::Whitespace | TokenKind::Comment
    )
}

impl<X: CommentHolder> Repeated<X> {
    /// Collects `(item index to insert at, comment token)` for every
    /// unclaimed comment in the list's gaps, in textual order. The gap after
    /// the last item extends through the trailing run of trivia.
    fn gap_comments(&self, store: &TokenStore) -> Vec<(usize, Token)> {
        let mut found = Vec::new();
        for gap in 0..=self.len() {
            let start = if gap == 0 {
                self.placeholder().clone()
            } else {
                self.items()[gap - 1].last_token()
            };
            let end = self.get(gap).map(CstNode::first_token);
            let mut cursor = store.get_next(&start);
            while let Some(token) = cursor {
                match &end {
                    Some(end) if token.same(end) => break,
                    None if !is_gap_trivia(&token) => break,
                    _ => {}
                }
                if token.is_comment() && !token.is_claimed() {
                    found.push((gap, token.clone()));
                }
                cursor = store.get_next(&token);
            }
        }
        found
    }

    /// Claims the comments sitting between (and around) this list's items as
    /// pseudo-items at their natural positions. With an explicit list, every
    /// named comment must be found in a gap or the whole call fails before
    /// mutating; without one, every available comment is taken.
    pub fn claim_interleaved(
        &mut self,
        explicit: Option<&[BlockComment]>,
    ) -> Result<Vec<BlockComment>, TallyError> {
        let Some(store) = self.first_token().store() else {
            return Ok(Vec::new());
        };
        let candidates = self.gap_comments(&store);
        let selected = match explicit {
            None => candidates,
            Some(list) => {
                let mut selected = Vec::new();
                for wanted in list {
                    // Idempotent when the comment is already one of our
                    // pseudo-items.
                    if self
                        .iter()
                        .filter_map(CommentHolder::as_block_comment)
                        .any(|owned| owned.token().same(wanted.token()))
                    {
                        continue;
                    }
                    if wanted.is_claimed() {
                        return Err(TallyError::already_claimed(wanted.value()));
                    }
                    let found = candidates
                        .iter()
                        .find(|(_, token)| token.same(wanted.token()))
                        .cloned()
                        .ok_or_else(|| TallyError::comment_not_found(wanted.value()))?;
                    selected.push(found);
                }
                selected.sort_by_key(|(gap, token)| (*gap, store.index_of(token)));
                selected
            }
        };
        let mut claimed = Vec::with_capacity(selected.len());
        for (offset, (gap, token)) in selected.into_iter().enumerate() {
            token.set_claimed(true);
            let block = BlockComment::from_token(token).expect("gap scan only yields comments");
            self.items_mut()
                .insert(gap + offset, X::from_comment(block.clone()));
            claimed.push(block);
        }
        debug!(count = claimed.len(), "claimed interleaved comments");
        Ok(claimed)
    }

    /// Releases comment pseudo-items back into their gaps: clears each flag
    /// and drops the item, leaving the tokens physically in place. With an
    /// explicit list, every named comment must currently be a pseudo-item or
    /// the whole call fails before mutating.
    pub fn unclaim_interleaved(
        &mut self,
        explicit: Option<&[BlockComment]>,
    ) -> Result<Vec<BlockComment>, TallyError> {
        let pseudo: Vec<(usize, BlockComment)> = self
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                item.as_block_comment().map(|comment| (index, comment))
            })
            .collect();
        let mut selected = match explicit {
            None => pseudo,
            Some(list) => {
                let mut selected = Vec::new();
                for wanted in list {
                    let found = pseudo
                        .iter()
                        .find(|(_, owned)| owned.token().same(wanted.token()))
                        .cloned()
                        .ok_or_else(|| TallyError::comment_not_found(wanted.value()))?;
                    selected.push(found);
                }
                selected.sort_by_key(|(index, _)| *index);
                selected
            }
        };
        for (index, comment) in selected.iter().rev() {
            comment.token().set_claimed(false);
            self.items_mut().remove(*index);
        }
        Ok(selected.drain(..).map(|(_, comment)| comment).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TokenStore;

    fn comment(text: &str) -> Token {
        Token::new(TokenKind::Comment, text)
    }

    fn trailing_slot() -> (TokenStore, Maybe<BlockComment>) {
        let placeholder = Token::placeholder();
        let store = TokenStore::from_tokens(vec![
            Token::term("ACCOUNT", "Assets:Foo"),
            placeholder.clone(),
            Token::newline(),
            comment("; note"),
        ]);
        (store, Maybe::from_parsed(placeholder, Floating::Left, None))
    }

    #[test]
    fn trailing_claim_marks_and_stores_the_comment() {
        let (store, mut slot) = trailing_slot();
        let claimed = slot.claim_trailing().unwrap();
        assert_eq!(claimed.value(), "note");
        assert!(claimed.is_claimed());
        assert!(slot.is_present());
        assert_eq!(store.text(), "Assets:Foo\n; note");
    }

    #[test]
    fn re_claim_is_idempotent() {
        let (store, mut slot) = trailing_slot();
        let first = slot.claim_trailing().unwrap();
        let before = store.text();
        let second = slot.claim_trailing().unwrap();
        assert!(first.token().same(second.token()));
        assert_eq!(store.text(), before);
    }

    #[test]
    fn claim_relocates_past_skipped_placeholders() {
        let placeholder = Token::placeholder();
        let other_anchor = Token::placeholder();
        let store = TokenStore::from_tokens(vec![
            Token::term("ACCOUNT", "Assets:Foo"),
            placeholder.clone(),
            other_anchor.clone(),
            Token::newline(),
            comment("; note"),
        ]);
        let mut slot: Maybe<BlockComment> =
            Maybe::from_parsed(placeholder.clone(), Floating::Left, None);
        slot.claim_trailing().unwrap();
        assert_eq!(store.text(), "Assets:Foo\n; note");
        // The newline now directly follows the slot's placeholder, and the
        // skipped anchor moved past the comment.
        assert!(store.get_next(&placeholder).unwrap().is_newline());
        assert!(store.get(4).unwrap().same(&other_anchor));
    }

    #[test]
    fn claim_relocates_past_an_anchor_between_newline_and_comment() {
        let placeholder = Token::placeholder();
        let other_anchor = Token::placeholder();
        let store = TokenStore::from_tokens(vec![
            Token::term("ACCOUNT", "Assets:Foo"),
            placeholder.clone(),
            Token::newline(),
            other_anchor.clone(),
            comment("; note"),
        ]);
        let mut slot: Maybe<BlockComment> =
            Maybe::from_parsed(placeholder.clone(), Floating::Left, None);
        let claimed = slot.claim_trailing().unwrap();
        assert_eq!(claimed.value(), "note");
        assert_eq!(store.text(), "Assets:Foo\n; note");
        assert!(store.get_next(&placeholder).unwrap().is_newline());
        assert!(store.get(4).unwrap().same(&other_anchor));
    }

    #[test]
    fn leading_claim_relocates_past_an_anchor_between_comment_and_newline() {
        let placeholder = Token::placeholder();
        let other_anchor = Token::placeholder();
        let store = TokenStore::from_tokens(vec![
            comment("; intro"),
            other_anchor.clone(),
            Token::newline(),
            placeholder.clone(),
            Token::term("DATE", "2000-01-01"),
        ]);
        let mut slot: Maybe<BlockComment> =
            Maybe::from_parsed(placeholder.clone(), Floating::Right, None);
        let claimed = slot.claim_leading().unwrap();
        assert_eq!(claimed.value(), "intro");
        assert_eq!(store.text(), "; intro\n2000-01-01");
        assert!(store.get_prev(&placeholder).unwrap().is_newline());
        assert!(store.first().unwrap().same(&other_anchor));
    }

    #[test]
    fn claim_fails_without_the_exact_pattern() {
        let placeholder = Token::placeholder();
        let _store = TokenStore::from_tokens(vec![
            Token::term("ACCOUNT", "Assets:Foo"),
            placeholder.clone(),
            Token::newline(),
            Token::newline(),
            comment("; too far"),
        ]);
        let mut slot: Maybe<BlockComment> = Maybe::from_parsed(placeholder, Floating::Left, None);
        assert!(matches!(
            slot.claim_trailing(),
            Err(TallyError::NoAdjacentComment { side: "after" })
        ));
        assert!(slot.try_claim_trailing().is_none());
        assert!(!slot.is_present());
    }

    #[test]
    fn double_claim_by_different_slots_fails() {
        let (store, mut slot) = trailing_slot();
        slot.claim_trailing().unwrap();
        let rival_anchor = Token::placeholder();
        store.insert_before(
            &store.get(2).expect("newline"),
            vec![rival_anchor.clone()],
        );
        let mut rival: Maybe<BlockComment> = Maybe::from_parsed(rival_anchor, Floating::Left, None);
        assert!(matches!(
            rival.claim_trailing(),
            Err(TallyError::AlreadyClaimed { .. })
        ));
    }

    #[test]
    fn leading_claim_scans_backward() {
        let placeholder = Token::placeholder();
        let store = TokenStore::from_tokens(vec![
            comment("; intro"),
            Token::newline(),
            placeholder.clone(),
            Token::term("DATE", "2000-01-01"),
        ]);
        let mut slot: Maybe<BlockComment> = Maybe::from_parsed(placeholder, Floating::Right, None);
        let claimed = slot.claim_leading().unwrap();
        assert_eq!(claimed.value(), "intro");
        assert_eq!(store.text(), "; intro\n2000-01-01");
    }

    #[test]
    fn unclaim_leaves_tokens_in_place() {
        let (store, mut slot) = trailing_slot();
        let claimed = slot.claim_trailing().unwrap();
        let released = slot.unclaim().unwrap();
        assert!(released.token().same(claimed.token()));
        assert!(!released.is_claimed());
        assert!(!slot.is_present());
        assert_eq!(store.text(), "Assets:Foo\n; note");
        // Free again: the same slot can re-claim it.
        assert!(slot.claim_trailing().is_ok());
    }

    fn interleaved() -> (TokenStore, Repeated<Token>, Token, Token) {
        let placeholder = Token::placeholder();
        let (a, b) = (Token::term("ITEM", "A"), Token::term("ITEM", "B"));
        let (c1, c2) = (comment("; one"), comment("; two"));
        let store = TokenStore::from_tokens(vec![
            placeholder.clone(),
            a.clone(),
            Token::newline(),
            c1.clone(),
            Token::newline(),
            b.clone(),
            Token::newline(),
            c2.clone(),
        ]);
        (
            store,
            Repeated::from_parsed(placeholder, vec![a, b]),
            c1,
            c2,
        )
    }

    #[test]
    fn interleaved_claim_takes_everything_available() {
        let (store, mut repeated, c1, c2) = interleaved();
        let before = store.text();
        let claimed = repeated.claim_interleaved(None).unwrap();
        assert_eq!(claimed.len(), 2);
        assert_eq!(repeated.len(), 4);
        assert!(repeated.get(1).unwrap().same(&c1));
        assert!(repeated.get(3).unwrap().same(&c2));
        assert!(c1.is_claimed() && c2.is_claimed());
        assert_eq!(store.text(), before);
    }

    #[test]
    fn explicit_claim_is_all_or_nothing() {
        let (_store, mut repeated, _c1, _c2) = interleaved();
        let stranger = BlockComment::from_value("", "elsewhere");
        let wanted = vec![stranger];
        assert!(matches!(
            repeated.claim_interleaved(Some(&wanted)),
            Err(TallyError::CommentNotFound { .. })
        ));
        assert_eq!(repeated.len(), 2);
    }

    #[test]
    fn explicit_claim_takes_only_the_named_comment() {
        let (_store, mut repeated, c1, c2) = interleaved();
        let wanted = vec![BlockComment::from_token(c2.clone()).unwrap()];
        let claimed = repeated.claim_interleaved(Some(&wanted)).unwrap();
        assert_eq!(claimed.len(), 1);
        assert_eq!(repeated.len(), 3);
        assert!(!c1.is_claimed());
        assert!(c2.is_claimed());
    }

    #[test]
    fn unclaim_interleaved_restores_the_plain_list() {
        let (store, mut repeated, c1, c2) = interleaved();
        repeated.claim_interleaved(None).unwrap();
        let released = repeated.unclaim_interleaved(None).unwrap();
        assert_eq!(released.len(), 2);
        assert_eq!(repeated.len(), 2);
        assert!(!c1.is_claimed() && !c2.is_claimed());
        assert_eq!(store.text(), "A\n; one\nB\n; two");
        // And they are claimable again.
        assert_eq!(repeated.claim_interleaved(None).unwrap().len(), 2);
    }
}
