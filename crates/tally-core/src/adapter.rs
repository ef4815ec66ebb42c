//! Parser adapter: from tokenizer/parser output to an attached tree
//!
//! The external tokenizer yields every token of the source in order, split
//! into two channels: *significant* tokens that reach the grammar, and
//! *ignored* trivia (inline whitespace, newlines, free comments) that never
//! does. The parse tree references significant tokens by stream index. This
//! adapter walks both in one bottom-up pass, appending every token into a
//! fresh store in original order and synthesizing one placeholder per
//! optional or repeated grammar position.
//!
//! Placeholder emission order is the delicate part: ignored and significant
//! tokens interleave arbitrarily, yet a placeholder must land
//! deterministically relative to any run of trivia for later edits to be
//! well-defined. Left-floating placeholders are appended immediately, before
//! any pending trivia is flushed. Right-floating placeholders are buffered
//! and land immediately before the *next* significant token, after the
//! trivia in between; a second unresolved right-floating placeholder is a
//! fatal metadata/grammar mismatch.

use std::rc::Rc;

use tracing::{debug, trace};

use crate::error::TallyError;
use crate::field::{Cardinality, FieldSpec, Floating, NodeRegistry};
use crate::maybe::Maybe;
use crate::repeated::Repeated;
use crate::store::TokenStore;
use crate::token::Token;
use crate::tree::{Child, Element, Node};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    Significant,
    Ignored,
}

/// One token of the source stream, tagged with its channel.
#[derive(Debug)]
pub struct SourceToken {
    pub token: Token,
    pub channel: Channel,
}

impl SourceToken {
    pub fn significant(token: Token) -> Self {
        Self {
            token,
            channel: Channel::Significant,
        }
    }

    pub fn ignored(token: Token) -> Self {
        Self {
            token,
            channel: Channel::Ignored,
        }
    }
}

/// The external parser's output shape. Terminals reference the token stream
/// by index; each child of a rule corresponds to one field of the rule's
/// registered spec, in order.
#[derive(Debug)]
pub enum ParseTree {
    Terminal { index: usize },
    Rule { rule: Box<str>, children: Vec<ParseTree> },
    /// An optional grammar position with no value.
    Absent,
    /// The items of a repeated grammar position.
    Many(Vec<ParseTree>),
}

impl ParseTree {
    pub fn rule(rule: impl Into<Box<str>>, children: Vec<ParseTree>) -> Self {
        Self::Rule {
            rule: rule.into(),
            children,
        }
    }

    pub fn terminal(index: usize) -> Self {
        Self::Terminal { index }
    }

    fn shape(&self) -> &'static str {
        match self {
            Self::Terminal { .. } => "a terminal",
            Self::Rule { .. } => "a rule",
            Self::Absent => "an absent value",
            Self::Many(_) => "an item list",
        }
    }
}

/// Builds the tree for one parse, then yields the assembled store.
struct TreeBuilder<'a> {
    registry: &'a NodeRegistry,
    source: Vec<SourceToken>,
    /// Next unemitted source index.
    next: usize,
    /// Tokens of the store under construction, in final order.
    out: Vec<Token>,
    /// A right-floating placeholder waiting for the next significant token.
    pending_right: Option<Token>,
}

impl<'a> TreeBuilder<'a> {
    fn new(registry: &'a NodeRegistry, source: Vec<SourceToken>) -> Self {
        Self {
            registry,
            source,
            next: 0,
            out: Vec::new(),
            pending_right: None,
        }
    }

    /// Emits the significant token at `index`, first flushing the ignored
    /// run before it and any buffered right-floating placeholder.
    fn emit_terminal(&mut self, index: usize) -> Result<Token, TallyError> {
        if index >= self.source.len() {
            return Err(TallyError::InconsistentTokenStream {
                index,
                detail: "terminal index past the end of the token stream",
            });
        }
        if index < self.next {
            return Err(TallyError::InconsistentTokenStream {
                index,
                detail: "token consumed out of stream order",
            });
        }
        while self.next < index {
            let skipped = &self.source[self.next];
            if skipped.channel == Channel::Significant {
                return Err(TallyError::InconsistentTokenStream {
                    index: self.next,
                    detail: "significant token never consumed by the parse tree",
                });
            }
            self.out.push(skipped.token.clone());
            self.next += 1;
        }
        let source = &self.source[index];
        if source.channel != Channel::Significant {
            return Err(TallyError::InconsistentTokenStream {
                index,
                detail: "ignored token consumed as a terminal",
            });
        }
        if let Some(placeholder) = self.pending_right.take() {
            trace!(index, "resolving right-floating placeholder");
            self.out.push(placeholder);
        }
        let token = source.token.clone();
        self.out.push(token.clone());
        self.next = index + 1;
        Ok(token)
    }

    /// Appends a left-floating placeholder at the current position, before
    /// any unflushed trivia.
    fn place_left(&mut self) -> Token {
        let placeholder = Token::placeholder();
        self.out.push(placeholder.clone());
        placeholder
    }

    /// Buffers a right-floating placeholder until the next significant token.
    fn place_right(&mut self) -> Token {
        assert!(
            self.pending_right.is_none(),
            "two unresolved right-floating placeholders; field metadata does not match the grammar"
        );
        let placeholder = Token::placeholder();
        self.pending_right = Some(placeholder.clone());
        placeholder
    }

    fn build_node(&mut self, rule: &str, children: &[ParseTree]) -> Result<Node, TallyError> {
        let spec = self
            .registry
            .get(rule)
            .ok_or_else(|| TallyError::unknown_rule(rule))?;
        if children.len() != spec.fields.len() {
            return Err(TallyError::FieldArity {
                rule: rule.to_string(),
                expected: spec.fields.len(),
                actual: children.len(),
            });
        }
        debug!(rule, fields = spec.fields.len(), "building node");
        let built = spec
            .fields
            .iter()
            .zip(children)
            .map(|(field, child)| self.build_child(&spec.rule, field, child))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Node::from_parsed_children(Rc::clone(&spec), built))
    }

    fn build_child(
        &mut self,
        rule: &str,
        field: &FieldSpec,
        tree: &ParseTree,
    ) -> Result<Child, TallyError> {
        match field.cardinality {
            Cardinality::Required => {
                let element = self.build_element(rule, field, tree)?;
                Ok(Child::One(element))
            }
            Cardinality::Optional(Floating::Left) => {
                let placeholder = self.place_left();
                let inner = match tree {
                    ParseTree::Absent => None,
                    present => Some(self.build_element(rule, field, present)?),
                };
                Ok(Child::Maybe(Maybe::from_parsed(
                    placeholder,
                    Floating::Left,
                    inner,
                )))
            }
            Cardinality::Optional(Floating::Right) => {
                let inner = match tree {
                    ParseTree::Absent => None,
                    present => Some(self.build_element(rule, field, present)?),
                };
                let placeholder = self.place_right();
                Ok(Child::Maybe(Maybe::from_parsed(
                    placeholder,
                    Floating::Right,
                    inner,
                )))
            }
            Cardinality::Repeated => {
                let placeholder = self.place_left();
                let ParseTree::Many(items) = tree else {
                    return Err(self.child_shape(rule, field, tree));
                };
                let items = items
                    .iter()
                    .map(|item| self.build_element(rule, field, item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Child::Repeated(Repeated::from_parsed(placeholder, items)))
            }
        }
    }

    fn build_element(
        &mut self,
        rule: &str,
        field: &FieldSpec,
        tree: &ParseTree,
    ) -> Result<Element, TallyError> {
        match tree {
            ParseTree::Terminal { index } => Ok(Element::Token(self.emit_terminal(*index)?)),
            ParseTree::Rule { rule, children } => {
                Ok(Element::Node(self.build_node(rule, children)?))
            }
            other => Err(self.child_shape(rule, field, other)),
        }
    }

    fn child_shape(&self, rule: &str, field: &FieldSpec, tree: &ParseTree) -> TallyError {
        TallyError::ChildShape {
            rule: rule.to_string(),
            field: field.name.to_string(),
            found: tree.shape(),
        }
    }

    /// Flushes the buffered placeholder and the trailing ignored run, then
    /// assembles the store.
    fn finish(mut self) -> Result<TokenStore, TallyError> {
        if let Some(placeholder) = self.pending_right.take() {
            self.out.push(placeholder);
        }
        while self.next < self.source.len() {
            let rest = &self.source[self.next];
            if rest.channel == Channel::Significant {
                return Err(TallyError::InconsistentTokenStream {
                    index: self.next,
                    detail: "significant token never consumed by the parse tree",
                });
            }
            self.out.push(rest.token.clone());
            self.next += 1;
        }
        Ok(TokenStore::from_tokens(self.out))
    }
}

/// Builds an attached [`Node`] from the external tokenizer/parser output.
/// The returned store holds every source token from both channels in
/// original order, so printing the root reproduces the source exactly.
pub fn build_tree(
    registry: &NodeRegistry,
    source: Vec<SourceToken>,
    tree: &ParseTree,
) -> Result<(Node, TokenStore), TallyError> {
    let mut builder = TreeBuilder::new(registry, source);
    let ParseTree::Rule { rule, children } = tree else {
        return Err(TallyError::InconsistentTokenStream {
            index: 0,
            detail: "root of the parse tree must be a rule",
        });
    };
    let node = builder.build_node(rule, children)?;
    let store = builder.finish()?;
    Ok((node, store))
}
