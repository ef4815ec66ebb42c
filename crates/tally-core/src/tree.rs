//! Composite nodes and their typed field surface
//!
//! A [`Node`] owns one [`Child`] per field of its [`NodeSpec`], in field
//! order; the node's span runs from its first child's first token to its last
//! child's last token. Children are a closed sum: a required child is an
//! [`Element`] (terminal token or nested node), an optional child is a
//! [`Maybe<Element>`], a repeated child is a [`Repeated<Element>`]. Edits go
//! through the accessors here, which look up the field's descriptor and
//! translate the edit into a bounded store splice.

use std::rc::Rc;

use crate::field::{Cardinality, FieldSpec, NodeSpec};
use crate::maybe::Maybe;
use crate::node::{CstNode, Transformer};
use crate::repeated::Repeated;
use crate::store::TokenStore;
use crate::token::{BlockComment, Token};

/// One tree participant that can stand alone: a grammar terminal, a nested
/// composite node, or a claimed comment living in a repeated field as a
/// pseudo-item.
#[derive(Debug)]
pub enum Element {
    Token(Token),
    Node(Node),
    Comment(BlockComment),
}

impl Element {
    pub fn as_token(&self) -> Option<&Token> {
        match self {
            Self::Token(token) => Some(token),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_node_mut(&mut self) -> Option<&mut Node> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_comment(&self) -> Option<&BlockComment> {
        match self {
            Self::Comment(comment) => Some(comment),
            _ => None,
        }
    }
}

impl CstNode for Element {
    fn first_token(&self) -> Token {
        match self {
            Self::Token(token) => token.clone(),
            Self::Node(node) => node.first_token(),
            Self::Comment(comment) => comment.token().clone(),
        }
    }

    fn last_token(&self) -> Token {
        match self {
            Self::Token(token) => token.clone(),
            Self::Node(node) => node.last_token(),
            Self::Comment(comment) => comment.token().clone(),
        }
    }

    fn clone_with(&self, transformer: &Transformer) -> Self {
        match self {
            Self::Token(token) => Self::Token(token.clone_with(transformer)),
            Self::Node(node) => Self::Node(node.clone_with(transformer)),
            Self::Comment(comment) => Self::Comment(comment.clone_with(transformer)),
        }
    }

    fn take_tokens(&self) -> Vec<Token> {
        match self {
            Self::Token(token) => token.take_tokens(),
            Self::Node(node) => node.take_tokens(),
            Self::Comment(comment) => comment.take_tokens(),
        }
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Token(a), Self::Token(b)) => a == b,
            (Self::Node(a), Self::Node(b)) => a == b,
            (Self::Comment(a), Self::Comment(b)) => a == b,
            _ => false,
        }
    }
}

/// The shape of one field's content, mirroring the field's cardinality.
#[derive(Debug, PartialEq)]
pub enum Child {
    One(Element),
    Maybe(Maybe<Element>),
    Repeated(Repeated<Element>),
}

impl Child {
    fn shape(&self) -> &'static str {
        match self {
            Self::One(_) => "a single element",
            Self::Maybe(_) => "an optional element",
            Self::Repeated(_) => "a repeated element",
        }
    }

    fn fits(&self, cardinality: Cardinality) -> bool {
        match (self, cardinality) {
            (Self::One(_), Cardinality::Required) => true,
            (Self::Maybe(maybe), Cardinality::Optional(floating)) => {
                maybe.floating() == floating
            }
            (Self::Repeated(_), Cardinality::Repeated) => true,
            _ => false,
        }
    }
}

impl CstNode for Child {
    fn first_token(&self) -> Token {
        match self {
            Self::One(element) => element.first_token(),
            Self::Maybe(maybe) => maybe.first_token(),
            Self::Repeated(repeated) => repeated.first_token(),
        }
    }

    fn last_token(&self) -> Token {
        match self {
            Self::One(element) => element.last_token(),
            Self::Maybe(maybe) => maybe.last_token(),
            Self::Repeated(repeated) => repeated.last_token(),
        }
    }

    fn clone_with(&self, transformer: &Transformer) -> Self {
        match self {
            Self::One(element) => Self::One(element.clone_with(transformer)),
            Self::Maybe(maybe) => Self::Maybe(maybe.clone_with(transformer)),
            Self::Repeated(repeated) => Self::Repeated(repeated.clone_with(transformer)),
        }
    }

    fn take_tokens(&self) -> Vec<Token> {
        match self {
            Self::One(element) => element.take_tokens(),
            Self::Maybe(maybe) => maybe.take_tokens(),
            Self::Repeated(repeated) => repeated.take_tokens(),
        }
    }
}

/// A composite node: a spec plus one child per field, in field order.
#[derive(Debug)]
pub struct Node {
    spec: Rc<NodeSpec>,
    children: Vec<Child>,
}

impl Node {
    /// Wraps children whose tokens already share a store, in stream order;
    /// used by the parser adapter.
    ///
    /// # Panics
    ///
    /// Panics when the children do not match the spec's fields one-to-one.
    pub fn from_parsed_children(spec: Rc<NodeSpec>, children: Vec<Child>) -> Self {
        assert_eq!(
            children.len(),
            spec.fields.len(),
            "rule '{}' expects {} children",
            spec.rule,
            spec.fields.len()
        );
        for (field, child) in spec.fields.iter().zip(&children) {
            assert!(
                child.fits(field.cardinality),
                "field '{}' of rule '{}' cannot hold {}",
                field.name,
                spec.rule,
                child.shape()
            );
        }
        Self { spec, children }
    }

    /// Builds a node in its own fresh store, synthesizing each required
    /// field's separators from its descriptor. Optional and repeated children
    /// contribute their spans as-is (a detached `Maybe`/`Repeated` must be
    /// empty, so new values are added through the field accessors afterward).
    pub fn from_children(spec: Rc<NodeSpec>, children: Vec<Child>) -> (Self, TokenStore) {
        let mut tokens = Vec::new();
        for (field, child) in spec.fields.iter().zip(&children) {
            if matches!(child, Child::One(_)) {
                tokens.extend(field.make_separators());
            }
            tokens.extend(child.take_tokens());
        }
        let store = TokenStore::from_tokens(tokens);
        (Self::from_parsed_children(spec, children), store)
    }

    pub fn rule(&self) -> &str {
        &self.spec.rule
    }

    pub fn spec(&self) -> &Rc<NodeSpec> {
        &self.spec
    }

    pub fn children(&self) -> &[Child] {
        &self.children
    }

    fn field_index(&self, name: &str) -> usize {
        self.spec
            .field(name)
            .unwrap_or_else(|| panic!("rule '{}' has no field '{name}'", self.spec.rule))
            .0
    }

    fn field_spec(&self, name: &str) -> FieldSpec {
        self.spec
            .field(name)
            .unwrap_or_else(|| panic!("rule '{}' has no field '{name}'", self.spec.rule))
            .1
            .clone()
    }

    pub fn child(&self, name: &str) -> &Child {
        &self.children[self.field_index(name)]
    }

    pub fn child_mut(&mut self, name: &str) -> &mut Child {
        let index = self.field_index(name);
        &mut self.children[index]
    }

    /// The terminal token of a required field.
    ///
    /// # Panics
    ///
    /// Panics when the field is not a required terminal.
    pub fn token(&self, name: &str) -> Token {
        match self.child(name) {
            Child::One(Element::Token(token)) => token.clone(),
            child => panic!("field '{name}' holds {}, not a terminal", child.shape()),
        }
    }

    /// Rewrites a required terminal's raw text in place.
    pub fn set_token_text(&self, name: &str, text: impl Into<String>) {
        self.token(name).set_raw_text(text);
    }

    /// The optional child of field `name`.
    pub fn maybe(&self, name: &str) -> &Maybe<Element> {
        match self.child(name) {
            Child::Maybe(maybe) => maybe,
            child => panic!("field '{name}' holds {}, not an optional", child.shape()),
        }
    }

    pub fn maybe_mut(&mut self, name: &str) -> &mut Maybe<Element> {
        match self.child_mut(name) {
            Child::Maybe(maybe) => maybe,
            child => panic!("field '{name}' holds {}, not an optional", child.shape()),
        }
    }

    /// The repeated child of field `name`.
    pub fn repeated(&self, name: &str) -> &Repeated<Element> {
        match self.child(name) {
            Child::Repeated(repeated) => repeated,
            child => panic!("field '{name}' holds {}, not a list", child.shape()),
        }
    }

    pub fn repeated_mut(&mut self, name: &str) -> &mut Repeated<Element> {
        match self.child_mut(name) {
            Child::Repeated(repeated) => repeated,
            child => panic!("field '{name}' holds {}, not a list", child.shape()),
        }
    }

    /// Replaces a required field's element, splicing only its span.
    pub fn replace_child(&mut self, name: &str, value: Element) {
        let index = self.field_index(name);
        match &mut self.children[index] {
            Child::One(element) => {
                let store = element
                    .token_store()
                    .expect("required field is not attached to a store");
                store.splice(
                    value.take_tokens(),
                    &element.first_token(),
                    &element.last_token(),
                );
                *element = value;
            }
            child => panic!("field '{name}' holds {}, not a single element", child.shape()),
        }
    }

    /// `set(None)`/`set(Some)` on an optional field, with the field's own
    /// default separators.
    pub fn set_optional(&mut self, name: &str, value: Option<Element>) {
        let field = self.field_spec(name);
        self.maybe_mut(name).set(&field, value);
    }

    /// Inserts into a repeated field with the field's own separators.
    pub fn insert_item(&mut self, name: &str, index: usize, value: Element) {
        let field = self.field_spec(name);
        self.repeated_mut(name).insert(&field, index, value);
    }

    pub fn append_item(&mut self, name: &str, value: Element) {
        let field = self.field_spec(name);
        self.repeated_mut(name).append(&field, value);
    }

    pub fn remove_item(&mut self, name: &str, index: usize) {
        self.repeated_mut(name).remove(index);
    }

    /// Pops an item out of a repeated field into its own standalone store.
    pub fn pop_item(&mut self, name: &str, index: usize) -> (Element, TokenStore) {
        self.repeated_mut(name).pop(index)
    }
}

impl CstNode for Node {
    fn first_token(&self) -> Token {
        self.children
            .first()
            .expect("a node has at least one field")
            .first_token()
    }

    fn last_token(&self) -> Token {
        self.children
            .last()
            .expect("a node has at least one field")
            .last_token()
    }

    fn clone_with(&self, transformer: &Transformer) -> Self {
        Self {
            spec: Rc::clone(&self.spec),
            children: self
                .children
                .iter()
                .map(|child| child.clone_with(transformer))
                .collect(),
        }
    }
}

/// Same rule, identical spanned token sequence (separators included), and
/// recursively equal children.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        if self.spec.rule != other.spec.rule || self.children != other.children {
            return false;
        }
        match (self.token_store(), other.token_store()) {
            (Some(_), Some(_)) => self.tokens() == other.tokens(),
            (None, None) => true,
            _ => false,
        }
    }
}
