//! Field-descriptor metadata
//!
//! The layouts of composite node types are produced offline by a code
//! generator and consumed here as plain data: per node type an ordered list
//! of fields, each with a cardinality, a floating direction for optional
//! fields, separator templates, and a default indentation. The engine never
//! interprets a grammar; it only follows these descriptors when translating
//! edits into store splices.
//!
//! Rule-name lookup goes through an explicit [`NodeRegistry`] constructed
//! once and passed by reference; there are no process-wide singletons.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::token::{Token, TokenKind};

/// Where an optional field's placeholder sits relative to its value when the
/// value is present.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Floating {
    /// Placeholder precedes the value: `[placeholder, separators, value]`.
    Left,
    /// Value precedes the placeholder: `[value, separators, placeholder]`.
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cardinality {
    Required,
    Optional(Floating),
    /// A placeholder-anchored list; the placeholder always precedes the
    /// first item.
    Repeated,
}

/// One separator token template. Templates are materialized into fresh
/// tokens per insertion; separator tokens are never shared across positions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Separator {
    /// A single space.
    Space,
    Newline,
    /// The field's default indentation.
    Indent,
    /// An arbitrary literal token.
    Literal(TokenKind, Box<str>),
}

/// Static descriptor of one field of a composite node type.
#[derive(Clone, Debug)]
pub struct FieldSpec {
    pub name: Box<str>,
    pub cardinality: Cardinality,
    /// Separators preceding the field's value, or each repeated item.
    pub separators: Vec<Separator>,
    /// Distinct separators before a repeated field's first item, when they
    /// differ from [`FieldSpec::separators`].
    pub separators_before_first: Option<Vec<Separator>>,
    pub default_indent: Box<str>,
}

impl FieldSpec {
    fn new(name: impl Into<Box<str>>, cardinality: Cardinality) -> Self {
        Self {
            name: name.into(),
            cardinality,
            separators: Vec::new(),
            separators_before_first: None,
            default_indent: "    ".into(),
        }
    }

    pub fn required(name: impl Into<Box<str>>) -> Self {
        Self::new(name, Cardinality::Required)
    }

    pub fn optional(name: impl Into<Box<str>>, floating: Floating) -> Self {
        Self::new(name, Cardinality::Optional(floating))
    }

    pub fn repeated(name: impl Into<Box<str>>) -> Self {
        Self::new(name, Cardinality::Repeated)
    }

    pub fn with_separators(mut self, separators: impl IntoIterator<Item = Separator>) -> Self {
        self.separators = separators.into_iter().collect();
        self
    }

    pub fn with_separators_before_first(
        mut self,
        separators: impl IntoIterator<Item = Separator>,
    ) -> Self {
        self.separators_before_first = Some(separators.into_iter().collect());
        self
    }

    pub fn with_default_indent(mut self, indent: impl Into<Box<str>>) -> Self {
        self.default_indent = indent.into();
        self
    }

    /// Materializes the regular separator templates into fresh tokens.
    pub fn make_separators(&self) -> Vec<Token> {
        self.separators
            .iter()
            .map(|separator| self.materialize(separator))
            .collect()
    }

    /// Materializes the before-first templates, falling back to the regular
    /// ones when no distinct set is configured.
    pub fn make_separators_before_first(&self) -> Vec<Token> {
        match &self.separators_before_first {
            Some(separators) => separators
                .iter()
                .map(|separator| self.materialize(separator))
                .collect(),
            None => self.make_separators(),
        }
    }

    fn materialize(&self, separator: &Separator) -> Token {
        match separator {
            Separator::Space => Token::whitespace(" "),
            Separator::Newline => Token::newline(),
            Separator::Indent => Token::whitespace(self.default_indent.to_string()),
            Separator::Literal(kind, text) => Token::new(kind.clone(), text.to_string()),
        }
    }
}

/// Static descriptor of one composite node type: its rule name plus its
/// ordered fields.
#[derive(Clone, Debug)]
pub struct NodeSpec {
    pub rule: Box<str>,
    pub fields: Vec<FieldSpec>,
}

impl NodeSpec {
    pub fn new(rule: impl Into<Box<str>>, fields: Vec<FieldSpec>) -> Self {
        assert!(!fields.is_empty(), "a node spec needs at least one field");
        Self {
            rule: rule.into(),
            fields,
        }
    }

    /// Looks a field up by name, returning its index and descriptor.
    pub fn field(&self, name: &str) -> Option<(usize, &FieldSpec)> {
        self.fields
            .iter()
            .enumerate()
            .find(|(_, field)| &*field.name == name)
    }
}

/// The rule-name → node-spec registration table, insertion-ordered.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    specs: IndexMap<Box<str>, Rc<NodeSpec>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a spec under its rule name, returning the shared handle.
    pub fn register(&mut self, spec: NodeSpec) -> Rc<NodeSpec> {
        let spec = Rc::new(spec);
        self.specs.insert(spec.rule.clone(), Rc::clone(&spec));
        spec
    }

    pub fn get(&self, rule: &str) -> Option<Rc<NodeSpec>> {
        self.specs.get(rule).cloned()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
