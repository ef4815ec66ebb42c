//! Tally Core
//!
//! Lossless, editable concrete-syntax-tree engine for line-oriented,
//! whitespace-significant plaintext ledgers.
//!
//! Source text parses into a tree of typed nodes that keeps every byte of
//! the original (whitespace, comments, line endings), so that printing the
//! tree reproduces the input exactly. Callers then mutate the tree through
//! typed field accessors while the engine synthesizes correctly-spaced text
//! for new content and leaves untouched regions byte-identical.
//!
//! Absent optional fields and empty repeated fields stay addressable through
//! zero-width placeholder tokens, so a value can always be inserted at a
//! well-defined spot. Every token belongs to at most one
//! [`TokenStore`](store::TokenStore); moving a subtree between trees goes
//! through the detach/graft protocol of [`CstNode`](node::CstNode).
//!
//! ```
//! use std::rc::Rc;
//! use tally_core::field::{FieldSpec, Floating, NodeSpec, Separator};
//! use tally_core::maybe::Maybe;
//! use tally_core::node::CstNode;
//! use tally_core::token::Token;
//! use tally_core::tree::{Child, Element, Node};
//!
//! let spec = Rc::new(NodeSpec::new(
//!     "close",
//!     vec![
//!         FieldSpec::required("date"),
//!         FieldSpec::required("keyword").with_separators([Separator::Space]),
//!         FieldSpec::required("account").with_separators([Separator::Space]),
//!         FieldSpec::optional("comment", Floating::Left)
//!             .with_separators([Separator::Space]),
//!     ],
//! ));
//! let (mut node, store) = Node::from_children(
//!     spec,
//!     vec![
//!         Child::One(Element::Token(Token::term("DATE", "2000-01-01"))),
//!         Child::One(Element::Token(Token::term("KW", "close"))),
//!         Child::One(Element::Token(Token::term("ACCOUNT", "Assets:Cash"))),
//!         Child::Maybe(Maybe::absent(Floating::Left)),
//!     ],
//! );
//! assert_eq!(store.text(), "2000-01-01 close Assets:Cash");
//!
//! node.set_optional("comment", Some(Element::Token(Token::term("COMMENT", "; bye"))));
//! assert_eq!(store.text(), "2000-01-01 close Assets:Cash ; bye");
//! ```

pub mod adapter;
pub mod comments;
pub mod error;
pub mod field;
pub mod maybe;
pub mod node;
pub mod position;
pub mod repeated;
pub mod slice;
pub mod store;
pub mod token;
pub mod tree;

pub use adapter::{Channel, ParseTree, SourceToken, build_tree};
pub use comments::CommentHolder;
pub use error::TallyError;
pub use field::{Cardinality, FieldSpec, Floating, NodeRegistry, NodeSpec, Separator};
pub use maybe::Maybe;
pub use node::{CstNode, Transformer};
pub use position::Position;
pub use repeated::Repeated;
pub use slice::{SliceSpec, resolve_index};
pub use store::TokenStore;
pub use token::{BlockComment, Token, TokenId, TokenKind};
pub use tree::{Child, Element, Node};
