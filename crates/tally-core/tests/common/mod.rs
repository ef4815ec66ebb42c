//! A miniature ledger front end for integration tests.
//!
//! Grammar, one directive per line:
//!
//! ```text
//! DATE KEYWORD ACCOUNT [CURRENCY {, CURRENCY}] [; inline comment]
//! ```
//!
//! Inline comments are significant terminals (they belong to the directive);
//! own-line comments, newlines, inline whitespace and currency commas ride
//! the ignored channel, exactly like trivia from a real tokenizer.

use tally_core::adapter::{Channel, ParseTree, SourceToken, build_tree};
use tally_core::field::{FieldSpec, Floating, NodeRegistry, NodeSpec, Separator};
use tally_core::store::TokenStore;
use tally_core::token::{Token, TokenKind};
use tally_core::tree::Node;

pub fn registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    registry.register(NodeSpec::new(
        "directive",
        vec![
            FieldSpec::optional("leading_comment", Floating::Right)
                .with_separators([Separator::Newline]),
            FieldSpec::required("date"),
            FieldSpec::required("keyword").with_separators([Separator::Space]),
            FieldSpec::required("account").with_separators([Separator::Space]),
            FieldSpec::repeated("currencies")
                .with_separators([
                    Separator::Literal(TokenKind::Term(",".into()), ",".into()),
                    Separator::Space,
                ])
                .with_separators_before_first([Separator::Space]),
            FieldSpec::optional("inline_comment", Floating::Left)
                .with_separators([Separator::Space]),
            FieldSpec::optional("trailing_comment", Floating::Left)
                .with_separators([Separator::Newline]),
        ],
    ));
    registry.register(NodeSpec::new(
        "file",
        vec![
            FieldSpec::repeated("directives")
                .with_separators([Separator::Newline])
                .with_separators_before_first([]),
        ],
    ));
    registry
}

fn is_term(token: &Token, name: &str) -> bool {
    matches!(token.kind(), TokenKind::Term(term) if &*term == name)
}

/// Splits `source` into the two-channel token stream.
pub fn lex(source: &str) -> Vec<SourceToken> {
    let mut out = Vec::new();
    let mut rest = source;
    while !rest.is_empty() {
        let line_end = rest.find('\n').unwrap_or(rest.len());
        let (line, tail) = rest.split_at(line_end);
        if line.trim_start().starts_with(';') {
            // Own-line comment, leading indent included in the raw text.
            out.push(SourceToken::ignored(Token::new(TokenKind::Comment, line)));
        } else {
            lex_directive_line(line, &mut out);
        }
        if let Some(after) = tail.strip_prefix('\n') {
            out.push(SourceToken::ignored(Token::newline()));
            rest = after;
        } else {
            rest = tail;
        }
    }
    out
}

fn lex_directive_line(line: &str, out: &mut Vec<SourceToken>) {
    let mut rest = line;
    let mut words = 0usize;
    while !rest.is_empty() {
        let c = rest.chars().next().expect("non-empty");
        if c == ' ' || c == '\t' {
            let end = rest.len() - rest.trim_start_matches([' ', '\t']).len();
            out.push(SourceToken::ignored(Token::whitespace(&rest[..end])));
            rest = &rest[end..];
        } else if c == ',' {
            out.push(SourceToken::ignored(Token::term(",", ",")));
            rest = &rest[1..];
        } else if c == ';' {
            // The rest of the line is an inline comment terminal.
            out.push(SourceToken::significant(Token::new(
                TokenKind::Comment,
                rest,
            )));
            rest = "";
        } else {
            let end = rest
                .find([' ', '\t', ','])
                .unwrap_or(rest.len());
            let name = match words {
                0 => "DATE",
                1 => "KW",
                2 => "ACCOUNT",
                _ => "CURRENCY",
            };
            out.push(SourceToken::significant(Token::term(name, &rest[..end])));
            words += 1;
            rest = &rest[end..];
        }
    }
}

/// Builds the parse tree a real LALR parser would hand over: terminals by
/// stream index, one `directive` rule per line.
pub fn parse(tokens: &[SourceToken]) -> ParseTree {
    let significant = |from: usize| -> Option<usize> {
        (from..tokens.len()).find(|&i| tokens[i].channel == Channel::Significant)
    };
    let mut directives = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let source = &tokens[i];
        if source.channel != Channel::Significant || !is_term(&source.token, "DATE") {
            i += 1;
            continue;
        }
        let keyword = significant(i + 1).expect("keyword after date");
        let account = significant(keyword + 1).expect("account after keyword");
        let mut currencies = Vec::new();
        let mut inline = ParseTree::Absent;
        let mut next = account + 1;
        while let Some(at) = significant(next) {
            let token = &tokens[at].token;
            if is_term(token, "CURRENCY") {
                currencies.push(ParseTree::terminal(at));
                next = at + 1;
            } else if token.is_comment() {
                inline = ParseTree::terminal(at);
                next = at + 1;
                break;
            } else {
                break;
            }
        }
        directives.push(ParseTree::rule(
            "directive",
            vec![
                ParseTree::Absent,
                ParseTree::terminal(i),
                ParseTree::terminal(keyword),
                ParseTree::terminal(account),
                ParseTree::Many(currencies),
                inline,
                ParseTree::Absent,
            ],
        ));
        i = next;
    }
    ParseTree::rule("file", vec![ParseTree::Many(directives)])
}

/// Lexes, parses and adapts `source` into an attached tree.
pub fn parse_ledger(source: &str) -> (Node, TokenStore) {
    let tokens = lex(source);
    let tree = parse(&tokens);
    build_tree(&registry(), tokens, &tree).expect("well-formed ledger source")
}
