mod common;

use common::parse_ledger;
use pretty_assertions::assert_eq;
use tally_core::error::TallyError;
use tally_core::node::CstNode;
use tally_core::slice::SliceSpec;
use tally_core::token::Token;
use tally_core::tree::{Element, Node};

fn directive(file: &mut Node, index: usize) -> &mut Node {
    file.repeated_mut("directives")
        .get_mut(index)
        .expect("directive index in range")
        .as_node_mut()
        .expect("directive item is a node")
}

fn currency(code: &str) -> Element {
    Element::Token(Token::term("CURRENCY", code))
}

#[test]
fn inserting_into_an_empty_currency_list() {
    let (mut file, store) = parse_ledger("2000-01-01 open Assets:Cash\n");
    let open = directive(&mut file, 0);
    assert_eq!(open.repeated("currencies").text(), "");
    open.insert_item("currencies", 0, currency("USD"));
    open.insert_item("currencies", 1, currency("GBP"));
    assert_eq!(store.text(), "2000-01-01 open Assets:Cash USD, GBP\n");
}

#[test]
fn pop_and_reappend_a_directive() {
    let source = "2000-01-01 open Assets:A\n\
                  2000-01-02 open Assets:B\n\
                  2000-01-03 open Assets:C\n";
    let (mut file, store) = parse_ledger(source);
    let (popped, popped_store) = file.pop_item("directives", 1);
    assert_eq!(popped_store.text(), "2000-01-02 open Assets:B");
    assert_eq!(popped.text(), "2000-01-02 open Assets:B");
    assert_eq!(
        store.text(),
        "2000-01-01 open Assets:A\n2000-01-03 open Assets:C\n"
    );
    file.append_item("directives", popped);
    assert_eq!(
        store.text(),
        "2000-01-01 open Assets:A\n2000-01-03 open Assets:C\n2000-01-02 open Assets:B\n"
    );
}

#[test]
fn grafting_a_directive_between_files() {
    let (mut donor, donor_store) = parse_ledger("2000-01-01 open Assets:A\n");
    let (mut host, host_store) = parse_ledger("2000-02-01 open Assets:B\n");
    let (moved, _moved_store) = donor.pop_item("directives", 0);
    host.append_item("directives", moved);
    assert_eq!(donor_store.text(), "\n");
    assert_eq!(
        host_store.text(),
        "2000-02-01 open Assets:B\n2000-01-01 open Assets:A\n"
    );
    assert_eq!(host.repeated("directives").len(), 2);
}

#[test]
fn in_place_text_edits_shift_later_positions() {
    let (mut file, store) = parse_ledger("2000-01-01 open Assets:A\n2000-01-02 open Assets:B\n");
    let second_date = directive(&mut file, 1).token("date");
    assert_eq!(second_date.position().unwrap().offset, 25);
    directive(&mut file, 0).set_token_text("account", "Assets:Longer:Name");
    assert_eq!(
        store.text(),
        "2000-01-01 open Assets:Longer:Name\n2000-01-02 open Assets:B\n"
    );
    assert_eq!(second_date.position().unwrap().offset, 35);
    assert_eq!(second_date.position().unwrap().line, 1);
}

#[test]
fn removing_the_first_currency_keeps_the_leading_space() {
    let (mut file, store) = parse_ledger("2000-01-01 open Assets:Cash USD, EUR\n");
    let open = directive(&mut file, 0);
    open.remove_item("currencies", 0);
    assert_eq!(store.text(), "2000-01-01 open Assets:Cash EUR\n");
    open.remove_item("currencies", 0);
    assert_eq!(store.text(), "2000-01-01 open Assets:Cash\n");
}

#[test]
fn optional_field_set_and_clear() {
    let (mut file, store) = parse_ledger("2000-01-01 open Assets:Cash USD\n");
    let open = directive(&mut file, 0);
    open.set_optional(
        "inline_comment",
        Some(Element::Token(Token::new(
            tally_core::token::TokenKind::Comment,
            "; noted",
        ))),
    );
    assert_eq!(store.text(), "2000-01-01 open Assets:Cash USD ; noted\n");
    open.set_optional("inline_comment", None);
    assert_eq!(store.text(), "2000-01-01 open Assets:Cash USD\n");
}

#[test]
fn stepped_slice_assignment_over_currencies() {
    let (mut file, store) = parse_ledger("2000-01-01 open Assets:Cash USD, EUR, GBP\n");
    let open = directive(&mut file, 0);
    let spec = open.spec().clone();
    let (_, field) = spec.field("currencies").expect("currencies field");

    let err = open
        .repeated_mut("currencies")
        .set_slice(field, SliceSpec::full().with_step(2), vec![currency("CAD")])
        .unwrap_err();
    assert!(matches!(err, TallyError::SliceLengthMismatch { .. }));
    assert_eq!(store.text(), "2000-01-01 open Assets:Cash USD, EUR, GBP\n");

    open.repeated_mut("currencies")
        .set_slice(
            field,
            SliceSpec::full().with_step(2),
            vec![currency("CAD"), currency("JPY")],
        )
        .unwrap();
    assert_eq!(store.text(), "2000-01-01 open Assets:Cash CAD, EUR, JPY\n");
}

#[test]
fn contiguous_slice_deletion() {
    let (mut file, store) = parse_ledger("2000-01-01 open Assets:Cash USD, EUR, GBP\n");
    directive(&mut file, 0)
        .repeated_mut("currencies")
        .delete_slice(SliceSpec::range(1, 3));
    assert_eq!(store.text(), "2000-01-01 open Assets:Cash USD\n");
}

#[test]
fn replacing_a_required_field_splices_only_its_span() {
    let (mut file, store) = parse_ledger("2000-01-01 open Assets:Cash ; keep\n");
    directive(&mut file, 0).replace_child("keyword", Element::Token(Token::term("KW", "close")));
    assert_eq!(store.text(), "2000-01-01 close Assets:Cash ; keep\n");
}
