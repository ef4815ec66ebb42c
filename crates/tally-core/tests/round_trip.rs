mod common;

use common::parse_ledger;
use pretty_assertions::assert_eq;
use tally_core::node::CstNode;

const LEDGER: &str = "; opening balances\n\
                      2000-01-01 open Assets:Cash USD, EUR\n\
                      \n\
                      2000-01-02 open Assets:Bank ; checking\n\
                      ; free note\n\
                      2000-01-03 close Assets:Bank\n";

#[test]
fn printing_reproduces_the_source_exactly() {
    let (_file, store) = parse_ledger(LEDGER);
    assert_eq!(store.text(), LEDGER);
}

#[test]
fn trivia_never_reaches_the_structure() {
    let (file, _store) = parse_ledger(LEDGER);
    let directives = file.repeated("directives");
    assert_eq!(directives.len(), 3);

    let open = directives.get(0).unwrap().as_node().unwrap();
    assert_eq!(open.token("date").raw_text(), "2000-01-01");
    assert_eq!(open.repeated("currencies").len(), 2);
    assert_eq!(open.repeated("currencies").get_at(-1).text(), "EUR");
    assert!(!open.maybe("inline_comment").is_present());

    let bank = directives.get(1).unwrap().as_node().unwrap();
    let inline = bank.maybe("inline_comment").inner().unwrap();
    assert_eq!(inline.text(), "; checking");
}

#[test]
fn directive_span_excludes_its_separating_trivia() {
    let (file, _store) = parse_ledger(LEDGER);
    let open = file.repeated("directives").get(0).unwrap();
    insta::assert_snapshot!(open.text(), @"2000-01-01 open Assets:Cash USD, EUR");
}

#[test]
fn deep_clone_is_disjoint_and_prints_the_same() {
    let (file, store) = parse_ledger(LEDGER);
    let original = file.repeated("directives").get(1).unwrap();
    let (copy, copy_store) = original.deep_clone();
    assert_eq!(copy_store.text(), original.text());
    assert!(!copy.first_token().same(&original.first_token()));
    assert!(!copy.last_token().same(&original.last_token()));

    // Editing the copy leaves the original text alone.
    copy.as_node()
        .unwrap()
        .set_token_text("account", "Assets:Elsewhere");
    assert_eq!(copy_store.text(), "2000-01-02 open Assets:Elsewhere ; checking");
    assert_eq!(store.text(), LEDGER);
}

#[test]
fn positions_track_lines_and_offsets() {
    let source = "2000-01-01 open Assets:Cash\n2000-01-02 close Assets:Cash\n";
    let (_file, store) = parse_ledger(source);
    assert_eq!(store.get_by_offset(0).unwrap().raw_text(), "2000-01-01");
    assert_eq!(store.get_by_offset(28).unwrap().raw_text(), "2000-01-02");
    assert!(
        store
            .find_by_line(1)
            .iter()
            .any(|token| token.raw_text() == "2000-01-02")
    );
}

#[test]
fn structural_equality_ignores_token_identity() {
    let (a, _store_a) = parse_ledger("2000-01-01 open Assets:Cash USD\n");
    let (b, _store_b) = parse_ledger("2000-01-01 open Assets:Cash USD\n");
    let (c, _store_c) = parse_ledger("2000-01-01 open Assets:Cash EUR\n");
    assert_eq!(a, b);
    assert_ne!(a, c);
}
