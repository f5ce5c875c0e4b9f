use super::*;
use crate::{expand::MacroToken, lex::TokenKind};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn scan_kind(text: &str) -> (TokenKind, usize) {
    let (state, end) = lang::TABLE.scan(text.as_bytes(), 0);
    (TokenKind::from_state(state).unwrap(), end)
}

// === Engine ===

#[test]
fn empty_input_is_eof() {
    assert_eq!(scan_kind(""), (TokenKind::Eof, 0));
}

#[test]
fn cursor_stops_before_lookahead() {
    assert_eq!(scan_kind("if("), (TokenKind::If, 2));
    assert_eq!(scan_kind("iffy("), (TokenKind::Ident, 4));
    assert_eq!(scan_kind("<<=x"), (TokenKind::LShiftAssign, 3));
}

#[test]
fn unrecognized_byte() {
    let (state, _) = lang::TABLE.scan(b"?", 0);
    assert_eq!(state, ScanTable::ERROR);

    let (state, _) = lang::TABLE.scan(b"$g", 0);
    assert_eq!(state, ScanTable::ERROR);
}

#[test]
fn scan_from_offset() {
    let (state, end) = lang::TABLE.scan(b"a + bc", 4);
    assert_eq!(TokenKind::from_state(state), Some(TokenKind::Ident));
    assert_eq!(end, 6);
}

#[test]
fn main_table_never_stops_transient() {
    let table = &lang::TABLE;
    let nul = table.equivalence_classes[0] as usize;
    let states = table.transitions.len() / table.class_count;

    for state in table.start as usize..states {
        let next = table.transitions[state * table.class_count + nul];
        assert!(table.is_terminal(next), "state {} on NUL", state);
    }
}

#[test]
fn macro_table_terminals() {
    let (state, end) = macro_lang::TABLE.scan(b"#:name:# rest", 0);
    assert_eq!(macro_lang::TERMINALS[state as usize], MacroToken::ParamDecl);
    assert_eq!(end, 8);

    let (state, end) = macro_lang::TABLE.scan(b"#\"x\"#", 0);
    assert_eq!(macro_lang::TERMINALS[state as usize], MacroToken::DQuoteParam);
    assert_eq!(end, 5);
}

// === Properties ===

const GOOD_TOKENS: &[(&str, TokenKind)] = &[
    ("if", TokenKind::If),
    ("while", TokenKind::While),
    ("goto", TokenKind::Goto),
    ("PPUMASK", TokenKind::PpuMask),
    ("UUF", TokenKind::TypeUUF),
    ("foo_1", TokenKind::Ident),
    ("Sprite", TokenKind::TypeIdent),
    ("42", TokenKind::Decimal),
    ("3.5", TokenKind::Real),
    ("$ff", TokenKind::Hex),
    ("%10", TokenKind::Binary),
    ("<<=", TokenKind::LShiftAssign),
    ("||", TokenKind::LogicalOr),
    ("!=", TokenKind::NotEq),
    ("{", TokenKind::LBrace),
    (";", TokenKind::Semicolon),
];

fn lex_all(input: &[u8]) -> Vec<(u16, usize)> {
    let mut cursor = 0;
    let mut out = Vec::new();

    loop {
        let (state, end) = lang::TABLE.scan(input, cursor);
        out.push((state, end));

        match TokenKind::from_state(state) {
            Some(TokenKind::Eof) => return out,
            Some(TokenKind::Error) => cursor += 1,
            _ => cursor = end,
        }
    }
}

proptest! {
    #[test]
    fn scanning_always_progresses(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        let mut cursor = 0;
        let mut calls = 0;

        while cursor < bytes.len() {
            let (state, end) = lang::TABLE.scan(&bytes, cursor);
            calls += 1;

            prop_assert!(lang::TABLE.is_terminal(state));
            prop_assert!(end <= bytes.len());

            match TokenKind::from_state(state) {
                Some(TokenKind::Eof) => break,
                Some(TokenKind::Error) => cursor += 1,
                _ => {
                    prop_assert!(end > cursor);
                    cursor = end;
                }
            }
        }

        prop_assert!(calls <= bytes.len());
    }

    #[test]
    fn macro_scanning_always_progresses(bytes in proptest::collection::vec(1u8.., 0..64)) {
        let mut cursor = 0;

        while cursor < bytes.len() {
            let (state, end) = macro_lang::TABLE.scan(&bytes, cursor);
            prop_assert!(end <= bytes.len());

            if state == ScanTable::ERROR {
                cursor += 1;
            } else {
                prop_assert!(end > cursor);
                cursor = end;
            }
        }
    }

    #[test]
    fn good_tokens_are_consumed_whole(index in 0..GOOD_TOKENS.len()) {
        let (text, kind) = GOOD_TOKENS[index];
        prop_assert_eq!(scan_kind(text), (kind, text.len()));
    }

    #[test]
    fn separated_tokens_resplit(
        picks in proptest::collection::vec(0..GOOD_TOKENS.len(), 1..8),
    ) {
        let text = picks
            .iter()
            .map(|&index| GOOD_TOKENS[index].0)
            .collect::<Vec<_>>()
            .join(" ");

        let expected: Vec<_> = picks.iter().map(|&index| GOOD_TOKENS[index].1).collect();
        let found: Vec<_> = lex_all(text.as_bytes())
            .into_iter()
            .filter_map(|(state, _)| TokenKind::from_state(state))
            .filter(|&kind| !matches!(kind, TokenKind::Whitespace | TokenKind::Eof))
            .collect();

        prop_assert_eq!(found, expected);
    }

    #[test]
    fn no_shorter_match_than_longest(
        index in 0..GOOD_TOKENS.len(),
        tail in "[ ;{}]{0,3}",
    ) {
        let (text, kind) = GOOD_TOKENS[index];
        let input = format!("{}{}", text, tail);

        let (state, end) = lang::TABLE.scan(input.as_bytes(), 0);
        prop_assert_eq!(TokenKind::from_state(state), Some(kind));
        prop_assert_eq!(end, text.len());
    }
}
