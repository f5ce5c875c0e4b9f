use super::*;
use pretty_assertions::assert_eq;

fn kinds(text: &str) -> Vec<TokenKind> {
    let source = Source::new("test.fab", text);
    Lexer::new(&source)
        .map(|result| match result {
            Ok(token) => token.into_inner().kind,
            Err(_) => TokenKind::Error,
        })
        .collect()
}

fn tokens(text: &str) -> Vec<(TokenKind, String, Payload)> {
    let source = Source::new("test.fab", text);
    Lexer::new(&source)
        .try_exhaustive()
        .unwrap()
        .into_iter()
        .map(|token| {
            let (location, token) = token.split();
            (token.kind, location.text().into_owned(), token.payload)
        })
        .collect()
}

#[test]
fn statement() {
    use TokenKind::*;

    assert_eq!(
        kinds("if x >= 10 { goto foo }"),
        [If, Ident, Gte, Decimal, LBrace, Goto, Ident, RBrace, Eof]
    );
}

#[test]
fn keywords_need_whole_words() {
    use TokenKind::*;

    assert_eq!(kinds("iffy else_ break"), [Ident, Ident, Break, Eof]);
    assert_eq!(kinds("UU U1 PPUCTRL PPUCTRLx"), [TypeUU, TypeIdent, PpuCtrl, TypeIdent, Eof]);
}

#[test]
fn longest_operator_wins() {
    use TokenKind::*;

    assert_eq!(kinds("a&&=b||c"), [Ident, LogicalAndAssign, Ident, LogicalOr, Ident, Eof]);
    assert_eq!(kinds("a<<=b"), [Ident, LShiftAssign, Ident, Eof]);
    assert_eq!(kinds("< <= << !"), [Lt, Lte, LShift, Bang, Eof]);
}

#[test]
fn trivia_is_dropped_but_not_line_endings() {
    use TokenKind::*;

    assert_eq!(kinds("a\r\nb\n"), [Ident, Eol, Ident, Eol, Eof]);
    assert_eq!(kinds("a // hi"), [Ident, Eof]);
    assert_eq!(kinds("/* a ** b */x"), [Ident, Eof]);
    assert_eq!(kinds("x\t\ty"), [Ident, Ident, Eof]);
}

#[test]
fn empty_input() {
    let source = Source::new("test.fab", "");
    let tokens = Lexer::new(&source).try_exhaustive().unwrap();

    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].val().kind, TokenKind::Eof);
    assert_eq!(tokens[0].location().range(), 0..0);
}

#[test]
fn numbers() {
    use TokenKind::*;

    assert_eq!(
        tokens("10 $1F %101 3.25 4."),
        [
            (Decimal, "10".to_string(), Payload::Int(10)),
            (Hex, "$1F".to_string(), Payload::Int(0x1f)),
            (Binary, "%101".to_string(), Payload::Int(0b101)),
            (Real, "3.25".to_string(), Payload::Fixed(3 << 24 | 1 << 22)),
            (Real, "4.".to_string(), Payload::Fixed(4 << 24)),
            (Eof, "".to_string(), Payload::None),
        ]
    );
}

#[test]
fn literals() {
    use TokenKind::*;

    assert_eq!(
        tokens(r#"'a' "hi\n" `zip`"#),
        [
            (Character, "'a'".to_string(), Payload::Int(b'a' as u64)),
            (StringUncompressed, r#""hi\n""#.to_string(), Payload::Text(b"hi\n".to_vec())),
            (StringCompressed, "`zip`".to_string(), Payload::Text(b"zip".to_vec())),
            (Eof, "".to_string(), Payload::None),
        ]
    );
}

#[test]
fn overflow() {
    let source = Source::new("test.fab", "99999999999999999999 1");
    let errors = Lexer::new(&source).try_exhaustive().unwrap_err();

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].val(), &LexerError::IntOverflow);
    assert_eq!(errors[0].location().range(), 0..20);
}

#[test]
fn recovery_consumes_one_byte() {
    let source = Source::new("test.fab", "@? $g x");
    let results: Vec<_> = Lexer::new(&source).collect();

    let errors: Vec<_> = results
        .iter()
        .filter_map(|result| result.as_ref().err())
        .map(|error| (error.val().clone(), error.location().range()))
        .collect();

    assert_eq!(
        errors,
        [
            (LexerError::BadChar(b'?'), 1..2),
            (LexerError::BadChar(b'$'), 3..4),
        ]
    );

    let kinds: Vec<_> = results
        .into_iter()
        .filter_map(Result::ok)
        .map(|token| token.into_inner().kind)
        .collect();

    use TokenKind::*;
    assert_eq!(kinds, [At, Ident, Ident, Eof]);
}

#[test]
fn embedded_nul_is_not_the_end() {
    let source = Source::new("test.fab", "a\0b");
    let results: Vec<_> = Lexer::new(&source)
        .map(|result| match result {
            Ok(token) => (Ok(token.val().kind), token.location().range()),
            Err(error) => (Err(error.val().clone()), error.location().range()),
        })
        .collect();

    assert_eq!(
        results,
        [
            (Ok(TokenKind::Ident), 0..1),
            (Err(LexerError::BadChar(0)), 1..2),
            (Ok(TokenKind::Ident), 2..3),
            (Ok(TokenKind::Eof), 3..3),
        ]
    );
}

#[test]
fn bad_bytes_are_named_in_hex() {
    let source = Source::new("test.fab", "\u{e9}");
    let errors = Lexer::new(&source).try_exhaustive().unwrap_err();

    let bytes: Vec<_> = errors.iter().map(|error| error.val().clone()).collect();
    assert_eq!(bytes, [LexerError::BadChar(0xc3), LexerError::BadChar(0xa9)]);
    assert_eq!(errors[0].val().to_string(), "Bad byte 0xc3 in input stream");
}

#[test]
fn bad_literals() {
    let source = Source::new("test.fab", "'ab' \"open\nx");
    let errors = Lexer::new(&source).try_exhaustive().unwrap_err();

    assert_eq!(errors[0].val(), &LexerError::CharLength);
    assert_eq!(errors[0].location().range(), 0..4);
    assert_eq!(errors[1].val(), &LexerError::Literal(LiteralError::Unterminated));
    assert_eq!(errors.len(), 2);
}

#[test]
fn display() {
    assert_eq!(TokenKind::If.to_string(), "`if`");
    assert_eq!(TokenKind::LShiftAssign.to_string(), "`<<=`");
    assert_eq!(TokenKind::Ident.to_string(), "identifier");
    assert_eq!(TokenKind::Eof.to_string(), "file ending");
}

#[test]
fn terminals_match_discriminants() {
    for state in 0..=lang::LAST_STATE {
        assert_eq!(TokenKind::from_state(state).map(|kind| kind as u16), Some(state));
    }

    assert_eq!(TokenKind::from_state(lang::START), None);
}
