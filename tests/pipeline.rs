use frontend::{
    error::Diagnostics,
    ir::StmtKind,
    lex::{Identifier, Lexer, Payload, Token, TokenKind},
    pass1::{FnClass, IdepClass, Pass1, Registry},
    source::{Located, Location, Source},
};

use pretty_assertions::assert_eq;
use std::rc::Rc;

/// Registro mínimo: los tipos y expresiones son texto.
#[derive(Debug, Default)]
struct Globals {
    names: Vec<String>,
    converted: usize,
}

impl Registry for Globals {
    type Global = usize;
    type Type = String;
    type Expr = String;

    fn lookup_global(&mut self, name: &Located<Identifier>) -> usize {
        self.names.push(name.val().to_string());
        self.names.len() - 1
    }

    fn uses_type(&mut self, _: &String, _: IdepClass) {}

    fn fn_type(&mut self, params: &[String], ret: &String) -> String {
        format!("fn({}) {}", params.join(", "), ret)
    }

    fn addr_type(&mut self, banked: bool) -> String {
        if banked { "PP" } else { "AA" }.to_string()
    }

    fn convert_expr(&mut self, _: &mut String, _: IdepClass) {
        self.converted += 1;
    }
}

fn lex(source: &Rc<Source>) -> Vec<Located<Token>> {
    match Lexer::new(source).try_exhaustive() {
        Ok(tokens) => tokens,
        Err(errors) => panic!("{}", Diagnostics::from(errors).kind("Lexical error")),
    }
}

/// Ubicación del `n`-ésimo token de un tipo.
fn find(tokens: &[Located<Token>], kind: TokenKind, n: usize) -> Location {
    tokens
        .iter()
        .filter(|token| token.val().kind == kind)
        .nth(n)
        .map(|token| token.location().clone())
        .unwrap()
}

const PROGRAM: &str = "\
fn main()
{
    while busy
    {
        if x
            break
    }
}
";

#[test]
fn lexed_function_builds_linked_statements() {
    use TokenKind::*;

    let source = Source::new("main.fab", PROGRAM);
    let tokens = lex(&source);

    let kinds: Vec<TokenKind> = tokens.iter().map(|token| token.val().kind).collect();
    assert_eq!(
        kinds,
        [
            Fn, Ident, LParen, RParen, Eol, LBrace, Eol, While, Ident, Eol, LBrace, Eol, If,
            Ident, Eol, Break, Eol, RBrace, Eol, RBrace, Eol, Eof
        ]
    );

    let name = find(&tokens, Ident, 0);
    let name = Located::at(Identifier::from_location(&name), name);

    let condition = |n| find(&tokens, Ident, n).text().into_owned();

    let mut pass1 = Pass1::new(Globals::default());
    let mut f = pass1
        .begin_fn(name, vec![], "Void".into(), FnClass::Fn)
        .unwrap();

    let outer = f
        .begin_while(find(&tokens, While, 0), condition(1), None)
        .unwrap();

    let inner = f.begin_if(find(&tokens, If, 0), condition(2), None).unwrap();
    f.break_statement(find(&tokens, Break, 0), None).unwrap();
    f.end_if(inner);
    f.end_while(outer);

    let defined = f.end_fn(None).unwrap();
    let def = &defined.def;

    assert_eq!(defined.name.val().as_ref(), "main");
    assert_eq!(defined.fn_type, "fn() Void");

    let stmts: Vec<(StmtKind, Option<u32>)> = def
        .stmts
        .iter()
        .map(|stmt| (stmt.kind, stmt.link.map(|link| link.0)))
        .collect();

    assert_eq!(
        stmts,
        [
            (StmtKind::While, Some(5)),
            (StmtKind::If, Some(4)),
            (StmtKind::Break, Some(5)),
            (StmtKind::EndIf, Some(1)),
            (StmtKind::EndWhile, Some(0)),
            (StmtKind::EndFn, None),
        ]
    );

    assert_eq!(def.stmts[2].location.start().line(), 6);
    assert_eq!(pass1.registry().converted, 2);
}

#[test]
fn macro_output_is_lexed_again() {
    use TokenKind::*;

    let caller = Source::new("main.fab", "palette(\"title\", 3)");
    let template = Source::new(
        "palette.macrofab",
        "#:name:##:n:#data /#name# { #\"name\"# U[#n#] }",
    );

    let mut pass1 = Pass1::new(Globals::default());
    let at = Location::new(&caller, 0..7);
    let expanded = pass1
        .invoke_macro(&at, &template, &["title", "3"])
        .unwrap();

    assert_eq!(expanded.name(), "palette.macrofab");
    assert_eq!(expanded.content(), b"data /title { \"title\" U[3] }");

    let tokens: Vec<(TokenKind, Payload)> = lex(&expanded)
        .into_iter()
        .map(|token| {
            let token = token.into_inner();
            (token.kind, token.payload)
        })
        .collect();

    assert_eq!(
        tokens,
        [
            (Data, Payload::None),
            (FSlash, Payload::None),
            (Ident, Payload::None),
            (LBrace, Payload::None),
            (StringUncompressed, Payload::Text(b"title".to_vec())),
            (TypeU, Payload::None),
            (LBracket, Payload::None),
            (Decimal, Payload::Int(3)),
            (RBracket, Payload::None),
            (RBrace, Payload::None),
            (Eof, Payload::None),
        ]
    );
}

#[test]
fn diagnostics_point_at_both_fields() {
    let source = Source::new("point.fab", "struct Point\n    U x\n    U x\n");
    let first = Location::new(&source, 19..20);
    let second = Location::new(&source, 27..28);

    let mut pass1 = Pass1::new(Globals::default());
    let name = Located::at(Identifier::new("Point"), Location::new(&source, 7..12));
    let mut point = pass1.begin_struct(name);

    let field = |at: &Location| frontend::ir::VarDecl {
        name: Located::at(Identifier::from_location(at), at.clone()),
        ty: "U".to_string(),
    };

    point.field(field(&first)).unwrap();
    let error = point.field(field(&second)).unwrap_err();

    let report = Diagnostics::from(error).kind("Pass1 error").to_string();
    assert!(report.starts_with("Pass1 error: "));
    assert!(report.contains(" --> point.fab:3:"));
    assert!(report.contains("note: Previous definition here:"));
    assert!(report.contains(" --> point.fab:2:"));
    assert!(report.ends_with("Build failed with 1 error\n"));
}

#[test]
fn bad_bytes_are_reported_and_skipped() {
    use TokenKind::*;

    let source = Source::new("bad.fab", "a $ b");
    let results: Vec<Result<TokenKind, u8>> = Lexer::new(&source)
        .map(|result| match result {
            Ok(token) => Ok(token.into_inner().kind),
            Err(error) => Err(match error.into_inner() {
                frontend::lex::LexerError::BadChar(byte) => byte,
                _ => 0xff,
            }),
        })
        .collect();

    assert_eq!(results, [Ok(Ident), Err(b'$'), Ok(Ident), Ok(Eof)]);
}
