//! Gramática de literales de texto.
//!
//! Los literales se delimitan por `"`, `'` o `` ` ``. El mismo cuerpo
//! de literal es compartido por el lexer principal y por el expansor de
//! macros, el cual necesita saltar literales completos sin interpretar
//! su contenido.
//!
//! Secuencias de escape reconocidas: `\\`, `\"`, `\'`, `` \` ``, `\n`,
//! `\t`, `\r`, `\0` y `\xHH`.

use crate::source::{Located, Location, Source};
use std::{ops::Range, rc::Rc};
use thiserror::Error;

/// Error en el cuerpo de un literal.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LiteralError {
    /// El literal no se cerró antes del fin de línea o de archivo.
    #[error("Unterminated string literal")]
    Unterminated,

    /// Secuencia de escape desconocida.
    #[error("Invalid escape sequence '\\{0}'")]
    BadEscape(char),

    /// `\x` no fue seguido por dos dígitos hexadecimales.
    #[error("Expected two hexadecimal digits after '\\x'")]
    BadHexEscape,
}

/// Resultado de analizar un literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    /// Rango del cuerpo original, sin comillas.
    pub raw: Range<usize>,

    /// Contenido con escapes resueltos.
    pub value: Vec<u8>,

    /// Primer byte después de la comilla de cierre.
    pub end: usize,
}

/// Analiza el cuerpo de un literal que inicia en `body`, justo después
/// de la comilla de apertura `quote`.
pub fn parse_string_literal(
    source: &Rc<Source>,
    body: usize,
    quote: u8,
) -> Result<Literal, Located<LiteralError>> {
    let input = source.buffer();
    let fail = |error, span: Range<usize>| Err(Located::at(error, Location::new(source, span)));

    let mut value = Vec::new();
    let mut cursor = body;

    loop {
        let byte = input.get(cursor).copied().unwrap_or(0);
        match byte {
            0 | b'\n' | b'\r' => return fail(LiteralError::Unterminated, body - 1..cursor),

            byte if byte == quote => break,

            b'\\' => {
                let escaped = input.get(cursor + 1).copied().unwrap_or(0);
                let (decoded, length) = match escaped {
                    b'\\' | b'"' | b'\'' | b'`' => (escaped, 2),
                    b'n' => (b'\n', 2),
                    b't' => (b'\t', 2),
                    b'r' => (b'\r', 2),
                    b'0' => (0, 2),
                    b'x' => {
                        let digits = input.get(cursor + 2..cursor + 4).unwrap_or(&[]);
                        match hex_byte(digits) {
                            Some(decoded) => (decoded, 4),
                            None => return fail(LiteralError::BadHexEscape, cursor..cursor + 2),
                        }
                    }

                    0 | b'\n' | b'\r' => {
                        return fail(LiteralError::Unterminated, body - 1..cursor + 1)
                    }

                    other => {
                        return fail(LiteralError::BadEscape(other as char), cursor..cursor + 2)
                    }
                };

                value.push(decoded);
                cursor += length;
            }

            byte => {
                value.push(byte);
                cursor += 1;
            }
        }
    }

    Ok(Literal {
        raw: body..cursor,
        value,
        end: cursor + 1,
    })
}

/// Inverso de [`parse_string_literal`]: produce un cuerpo válido para
/// cualquiera de los tres tipos de comillas.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '"' | '\'' | '`' => {
                escaped.push('\\');
                escaped.push(c);
            }

            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            '\r' => escaped.push_str("\\r"),
            '\0' => escaped.push_str("\\0"),
            c => escaped.push(c),
        }
    }

    escaped
}

fn hex_byte(digits: &[u8]) -> Option<u8> {
    match digits {
        &[high, low] => {
            let high = (high as char).to_digit(16)?;
            let low = (low as char).to_digit(16)?;
            Some((high * 16 + low) as u8)
        }

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> Result<Literal, LiteralError> {
        let source = Source::new("lit", text);
        parse_string_literal(&source, 1, text.as_bytes()[0]).map_err(Located::into_inner)
    }

    #[test]
    fn plain_body() {
        let literal = parse("\"hello\" tail").unwrap();
        assert_eq!(literal.raw, 1..6);
        assert_eq!(literal.value, b"hello");
        assert_eq!(literal.end, 7);
    }

    #[test]
    fn other_quotes_do_not_close() {
        let literal = parse("'it\"s`'").unwrap();
        assert_eq!(literal.value, b"it\"s`");
    }

    #[test]
    fn escapes_are_decoded() {
        let literal = parse(r#""a\n\t\\\"\x41\0""#).unwrap();
        assert_eq!(literal.value, b"a\n\t\\\"A\0");
        assert_eq!(literal.raw, 1..16);
    }

    #[test]
    fn unterminated() {
        assert_eq!(parse("\"abc"), Err(LiteralError::Unterminated));
        assert_eq!(parse("\"abc\ndef\""), Err(LiteralError::Unterminated));
        assert_eq!(parse("\"abc\\"), Err(LiteralError::Unterminated));
    }

    #[test]
    fn bad_escapes() {
        assert_eq!(parse(r#""\q""#), Err(LiteralError::BadEscape('q')));
        assert_eq!(parse(r#""\x4""#), Err(LiteralError::BadHexEscape));
    }

    #[test]
    fn escape_is_inverse() {
        let text = "say \"hi\"\n\t'`\\";
        let quoted = format!("`{}`", escape(text));
        let literal = parse(&quoted).unwrap();

        assert_eq!(literal.value, text.as_bytes());
        assert_eq!(literal.end, quoted.len());
    }
}
