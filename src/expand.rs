//! Expansión de macros.
//!
//! Una macro es un archivo de texto plantilla que se invoca con una lista
//! de argumentos posicionales. El texto se recorre con la tabla del
//! lenguaje de macros, la cual reconoce un sublenguaje pequeño:
//!
//! - `#:nombre:#` declara el siguiente parámetro posicional.
//! - `#nombre#` se sustituye por el argumento correspondiente, tal cual.
//! - `#"nombre"#`, `#'nombre'#` y `` #`nombre`# `` se sustituyen por el
//!   argumento escapado y encerrado en la comilla respectiva.
//! - Los literales de texto y los comentarios se copian sin examinar su
//!   contenido, por lo cual `"#x#"` no es una sustitución.
//!
//! Todo lo demás se copia textualmente. Los argumentos que exceden la
//! cantidad de parámetros declarados simplemente no son accesibles.

use crate::{
    literal::{self, LiteralError},
    scan::macro_lang,
    source::{Located, Location, Source},
};

use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, trace};

/// Tokens del lenguaje de macros.
///
/// Los discriminantes coinciden con los estados terminales de
/// [`macro_lang::TABLE`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum MacroToken {
    Error = 0,
    Eof = 1,
    Backtick = 2,
    DQuote = 3,
    Quote = 4,
    LineComment = 5,
    BlockComment = 6,
    Param = 7,
    DQuoteParam = 8,
    QuoteParam = 9,
    BacktickParam = 10,
    ParamDecl = 11,
}

/// Error de expansión.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MacroError {
    /// Se usó un parámetro antes de declararlo.
    #[error("Macro parameter #{0}# must be declared before use.")]
    Undeclared(String),

    /// Un mismo nombre se declaró dos veces.
    #[error("Macro parameters declared twice.")]
    Redeclared,

    /// Literal mal formado dentro de la macro.
    #[error(transparent)]
    Literal(#[from] LiteralError),
}

/// Expande una macro con los argumentos dados.
///
/// Las ubicaciones de los errores son relativas a `source`; quien invoca
/// la macro es responsable de relacionarlas con el sitio de invocación.
pub fn expand<S: AsRef<str>>(
    source: &Rc<Source>,
    args: &[S],
) -> Result<String, Located<MacroError>> {
    debug!(name = source.name(), args = args.len(), "expanding macro");

    let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();

    let input = source.buffer();
    let length = source.content().len();

    let mut params: Vec<&[u8]> = Vec::new();
    let mut output = Vec::with_capacity(length);
    let mut cursor = 0;

    while cursor < length {
        let begin = cursor;
        let (state, end) = macro_lang::TABLE.scan(input, begin);
        let located = |error| Located::at(error, Location::new(source, begin..end));

        let find = |name: &[u8]| match params.iter().position(|&param| param == name) {
            Some(index) => Ok(args.get(index).copied()),
            None => Err(located(MacroError::Undeclared(
                String::from_utf8_lossy(name).into_owned(),
            ))),
        };

        match macro_lang::TERMINALS.get(state as usize).copied() {
            Some(MacroToken::Eof) if begin >= length => break,

            // Un NUL dentro del contenido se copia como texto
            Some(MacroToken::Error | MacroToken::Eof) => {
                trace!(offset = begin, "macro text passthrough");
                output.push(input[begin]);
                cursor = begin + 1;
                continue;
            }

            Some(MacroToken::Backtick | MacroToken::DQuote | MacroToken::Quote) => {
                let quote = input[begin];
                let literal = literal::parse_string_literal(source, end, quote)
                    .map_err(|error| error.map(MacroError::from))?;

                output.push(quote);
                output.extend_from_slice(&input[literal.raw]);
                output.push(quote);

                cursor = literal.end;
                continue;
            }

            Some(MacroToken::Param) => {
                if let Some(arg) = find(&input[begin + 1..end - 1])? {
                    output.extend_from_slice(arg.as_bytes());
                }
            }

            Some(
                MacroToken::DQuoteParam | MacroToken::QuoteParam | MacroToken::BacktickParam,
            ) => {
                let quote = input[begin + 1];
                let arg = find(&input[begin + 2..end - 2])?;

                output.push(quote);
                if let Some(arg) = arg {
                    output.extend_from_slice(literal::escape(arg).as_bytes());
                }
                output.push(quote);
            }

            Some(MacroToken::ParamDecl) => {
                let name = &input[begin + 2..end - 2];
                if params.contains(&name) {
                    return Err(located(MacroError::Redeclared));
                }

                params.push(name);
            }

            // Comentarios, o un estado transitorio al final del archivo
            _ => output.extend_from_slice(&input[begin..end]),
        }

        cursor = end;
    }

    Ok(match String::from_utf8(output) {
        Ok(text) => text,
        Err(error) => String::from_utf8_lossy(error.as_bytes()).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::ScanTable;
    use pretty_assertions::assert_eq;

    fn run(text: &str, args: &[&str]) -> Result<String, Located<MacroError>> {
        let source = Source::new("test.macrofab", text);
        expand(&source, args)
    }

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(run("hello world", &[]).unwrap(), "hello world");
        assert_eq!(run("x#y", &[]).unwrap(), "x#y");
        assert_eq!(run("", &[]).unwrap(), "");
    }

    #[test]
    fn substitution() {
        assert_eq!(run("#:x:# hello #x#", &["Bob"]).unwrap(), " hello Bob");
        assert_eq!(run("#:x:##x##x#", &["ab"]).unwrap(), "abab");
        assert_eq!(run("#:A1:##A1#", &["Bob"]).unwrap(), "Bob");
    }

    #[test]
    fn quoted_substitution() {
        assert_eq!(run("#:x:#say #\"x\"#", &["Bob"]).unwrap(), "say \"Bob\"");
        assert_eq!(
            run("#:name:##'name'# #`name`#", &["Bob"]).unwrap(),
            "'Bob' `Bob`"
        );
        assert_eq!(
            run("#:a:##\"a\"#", &["say \"hi\""]).unwrap(),
            r#""say \"hi\"""#
        );
    }

    #[test]
    fn parameters_follow_declaration_order() {
        assert_eq!(run("#:b:##:a:##a#-#b#", &["1", "2"]).unwrap(), "2-1");
    }

    #[test]
    fn missing_arguments_expand_to_nothing() {
        assert_eq!(run("#:a:##:b:##b#", &["Bob"]).unwrap(), "");
        assert_eq!(run("#:a:##\"a\"#", &[]).unwrap(), "\"\"");
    }

    #[test]
    fn literals_and_comments_are_opaque() {
        assert_eq!(
            run("#:x:#\"quoted #x#\" tail", &["Bob"]).unwrap(),
            "\"quoted #x#\" tail"
        );
        assert_eq!(run("// c #x#\na", &[]).unwrap(), "// c #x#\na");
        assert_eq!(run("x /* y", &[]).unwrap(), "x /* y");
        assert_eq!(run(r#"'\'#x#'"#, &[]).unwrap(), r#"'\'#x#'"#);
    }

    #[test]
    fn embedded_nul_is_text() {
        assert_eq!(run("#:x:#a\0#x#", &["b"]).unwrap(), "a\0b");
    }

    #[test]
    fn unterminated_parameter_is_text() {
        assert_eq!(run("#x", &[]).unwrap(), "#x");
    }

    #[test]
    fn undeclared() {
        let error = run("ab #x#", &["Bob"]).unwrap_err();
        assert_eq!(error.val(), &MacroError::Undeclared("x".into()));
        assert_eq!(error.location().range(), 3..6);
        assert_eq!(
            error.val().to_string(),
            "Macro parameter #x# must be declared before use."
        );
    }

    #[test]
    fn redeclared() {
        let error = run("#:x:##:x:#", &[]).unwrap_err();
        assert_eq!(error.val(), &MacroError::Redeclared);
        assert_eq!(error.location().range(), 5..10);
    }

    #[test]
    fn bad_literal() {
        let error = run("\"open", &[]).unwrap_err();
        assert_eq!(error.val(), &MacroError::Literal(LiteralError::Unterminated));
    }

    #[test]
    fn terminals_match_discriminants() {
        for (state, token) in macro_lang::TERMINALS.iter().enumerate() {
            assert_eq!(*token as usize, state);
        }

        assert_eq!(macro_lang::TABLE.start, 19);
        assert_eq!(ScanTable::ERROR, MacroToken::Error as u16);
    }
}
