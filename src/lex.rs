//! Análisis léxico.
//!
//! # Tokenization
//! Esta es la primera fase del front end. Descompone el buffer de un
//! [`Source`] en unidades léxicas denominadas tokens por medio del motor
//! de [`crate::scan`] y la tabla del lenguaje principal. Los espacios en
//! blanco y los comentarios se descartan durante esta operación, pero los
//! finales de línea se preservan ya que la gramática los utiliza. Cada
//! token emitido esta asociado a una ubicación en el código fuente
//! original, lo cual permite rastrear errores en tanto los mismos como
//! constructos más elevados de fases posteriores.
//!
//! # Contenido de un token
//! Este lexer no produce lexemas para casos donde no son necesarios.
//! Operadores, puntuación, palabras clave e identificadores se identifican
//! únicamente por su [`TokenKind`]; el nombre de un identificador es el
//! texto cubierto por su ubicación. Las constantes numéricas y los
//! literales de texto se resuelven a sus valores en un [`Payload`].
//!
//! # Reglas importantes del lenguaje
//! - Los identificadores de valores empiezan con minúscula o `_`.
//! - Los identificadores de tipos empiezan con mayúscula.
//! - Las palabras clave siempre ganan sobre los identificadores, pero
//!   solo si el término completo coincide: `iffy` es un identificador.
//! - Los números reales son de punto fijo con 24 bits fraccionarios.
//!
//! # Errores
//! El lexer se recupera localmente de secuencias no reconocidas: reporta
//! el byte ofensivo, lo consume y continúa inmediatamente después. Esto
//! permite reportar más de un error por ejecución, pero no lo suficiente
//! como para permitir el avance a las demás fases.

use crate::{
    literal::{self, LiteralError},
    scan::lang,
    source::{Located, Location, Source},
};

use std::{
    fmt::{self, Display},
    rc::Rc,
};

use thiserror::Error;
use tracing::trace;

/// Cantidad de bits fraccionarios en literales reales.
pub const FIXED_FRAC_BITS: u32 = 24;

/// Error de escaneo.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexerError {
    /// Secuencia no reconocida a partir de este byte.
    #[error("Bad byte {0:#04x} in input stream")]
    BadChar(u8),

    /// Una constante numérica no cabe en 64 bits.
    #[error("Integer literal overflow")]
    IntOverflow,

    /// Un literal de carácter debe contener exactamente un byte.
    #[error("Character literal must contain exactly one character")]
    CharLength,

    /// Error dentro de un literal de texto.
    #[error(transparent)]
    Literal(#[from] LiteralError),
}

/// Un identificador.
///
/// Los identificadores se comparan por contenido; clonarlos es barato.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(Rc<str>);

impl Identifier {
    /// Construye a partir de un nombre.
    pub fn new(name: &str) -> Self {
        Identifier(Rc::from(name))
    }

    /// Toma el nombre del texto cubierto por una ubicación.
    pub fn from_location(location: &Location) -> Self {
        Identifier::new(&location.text())
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Identifier {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_ref().fmt(fmt)
    }
}

/// Tipo de un token.
///
/// Los discriminantes `0..=LAST_STATE` coinciden con los estados terminales
/// de [`lang::TABLE`]. Los demás se derivan de tokens de comillas.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum TokenKind {
    // Trivia y control
    Error = 0,
    Eof = 1,
    Comment = 2,
    Eol = 3,
    Whitespace = 4,

    // Palabras clave
    If = 5,
    Else = 6,
    For = 7,
    While = 8,
    Do = 9,
    Break = 10,
    Continue = 11,
    Return = 12,
    Fn = 13,
    Ct = 14,
    Mode = 15,
    Nmi = 16,
    Irq = 17,
    Goto = 18,
    Label = 19,
    Using = 20,
    File = 21,
    Struct = 22,
    Vars = 23,
    Data = 24,
    Omni = 25,
    Asm = 26,
    Ready = 27,
    Fence = 28,
    Switch = 29,
    Case = 30,
    Default = 31,
    Charmap = 32,
    Swap = 33,
    Sizeof = 34,
    Len = 35,
    True = 36,
    False = 37,

    // Registros de hardware
    PpuCtrl = 38,
    PpuMask = 39,
    PpuStatus = 40,
    PpuScroll = 41,
    PpuAddr = 42,
    PpuData = 43,
    OamAddr = 44,
    OamData = 45,
    OamDma = 46,

    // Puntuación y operadores
    Colon = 47,
    Hash = 48,
    Backtick = 49,
    DQuote = 50,
    Quote = 51,
    Semicolon = 52,
    Comma = 53,
    At = 54,
    Period = 55,
    LBrace = 56,
    RBrace = 57,
    LBracket = 58,
    RBracket = 59,
    LParen = 60,
    RParen = 61,
    Asterisk = 62,
    FSlash = 63,
    Plus = 64,
    Minus = 65,
    LShift = 66,
    RShift = 67,
    BitwiseAnd = 68,
    BitwiseXor = 69,
    BitwiseOr = 70,
    Tilde = 71,
    Bang = 72,
    Lt = 73,
    Lte = 74,
    Gt = 75,
    Gte = 76,
    Eq = 77,
    NotEq = 78,
    LogicalAnd = 79,
    LogicalOr = 80,
    Assign = 81,
    PlusAssign = 82,
    MinusAssign = 83,
    TimesAssign = 84,
    DivAssign = 85,
    BitwiseAndAssign = 86,
    LogicalAndAssign = 87,
    BitwiseOrAssign = 88,
    LogicalOrAssign = 89,
    BitwiseXorAssign = 90,
    LShiftAssign = 91,
    RShiftAssign = 92,

    // Tipos primitivos
    TypeVoid = 93,
    TypeBool = 94,
    TypeInt = 95,
    TypeReal = 96,
    TypeF = 97,
    TypeFF = 98,
    TypeFFF = 99,
    TypeU = 100,
    TypeUU = 101,
    TypeUUU = 102,
    TypeS = 103,
    TypeSS = 104,
    TypeSSS = 105,
    TypeUF = 106,
    TypeUUF = 107,
    TypeUUUF = 108,
    TypeUFF = 109,
    TypeUUFF = 110,
    TypeUUUFF = 111,
    TypeUFFF = 112,
    TypeUUFFF = 113,
    TypeUUUFFF = 114,
    TypeSF = 115,
    TypeSSF = 116,
    TypeSSSF = 117,
    TypeSFF = 118,
    TypeSSFF = 119,
    TypeSSSFF = 120,
    TypeSFFF = 121,
    TypeSSFFF = 122,
    TypeSSSFFF = 123,
    TypeAA = 124,
    TypeAAA = 125,
    TypePP = 126,
    TypePPP = 127,
    TypeCC = 128,
    TypeCCC = 129,
    TypeMM = 130,
    TypeMMM = 131,

    // Clases con lexema
    Ident = 132,
    TypeIdent = 133,
    Decimal = 134,
    Real = 135,
    Hex = 136,
    Binary = 137,

    // Derivados, no producidos por la tabla
    Character,
    StringUncompressed,
    StringCompressed,
}

impl TokenKind {
    /// Tipo de token asociado a un estado de la tabla, si es terminal.
    pub fn from_state(state: u16) -> Option<Self> {
        lang::TERMINALS.get(state as usize).copied()
    }

    /// Determina si el token se escribe siempre igual.
    pub fn is_fixed(self) -> bool {
        (TokenKind::If as u16..=TokenKind::TypeMMM as u16).contains(&(self as u16))
    }

    /// Texto fijo del token o nombre de su clase.
    pub fn text(self) -> &'static str {
        use TokenKind::*;

        match self {
            Error => "invalid token",
            Eof => "file ending",
            Comment => "comment",
            Eol => "line ending",
            Whitespace => "space",
            If => "if",
            Else => "else",
            For => "for",
            While => "while",
            Do => "do",
            Break => "break",
            Continue => "continue",
            Return => "return",
            Fn => "fn",
            Ct => "ct",
            Mode => "mode",
            Nmi => "nmi",
            Irq => "irq",
            Goto => "goto",
            Label => "label",
            Using => "using",
            File => "file",
            Struct => "struct",
            Vars => "vars",
            Data => "data",
            Omni => "omni",
            Asm => "asm",
            Ready => "ready",
            Fence => "fence",
            Switch => "switch",
            Case => "case",
            Default => "default",
            Charmap => "charmap",
            Swap => "swap",
            Sizeof => "sizeof",
            Len => "len",
            True => "true",
            False => "false",
            PpuCtrl => "PPUCTRL",
            PpuMask => "PPUMASK",
            PpuStatus => "PPUSTATUS",
            PpuScroll => "PPUSCROLL",
            PpuAddr => "PPUADDR",
            PpuData => "PPUDATA",
            OamAddr => "OAMADDR",
            OamData => "OAMDATA",
            OamDma => "OAMDMA",
            Colon => ":",
            Hash => "#",
            Backtick => "`",
            DQuote => "\"",
            Quote => "'",
            Semicolon => ";",
            Comma => ",",
            At => "@",
            Period => ".",
            LBrace => "{",
            RBrace => "}",
            LBracket => "[",
            RBracket => "]",
            LParen => "(",
            RParen => ")",
            Asterisk => "*",
            FSlash => "/",
            Plus => "+",
            Minus => "-",
            LShift => "<<",
            RShift => ">>",
            BitwiseAnd => "&",
            BitwiseXor => "^",
            BitwiseOr => "|",
            Tilde => "~",
            Bang => "!",
            Lt => "<",
            Lte => "<=",
            Gt => ">",
            Gte => ">=",
            Eq => "==",
            NotEq => "!=",
            LogicalAnd => "&&",
            LogicalOr => "||",
            Assign => "=",
            PlusAssign => "+=",
            MinusAssign => "-=",
            TimesAssign => "*=",
            DivAssign => "/=",
            BitwiseAndAssign => "&=",
            LogicalAndAssign => "&&=",
            BitwiseOrAssign => "|=",
            LogicalOrAssign => "||=",
            BitwiseXorAssign => "^=",
            LShiftAssign => "<<=",
            RShiftAssign => ">>=",
            TypeVoid => "Void",
            TypeBool => "Bool",
            TypeInt => "Int",
            TypeReal => "Real",
            TypeF => "F",
            TypeFF => "FF",
            TypeFFF => "FFF",
            TypeU => "U",
            TypeUU => "UU",
            TypeUUU => "UUU",
            TypeS => "S",
            TypeSS => "SS",
            TypeSSS => "SSS",
            TypeUF => "UF",
            TypeUUF => "UUF",
            TypeUUUF => "UUUF",
            TypeUFF => "UFF",
            TypeUUFF => "UUFF",
            TypeUUUFF => "UUUFF",
            TypeUFFF => "UFFF",
            TypeUUFFF => "UUFFF",
            TypeUUUFFF => "UUUFFF",
            TypeSF => "SF",
            TypeSSF => "SSF",
            TypeSSSF => "SSSF",
            TypeSFF => "SFF",
            TypeSSFF => "SSFF",
            TypeSSSFF => "SSSFF",
            TypeSFFF => "SFFF",
            TypeSSFFF => "SSFFF",
            TypeSSSFFF => "SSSFFF",
            TypeAA => "AA",
            TypeAAA => "AAA",
            TypePP => "PP",
            TypePPP => "PPP",
            TypeCC => "CC",
            TypeCCC => "CCC",
            TypeMM => "MM",
            TypeMMM => "MMM",
            Ident => "identifier",
            TypeIdent => "type identifier",
            Decimal => "decimal literal",
            Real => "real literal",
            Hex => "hexadecimal literal",
            Binary => "binary literal",
            Character => "character literal",
            StringUncompressed => "string literal",
            StringCompressed => "compressed string literal",
        }
    }
}

impl Display for TokenKind {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_fixed() {
            write!(fmt, "`{}`", self.text())
        } else {
            fmt.write_str(self.text())
        }
    }
}

/// Valor asociado a un token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Sin valor; el lexema, si importa, es el texto de la ubicación.
    None,

    /// Constante entera o de carácter.
    Int(u64),

    /// Constante real en punto fijo, con [`FIXED_FRAC_BITS`] bits fraccionarios.
    Fixed(u64),

    /// Contenido de un literal de texto, con escapes resueltos.
    Text(Vec<u8>),
}

/// Objeto resultante del análisis léxico.
///
/// Un token contiene suficiente información para describir completamente
/// a una entidad léxica en el programa fuente, en conjunto con su ubicación.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub payload: Payload,
}

impl Token {
    fn bare(kind: TokenKind) -> Self {
        Token {
            kind,
            payload: Payload::None,
        }
    }
}

impl Display for Token {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            Payload::None => self.kind.fmt(fmt),
            Payload::Int(value) => write!(fmt, "{} `{}`", self.kind, value),
            Payload::Fixed(value) => write!(
                fmt,
                "{} `{}`",
                self.kind,
                *value as f64 / (1u64 << FIXED_FRAC_BITS) as f64
            ),
            Payload::Text(text) => {
                write!(fmt, "{} {:?}", self.kind, String::from_utf8_lossy(text))
            }
        }
    }
}

/// Iterador de tokens sobre un origen.
///
/// Emite [`TokenKind::Eof`] una única vez al alcanzar el centinela.
pub struct Lexer {
    source: Rc<Source>,
    cursor: usize,
    done: bool,
}

impl Lexer {
    /// Crea un lexer al inicio de un origen.
    pub fn new(source: &Rc<Source>) -> Self {
        Lexer {
            source: Rc::clone(source),
            cursor: 0,
            done: false,
        }
    }

    /// Reduce la entrada a sea una secuencia conocida de tokens
    /// infalibles o una secuencia de errores.
    ///
    /// En caso de que ocurra al menos un error, el lexer dejará
    /// de buscar tokens exitosos y comenzará a acumular solamente
    /// errores. El propósito de esta función es permitir la
    /// recolección de múltiples errores léxicos en una misma ejecución
    /// del compilador.
    pub fn try_exhaustive(mut self) -> Result<Vec<Located<Token>>, Vec<Located<LexerError>>> {
        let mut tokens = Vec::new();

        while let Some(result) = self.next() {
            match result {
                Ok(token) => tokens.push(token),
                Err(error) => {
                    drop(tokens);

                    let mut errors = vec![error];
                    errors.extend(self.filter_map(Result::err));

                    return Err(errors);
                }
            }
        }

        Ok(tokens)
    }

    /// Intenta construir un siguiente token.
    fn lex(&mut self) -> Result<Located<Token>, Located<LexerError>> {
        use TokenKind::*;

        loop {
            let begin = self.cursor;
            let (state, end) = lang::TABLE.scan(self.source.buffer(), begin);
            let location = Location::new(&self.source, begin..end);

            let kind = match TokenKind::from_state(state) {
                // Un NUL dentro del contenido no es el centinela
                Some(Eof) if begin < self.source.content().len() => Error,
                kind => kind.unwrap_or(Error),
            };

            if kind == Error {
                // Se consume exactamente el byte ofensivo
                self.cursor = begin + 1;

                let byte = self.source.buffer().get(begin).copied().unwrap_or(0);
                trace!(offset = begin, byte, "lexical recovery");

                let location = Location::new(&self.source, begin..begin + 1);
                return Err(Located::at(LexerError::BadChar(byte), location));
            }

            self.cursor = end;
            let token = match kind {
                Whitespace | Comment => continue,

                Eof => {
                    self.done = true;
                    Ok(Token::bare(Eof))
                }

                Quote | DQuote | Backtick => return self.quoted(kind, begin, end),

                Decimal => number(location.bytes(), 10),
                Hex => number(&location.bytes()[1..], 16),
                Binary => number(&location.bytes()[1..], 2),
                Real => fixed(location.bytes()),

                _ => Ok(Token::bare(kind)),
            }
            .map_err(|error| Located::at(error, location.clone()))?;

            return Ok(Located::at(token, location));
        }
    }

    /// Completa un literal a partir de su comilla de apertura.
    fn quoted(
        &mut self,
        quote: TokenKind,
        begin: usize,
        body: usize,
    ) -> Result<Located<Token>, Located<LexerError>> {
        let delimiter = self.source.buffer()[begin];
        let literal = match literal::parse_string_literal(&self.source, body, delimiter) {
            Ok(literal) => literal,
            Err(error) => {
                let (location, error) = error.split();
                self.cursor = location.range().end.max(begin + 1);

                return Err(Located::at(error.into(), location));
            }
        };

        self.cursor = literal.end;
        let location = Location::new(&self.source, begin..literal.end);

        let token = match quote {
            TokenKind::Quote => match literal.value[..] {
                [byte] => Token {
                    kind: TokenKind::Character,
                    payload: Payload::Int(byte as u64),
                },

                _ => return Err(Located::at(LexerError::CharLength, location)),
            },

            TokenKind::Backtick => Token {
                kind: TokenKind::StringCompressed,
                payload: Payload::Text(literal.value),
            },

            _ => Token {
                kind: TokenKind::StringUncompressed,
                payload: Payload::Text(literal.value),
            },
        };

        Ok(Located::at(token, location))
    }
}

impl Iterator for Lexer {
    type Item = Result<Located<Token>, Located<LexerError>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            None
        } else {
            Some(self.lex())
        }
    }
}

/// Decodifica una constante entera sin prefijo.
fn number(digits: &[u8], radix: u32) -> Result<Token, LexerError> {
    let value = accumulate(digits, radix)?;
    Ok(Token {
        kind: match radix {
            16 => TokenKind::Hex,
            2 => TokenKind::Binary,
            _ => TokenKind::Decimal,
        },
        payload: Payload::Int(value),
    })
}

/// Decodifica una constante real a punto fijo, truncando.
fn fixed(text: &[u8]) -> Result<Token, LexerError> {
    let (whole, fraction) = match text.iter().position(|&byte| byte == b'.') {
        Some(point) => (&text[..point], &text[point + 1..]),
        None => (text, &[][..]),
    };

    let whole = accumulate(whole, 10)?;
    if whole >= 1 << (64 - FIXED_FRAC_BITS) {
        return Err(LexerError::IntOverflow);
    }

    // Más allá de 18 dígitos la fracción ya no afecta a 24 bits
    let fraction = &fraction[..fraction.len().min(18)];
    let numerator = accumulate(fraction, 10)? as u128;
    let denominator = 10u128.pow(fraction.len() as u32);
    let fraction = ((numerator << FIXED_FRAC_BITS) / denominator) as u64;

    Ok(Token {
        kind: TokenKind::Real,
        payload: Payload::Fixed(whole << FIXED_FRAC_BITS | fraction),
    })
}

fn accumulate(digits: &[u8], radix: u32) -> Result<u64, LexerError> {
    digits.iter().try_fold(0u64, |accumulated, &digit| {
        let digit = (digit as char).to_digit(radix).ok_or(LexerError::IntOverflow)?;
        accumulated
            .checked_mul(radix as u64)
            .and_then(|n| n.checked_add(digit as u64))
            .ok_or(LexerError::IntOverflow)
    })
}

#[cfg(test)]
mod tests;
