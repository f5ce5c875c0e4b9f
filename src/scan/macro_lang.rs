//! Tablas de escaneo del lenguaje de macros.
//!
//! Generadas fuera de línea; no se editan a mano. Los terminales
//! coinciden con los discriminantes de [`MacroToken`].

use super::ScanTable;
use crate::expand::MacroToken;

pub const LAST_STATE: u16 = 11;
pub const START: u16 = 19;
const STATES: usize = 49;
const CLASSES: usize = 14;

/// Tabla del lenguaje de macros.
pub static TABLE: ScanTable = ScanTable {
    equivalence_classes: &EQUIVALENCE_CLASSES,
    transitions: &TRANSITIONS,
    class_count: CLASSES,
    last_state: LAST_STATE,
    start: START,
};

/// Tipo de token asociado a cada estado terminal.
pub static TERMINALS: [MacroToken; LAST_STATE as usize + 1] = [
    MacroToken::Error,
    MacroToken::Eof,
    MacroToken::Backtick,
    MacroToken::DQuote,
    MacroToken::Quote,
    MacroToken::LineComment,
    MacroToken::BlockComment,
    MacroToken::Param,
    MacroToken::DQuoteParam,
    MacroToken::QuoteParam,
    MacroToken::BacktickParam,
    MacroToken::ParamDecl,
];

#[rustfmt::skip]
static EQUIVALENCE_CLASSES: [u8; 256] = [
    0, 1, 1, 1, 1, 1, 1, 1, 1, 1, 2, 1, 1, 3, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 4, 5, 1, 1, 1, 6, 1, 1, 7, 1, 1, 1, 1, 8,
    9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 10, 1, 1, 1, 1, 1,
    1, 11, 11, 11, 11, 11, 11, 11, 11, 11, 11, 11, 11, 11, 11, 11,
    11, 11, 11, 11, 11, 11, 11, 11, 11, 11, 11, 1, 1, 1, 1, 9,
    12, 13, 13, 13, 13, 13, 13, 13, 13, 13, 13, 13, 13, 13, 13, 13,
    13, 13, 13, 13, 13, 13, 13, 13, 13, 13, 13, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
];

#[rustfmt::skip]
static TRANSITIONS: [u16; STATES * CLASSES] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 13, 0, 0, 0, 12, 0, 0, 0, 12,
    7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7,
    2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2,
    48, 15, 45, 31, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15,
    0, 0, 0, 0, 0, 13, 0, 0, 0, 16, 0, 16, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 17, 0, 17, 30, 0,
    0, 0, 0, 0, 0, 0, 0, 25, 15, 0, 0, 0, 0, 0,
    26, 0, 0, 0, 27, 28, 24, 0, 18, 0, 0, 0, 14, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 41, 0, 42,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 37, 0, 38,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 33, 0, 34,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 17, 0, 29,
    4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4,
    25, 25, 25, 25, 25, 25, 25, 46, 25, 25, 25, 25, 25, 25,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3,
    0, 0, 0, 0, 20, 0, 21, 0, 0, 0, 22, 16, 23, 12,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 29, 0, 0, 30, 29,
    0, 0, 0, 0, 0, 32, 0, 0, 0, 0, 0, 0, 0, 0,
    5, 5, 48, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5,
    10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 33, 35, 33, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 34, 35, 0, 0, 34,
    0, 0, 0, 0, 0, 36, 0, 0, 0, 0, 0, 0, 0, 0,
    11, 11, 11, 11, 11, 11, 11, 11, 11, 11, 11, 11, 11, 11,
    0, 0, 0, 0, 0, 0, 39, 0, 0, 37, 0, 37, 0, 0,
    0, 0, 0, 0, 0, 0, 39, 0, 0, 38, 0, 0, 0, 38,
    0, 0, 0, 0, 0, 40, 0, 0, 0, 0, 0, 0, 0, 0,
    9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9,
    0, 0, 0, 0, 43, 0, 0, 0, 0, 41, 0, 41, 0, 0,
    0, 0, 0, 0, 43, 0, 0, 0, 0, 42, 0, 0, 0, 42,
    0, 0, 0, 0, 0, 44, 0, 0, 0, 0, 0, 0, 0, 0,
    8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8,
    5, 5, 5, 48, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5,
    25, 25, 25, 25, 25, 25, 25, 25, 47, 25, 25, 25, 25, 25,
    6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6,
    5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5,
];
