//! Front end de un compilador para consolas de 8 bits.
//!
//! # Análisis léxico
//! Cada programa deriva de archivos de código fuente, cargados en
//! [`source`]. El análisis léxico en [`lex`] recorre cada archivo con una
//! tabla de estados generada de antemano, descrita en [`scan`], y produce
//! un flujo de tokens ubicados. Un byte no reconocido se reporta y se
//! omite, de modo que un error léxico nunca detiene el resto del archivo.
//!
//! # Macros
//! Las macros son plantillas de texto con parámetros posicionales. Su
//! expansión, en [`expand`], utiliza una segunda tabla de estados y
//! produce texto que vuelve a someterse a análisis léxico.
//!
//! # Primera pasada
//! A partir de declaraciones y expresiones ya analizadas sintácticamente,
//! [`pass1`] construye por cada función una secuencia plana de sentencias
//! descrita en [`ir`], con los saltos de control de flujo resueltos como
//! índices. Los símbolos locales se rastrean en [`symbol`] y los
//! modificadores de cada construcción se validan en [`mods`]. Los cuerpos
//! en ensamblador se verifican contra la matriz de opcodes de [`asm`].
//!
//! Los errores de todas las fases se presentan mediante [`error`].

#[macro_use]
mod macros;

pub mod asm;
pub mod error;
pub mod expand;
pub mod ir;
pub mod lex;
pub mod literal;
pub mod mods;
pub mod pass1;
pub mod scan;
pub mod source;
pub mod symbol;
