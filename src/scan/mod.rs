//! Motor de escaneo dirigido por tablas.
//!
//! # Tablas
//! Cada lenguaje (el principal y el de macros) se describe por medio de
//! un autómata finito determinista comprimido. Los bytes de entrada se
//! agrupan primero en clases de equivalencia: dos bytes en la misma clase
//! provocan exactamente las mismas transiciones desde cualquier estado, de
//! modo que la tabla de transiciones se indexa por `estado * clases + clase`
//! en vez de por `estado * 256 + byte`. La compresión no altera el lenguaje
//! reconocido.
//!
//! # Estados
//! Los estados `0..=last_state` son terminales y corresponden a un tipo de
//! token; `0` se reserva para "ningún token válido". Los estados mayores a
//! `last_state` son transitorios y el escaneo continúa a partir de ellos.
//! Todo escaneo comienza en `start`.
//!
//! # Munch máximo
//! Las tablas se construyen de forma que un estado que ya reconoce un token
//! transiciona al terminal de ese token al ver un byte que no puede
//! extenderlo. El escáner consume ese byte de más y luego retrocede una
//! posición, por lo cual nunca requiere backtracking.

pub mod lang;
pub mod macro_lang;

#[cfg(test)]
mod tests;

/// Tabla de escaneo estática.
pub struct ScanTable {
    /// Clase de equivalencia de cada byte.
    pub equivalence_classes: &'static [u8; 256],

    /// Transiciones aplanadas, `class_count` entradas por estado.
    pub transitions: &'static [u16],

    /// Cantidad de clases de equivalencia.
    pub class_count: usize,

    /// Último estado terminal.
    pub last_state: u16,

    /// Estado inicial.
    pub start: u16,
}

impl ScanTable {
    /// Estado terminal reservado para secuencias no reconocidas.
    pub const ERROR: u16 = 0;

    /// Escanea un token a partir de `cursor`.
    ///
    /// Retorna el estado alcanzado y la posición del primer byte que no
    /// pertenece al token. El estado es terminal salvo cuando el escaneo se
    /// detiene en el centinela dentro de un estado transitorio. Cualquier
    /// posición fuera de `input` se lee como el centinela `0`, de modo que el
    /// escaneo se detiene al final del buffer aunque el mismo no termine en
    /// NUL. Si el resultado es
    /// [`ScanTable::ERROR`], el llamador debe avanzar exactamente un byte a
    /// partir de `cursor` para garantizar progreso.
    pub fn scan(&self, input: &[u8], mut cursor: usize) -> (u16, usize) {
        let mut state = self.start;

        loop {
            let byte = input.get(cursor).copied().unwrap_or(0);
            let class = self.equivalence_classes[byte as usize] as usize;

            state = self.transitions[state as usize * self.class_count + class];
            cursor += 1;

            if byte == 0 || self.is_terminal(state) {
                break;
            }
        }

        (state, cursor - 1)
    }

    /// Determina si un estado es terminal.
    pub fn is_terminal(&self, state: u16) -> bool {
        state <= self.last_state
    }
}
