//! Reporte de errores ubicados.
//!
//! Todo error que el front end reporta al usuario está asociado a un
//! rango en el código fuente. Algunos errores estructurales además
//! hacen referencia a otros puntos del programa, por ejemplo a una
//! definición previa en conflicto; estas referencias se modelan como
//! notas que acompañan al error principal.

use crate::source::{Located, Location};
use std::{
    error::Error,
    fmt::{self, Debug, Display},
};

mod sealed {
    pub trait Sealed {}
}

/// Un error con ubicación y notas opcionales.
pub trait LocatedError: sealed::Sealed {
    fn source(&self) -> &dyn Error;
    fn location(&self) -> &Location;

    fn notes(&self) -> &[Note] {
        &[]
    }
}

/// Referencia cruzada que acompaña a un error.
#[derive(Debug, Clone)]
pub struct Note {
    location: Option<Location>,
    message: String,
}

impl Note {
    /// Ubicación referenciada, si la hay.
    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    /// Texto de la nota.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Un error ubicado junto a cero o más notas.
#[derive(Debug, Clone)]
pub struct Annotated<E> {
    error: Located<E>,
    notes: Vec<Note>,
}

impl<E> Annotated<E> {
    /// Construye sin notas.
    pub fn new(error: Located<E>) -> Self {
        Annotated {
            error,
            notes: Vec::new(),
        }
    }

    /// Agrega una nota ubicada.
    pub fn note<S: Into<String>>(mut self, location: Location, message: S) -> Self {
        self.notes.push(Note {
            location: Some(location),
            message: message.into(),
        });

        self
    }

    /// Agrega una nota sin ubicación.
    pub fn hint<S: Into<String>>(mut self, message: S) -> Self {
        self.notes.push(Note {
            location: None,
            message: message.into(),
        });

        self
    }

    /// Error principal.
    pub fn error(&self) -> &Located<E> {
        &self.error
    }

    /// Valor del error principal.
    pub fn kind(&self) -> &E {
        self.error.val()
    }

    /// Notas adjuntas.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }
}

impl<E> From<Located<E>> for Annotated<E> {
    fn from(error: Located<E>) -> Self {
        Annotated::new(error)
    }
}

impl<E: Display> Display for Annotated<E> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{}: {}", self.error.location(), self.error.val())?;
        for note in &self.notes {
            match &note.location {
                Some(location) => write!(fmt, "; {}: {}", location, note.message)?,
                None => write!(fmt, "; {}", note.message)?,
            }
        }

        Ok(())
    }
}

/// Conjunto de errores listo para presentarse al usuario.
pub struct Diagnostics {
    kind: &'static str,
    errors: Vec<Box<dyn 'static + LocatedError>>,
}

impl Diagnostics {
    pub fn kind(self, kind: &'static str) -> Self {
        Diagnostics { kind, ..self }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Diagnostics {
            kind: "error",
            errors: Default::default(),
        }
    }
}

impl<E: 'static + LocatedError> From<E> for Diagnostics {
    fn from(error: E) -> Self {
        Diagnostics {
            errors: vec![Box::new(error)],
            ..Default::default()
        }
    }
}

impl<E: 'static + LocatedError> From<Vec<E>> for Diagnostics {
    fn from(errors: Vec<E>) -> Self {
        let errors = errors
            .into_iter()
            .map(|error| {
                let errors: Box<dyn LocatedError> = Box::new(error);
                errors
            })
            .collect();

        Diagnostics {
            errors,
            ..Default::default()
        }
    }
}

impl Debug for Diagnostics {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        <Self as Display>::fmt(self, fmt)
    }
}

impl Display for Diagnostics {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Diagnostics { kind, errors } = self;

        if errors.is_empty() {
            return writeln!(fmt, "No errors were reported");
        }

        for error in errors {
            writeln!(fmt, "{}: {}", kind, error.source())?;
            snippet(fmt, error.location())?;

            for note in error.notes() {
                writeln!(fmt, "note: {}", note.message)?;
                if let Some(location) = &note.location {
                    snippet(fmt, location)?;
                }
            }

            writeln!(fmt)?;
        }

        let error_or_errors = if errors.len() == 1 { "error" } else { "errors" };
        writeln!(
            fmt,
            "Build failed with {} {}",
            errors.len(),
            error_or_errors
        )
    }
}

/// Muestra las líneas cubiertas por una ubicación y subraya el rango.
fn snippet(fmt: &mut fmt::Formatter<'_>, location: &Location) -> fmt::Result {
    writeln!(fmt, " --> {}", location)?;

    let (start, last) = (location.start(), location.last());
    let digits = last.line().to_string().chars().count();
    writeln!(fmt, "{:digits$} |", "", digits = digits)?;

    for line_number in start.line()..=last.line() {
        location.source().with_line(line_number, |line| {
            writeln!(fmt, "{:>digits$} | {}", line_number, line, digits = digits)
        })?
    }

    let (from, to) = (start.column(), last.column());
    let min = from.min(to);
    let max = from.max(to);

    let skip = (min - 1) as usize;
    let highlight = (max - min + 1) as usize;

    writeln!(
        fmt,
        "{:digits$} | {:skip$}{:^<highlight$}",
        "",
        "",
        "",
        digits = digits,
        skip = skip,
        highlight = highlight
    )
}

impl<E: Error> sealed::Sealed for Located<E> {}

impl<E: Error> LocatedError for Located<E> {
    fn source(&self) -> &dyn Error {
        self.as_ref()
    }

    fn location(&self) -> &Location {
        Located::location(self)
    }
}

impl<E: Error> sealed::Sealed for Annotated<E> {}

impl<E: Error> LocatedError for Annotated<E> {
    fn source(&self) -> &dyn Error {
        self.error.as_ref()
    }

    fn location(&self) -> &Location {
        self.error.location()
    }

    fn notes(&self) -> &[Note] {
        &self.notes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Source;
    use thiserror::Error;

    #[derive(Error, Debug)]
    #[error("Identifier x already in use.")]
    struct Clash;

    #[test]
    fn renders_error_with_notes() {
        let source = Source::new("a.fab", "U x\nU x\n");
        let error = Annotated::new(Located::at(Clash, Location::new(&source, 6..7)))
            .note(Location::new(&source, 2..3), "Previous definition here:")
            .hint("Rename one.");

        let rendered = Diagnostics::from(error).to_string();

        assert!(rendered.starts_with("error: Identifier x already in use.\n --> a.fab:2:3\n"));
        assert!(rendered.contains("2 | U x\n  |   ^\n"));
        assert!(rendered.contains("note: Previous definition here:\n --> a.fab:1:3\n"));
        assert!(rendered.contains("note: Rename one.\n"));
        assert!(rendered.ends_with("Build failed with 1 error\n"));
    }

    #[test]
    fn empty_span_gets_one_caret() {
        let source = Source::new("a.fab", "ab");
        let rendered = Diagnostics::from(Located::at(Clash, Location::new(&source, 2..2)))
            .kind("Lexical error")
            .to_string();

        assert!(rendered.contains("1 | ab\n  |   ^\n"));
        assert!(rendered.starts_with("Lexical error: "));
    }
}
