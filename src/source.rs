//! Rastreo de ubicaciones originales en código fuente.
//!
//! Los distintos objetos internos que el front end construye
//! deben llevar cuenta de rangos de bytes en el código fuente
//! original, lo cual permite determinar un punto exacto o
//! aproximado en donde ocurre un error de abstracción arbitraria.
//!
//! Cada archivo se carga completo en un [`Source`], cuyo buffer
//! siempre termina en un byte NUL. Las tablas de escaneo dependen
//! de ese centinela para detenerse sin comparar contra la longitud.

use std::{
    borrow::Cow,
    fmt::{self, Debug, Display, Formatter},
    fs, io,
    ops::Range,
    path::Path,
    rc::Rc,
};

/// Ancho de los divisores de tabulador.
const TAB_STOP: u32 = 4;

/// Un objeto cualquiera con una posición original asociada.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located<T> {
    location: Location,
    value: T,
}

impl<T> Located<T> {
    /// Obtiene el valor.
    pub fn val(&self) -> &T {
        &self.value
    }

    /// Obtiene la ubicación.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Descarta la ubicación y toma ownership del valor.
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Descompone y toma ownership de las dos partes.
    pub fn split(self) -> (Location, T) {
        (self.location, self.value)
    }

    /// Construye a partir de un valor y una ubicación.
    pub fn at(value: T, location: Location) -> Self {
        Located { value, location }
    }

    /// Transforma el valor con la misma ubicación.
    pub fn map<U, F>(self, map: F) -> Located<U>
    where
        F: FnOnce(T) -> U,
    {
        Located {
            value: map(self.value),
            location: self.location,
        }
    }
}

impl<T> AsRef<T> for Located<T> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}

/// Una ubicación está conformada por un origen y un rango de bytes.
#[derive(Clone)]
pub struct Location {
    from: Rc<Source>,
    span: Range<usize>,
}

impl Location {
    /// Construye una ubicación dentro de un origen.
    pub fn new(from: &Rc<Source>, span: Range<usize>) -> Self {
        Location {
            from: Rc::clone(from),
            span,
        }
    }

    /// Unifica un rango de ubicaciones. Se asume el mismo origen.
    pub fn span(from: Location, to: &Location) -> Self {
        Location {
            from: from.from,
            span: from.span.start..to.span.end,
        }
    }

    /// Origen de la ubicación.
    pub fn source(&self) -> &Source {
        &self.from
    }

    /// Origen compartido de la ubicación.
    pub fn source_rc(&self) -> &Rc<Source> {
        &self.from
    }

    /// Rango de bytes.
    pub fn range(&self) -> Range<usize> {
        self.span.clone()
    }

    /// Obtiene la posición de inicio.
    pub fn start(&self) -> Position {
        self.from.position(self.span.start)
    }

    /// Obtiene la posición de fin (exclusiva).
    pub fn end(&self) -> Position {
        self.from.position(self.span.end)
    }

    /// Posición del último byte incluido.
    pub fn last(&self) -> Position {
        self.from.position(self.span.end.max(self.span.start + 1) - 1)
    }

    /// Bytes originales cubiertos por la ubicación.
    pub fn bytes(&self) -> &[u8] {
        self.from.slice(self.span.clone())
    }

    /// Texto original cubierto por la ubicación.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.bytes())
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.from, &other.from) && self.span == other.span
    }
}

impl Eq for Location {}

impl Display for Location {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:", self.from.name)?;

        let (start, last) = (self.start(), self.last());
        if self.span.len() <= 1 || start == last {
            // Solo se señala una columna en específico
            write!(formatter, "{}", start)
        } else {
            write!(formatter, "[{}-{}]", start, last)
        }
    }
}

impl Debug for Location {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        <Self as Display>::fmt(self, formatter)
    }
}

/// Una posición línea-columna en un archivo.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Position {
    line: u32,
    column: u32,
}

impl Position {
    /// Obtiene el número de línea.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Obtiene el número de columna.
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Incrementa el número de columna.
    pub fn advance(self) -> Position {
        Position {
            line: self.line,
            column: self.column + 1,
        }
    }

    /// Incrementa el número de línea y retorna a la columna 1.
    pub fn newline(self) -> Position {
        Position {
            line: self.line + 1,
            column: 1,
        }
    }

    /// Ajusta la posición a la siguiente columna de tabulador.
    pub fn tab(self) -> Position {
        let column = 1 + ((self.column - 1) / TAB_STOP + 1) * TAB_STOP;
        Position {
            line: self.line,
            column,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position { line: 1, column: 1 }
    }
}

impl Display for Position {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.line, self.column)
    }
}

/// Nombre de origen y contenido completo de un archivo.
pub struct Source {
    name: String,
    text: Vec<u8>,
    line_starts: Vec<usize>,
}

impl Source {
    /// Construye un origen a partir de su contenido.
    ///
    /// Se agrega el centinela NUL al final del buffer.
    pub fn new<S, T>(name: S, text: T) -> Rc<Self>
    where
        S: Into<String>,
        T: Into<Vec<u8>>,
    {
        let mut text = text.into();
        text.push(0);

        let line_starts = std::iter::once(0)
            .chain(
                text.iter()
                    .enumerate()
                    .filter(|&(_, &byte)| byte == b'\n')
                    .map(|(offset, _)| offset + 1),
            )
            .collect();

        Rc::new(Source {
            name: name.into(),
            text,
            line_starts,
        })
    }

    /// Lee un archivo completo.
    pub fn load(path: &Path) -> io::Result<Rc<Self>> {
        let text = fs::read(path)?;
        Ok(Source::new(path.display().to_string(), text))
    }

    /// Nombre del origen.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Buffer completo, incluyendo el centinela final.
    pub fn buffer(&self) -> &[u8] {
        &self.text
    }

    /// Contenido sin el centinela.
    pub fn content(&self) -> &[u8] {
        &self.text[..self.text.len() - 1]
    }

    /// Subrango del contenido, recortado a los límites válidos.
    pub fn slice(&self, span: Range<usize>) -> &[u8] {
        let content = self.content();
        let end = span.end.min(content.len());
        let start = span.start.min(end);

        &content[start..end]
    }

    /// Calcula la posición línea-columna de un desplazamiento en bytes.
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.content().len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };

        let start = self.line_starts[line];
        let position = Position {
            line: line as u32 + 1,
            column: 1,
        };

        self.text[start..offset]
            .iter()
            .fold(position, |position, &byte| match byte {
                b'\t' => position.tab(),
                _ => position.advance(),
            })
    }

    /// Invoca a `callback` con el texto de una línea, sin su terminador.
    pub fn with_line<F, R>(&self, line: u32, callback: F) -> R
    where
        F: FnOnce(&str) -> R,
    {
        let index = (line as usize).saturating_sub(1);
        let start = self
            .line_starts
            .get(index)
            .copied()
            .unwrap_or(self.content().len());

        let end = self
            .line_starts
            .get(index + 1)
            .copied()
            .unwrap_or(self.content().len());

        let bytes = self.slice(start..end);
        let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
        let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);

        callback(&String::from_utf8_lossy(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn buffer_is_nul_terminated() {
        let source = Source::new("a.fab", "ab");
        assert_eq!(source.buffer(), b"ab\0");
        assert_eq!(source.content(), b"ab");
    }

    #[test]
    fn positions_follow_lines_and_tabs() {
        let source = Source::new("a.fab", "ab\n\tc\r\nd");

        assert_eq!(source.position(0), Position { line: 1, column: 1 });
        assert_eq!(source.position(1), Position { line: 1, column: 2 });
        assert_eq!(source.position(3), Position { line: 2, column: 1 });
        assert_eq!(source.position(4), Position { line: 2, column: 5 });
        assert_eq!(source.position(7), Position { line: 3, column: 1 });
    }

    #[test]
    fn lines_are_stripped() {
        let source = Source::new("a.fab", "first\r\nsecond");
        assert_eq!(source.with_line(1, str::to_owned), "first");
        assert_eq!(source.with_line(2, str::to_owned), "second");
        assert_eq!(source.with_line(9, str::to_owned), "");
    }

    #[test]
    fn location_display() {
        let source = Source::new("a.fab", "let x\nfoo");
        assert_eq!(Location::new(&source, 4..5).to_string(), "a.fab:1:5");
        assert_eq!(Location::new(&source, 6..9).to_string(), "a.fab:[2:1-2:3]");
        assert_eq!(Location::new(&source, 9..9).to_string(), "a.fab:2:4");
        assert_eq!(Location::new(&source, 6..9).text(), "foo");
    }
}
