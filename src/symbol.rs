//! Tabla de símbolos locales.
//!
//! Durante la construcción de una función, cada nombre local se asocia a
//! un [`SymbolHandle`]. Los ámbitos forman una pila estricta: se abre uno
//! al entrar a un bloque y se cierra al salir. Dentro de un mismo ámbito
//! un nombre no puede redefinirse, pero sí puede ocultar a uno externo;
//! al cerrarse el ámbito interno la definición externa vuelve a ser
//! visible.

use crate::lex::Identifier;
use rustc_hash::FxHashMap;

/// Referencia a un símbolo local de la función en construcción.
///
/// Las variables indexan la lista de variables locales; las constantes y
/// etiquetas de ensamblador comparten el espacio de constantes locales.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SymbolHandle {
    Var(u32),
    Const(u32),
}

impl SymbolHandle {
    /// Codificación entera: `i` para variables, `-(i + 1)` para constantes.
    pub fn encode(self) -> i32 {
        match self {
            SymbolHandle::Var(index) => index as i32,
            SymbolHandle::Const(index) => -(index as i32) - 1,
        }
    }

    /// Inverso de [`SymbolHandle::encode`].
    pub fn decode(handle: i32) -> Self {
        if handle >= 0 {
            SymbolHandle::Var(handle as u32)
        } else {
            SymbolHandle::Const((-(handle + 1)) as u32)
        }
    }
}

/// Pila de ámbitos.
#[derive(Debug, Default)]
pub struct SymbolTable {
    scopes: Vec<FxHashMap<Identifier, SymbolHandle>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Default::default()
    }

    /// Abre un ámbito anidado.
    pub fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    /// Cierra el ámbito más interno, descartando sus definiciones.
    pub fn pop_scope(&mut self) {
        debug_assert!(!self.scopes.is_empty(), "unbalanced scope pop");
        self.scopes.pop();
    }

    /// Define un nombre en el ámbito actual.
    ///
    /// Si el nombre ya existía en este mismo ámbito no se modifica nada
    /// y se retorna la definición existente.
    pub fn new_def(&mut self, handle: SymbolHandle, name: &Identifier) -> Option<SymbolHandle> {
        debug_assert!(!self.scopes.is_empty(), "definition outside of any scope");
        let scope = self.scopes.last_mut()?;
        match scope.get(name) {
            Some(&existing) => Some(existing),
            None => {
                scope.insert(name.clone(), handle);
                None
            }
        }
    }

    /// Busca la definición visible de un nombre.
    pub fn find(&self, name: &Identifier) -> Option<SymbolHandle> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    /// Cantidad de ámbitos abiertos.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> Identifier {
        Identifier::new(name)
    }

    #[test]
    fn handle_encoding() {
        assert_eq!(SymbolHandle::Var(0).encode(), 0);
        assert_eq!(SymbolHandle::Var(7).encode(), 7);
        assert_eq!(SymbolHandle::Const(0).encode(), -1);
        assert_eq!(SymbolHandle::Const(4).encode(), -5);

        for handle in [-9, -1, 0, 3] {
            assert_eq!(SymbolHandle::decode(handle).encode(), handle);
        }
    }

    #[test]
    fn redefinition_in_same_scope() {
        let mut table = SymbolTable::new();
        table.push_scope();

        assert_eq!(table.new_def(SymbolHandle::Var(0), &id("x")), None);
        assert_eq!(
            table.new_def(SymbolHandle::Var(1), &id("x")),
            Some(SymbolHandle::Var(0))
        );
        assert_eq!(table.find(&id("x")), Some(SymbolHandle::Var(0)));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "definition outside of any scope")]
    fn definition_needs_a_scope() {
        let mut table = SymbolTable::new();
        table.new_def(SymbolHandle::Var(0), &id("x"));
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn definition_without_scope_opens_none() {
        let mut table = SymbolTable::new();

        assert_eq!(table.new_def(SymbolHandle::Var(0), &id("x")), None);
        assert_eq!(table.depth(), 0);
        assert_eq!(table.find(&id("x")), None);
    }

    #[test]
    fn shadowing_is_scoped() {
        let mut table = SymbolTable::new();
        table.push_scope();
        table.new_def(SymbolHandle::Var(0), &id("x"));

        table.push_scope();
        assert_eq!(table.new_def(SymbolHandle::Const(0), &id("x")), None);
        assert_eq!(table.find(&id("x")), Some(SymbolHandle::Const(0)));

        table.pop_scope();
        assert_eq!(table.find(&id("x")), Some(SymbolHandle::Var(0)));

        table.pop_scope();
        assert!(table.is_empty());
        assert_eq!(table.find(&id("x")), None);
    }
}
