//! Representación intermedia de cuerpos de función.
//!
//! El cuerpo de una función no se representa como un árbol, sino como
//! una secuencia plana de sentencias. Cada construcción de control de
//! flujo emite marcadores de inicio y fin cuyos campos `link` indexan la
//! misma secuencia, de modo que una etapa posterior puede recorrerla
//! linealmente con saltos en tiempo constante.
//!
//! Las expresiones son opacas para este módulo: se almacenan en una
//! arena propia de la función y se referencian por [`ExprHandle`].

use crate::{
    asm::{AddrMode, Mnemonic},
    lex::Identifier,
    mods::Mods,
    source::{Located, Location},
    symbol::SymbolHandle,
};

use std::ops::{Index, IndexMut};

/// Índice de una sentencia dentro de [`FnDef::stmts`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StmtHandle(pub u32);

impl StmtHandle {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// La sentencia inmediatamente posterior.
    pub fn next(self) -> StmtHandle {
        StmtHandle(self.0 + 1)
    }
}

/// Índice de un bloque de modificadores de sentencia.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModsHandle(pub u32);

/// Índice de una expresión en la arena de la función.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExprHandle(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StmtKind {
    If,
    Else,
    EndIf,
    While,
    EndWhile,
    DoWhile,
    EndDoWhile,
    For,
    ForEffect,
    EndFor,
    DoFor,
    EndDoFor,
    Return,
    Break,
    Continue,
    Switch,
    EndSwitch,
    Case,
    Default,
    Label { use_count: u32 },
    Goto,
    GotoMode,
    Nmi,
    Irq,
    Fence,
    Expr,

    /// Declaración de la variable local con el índice dado.
    VarInit(u32),

    SwapFirst,
    SwapSecond,

    /// Cuerpo completo de una función en ensamblador, ver [`FnDef::asm`].
    Asm,

    EndFn,
}

impl StmtKind {
    /// Determina si la sentencia debe tener `link` al cerrar la función.
    pub fn needs_link(self) -> bool {
        use StmtKind::*;

        matches!(
            self,
            If | Else
                | EndIf
                | While
                | EndWhile
                | DoWhile
                | EndDoWhile
                | For
                | ForEffect
                | EndFor
                | DoFor
                | EndDoFor
                | Break
                | Continue
                | Switch
                | Case
                | Default
                | Goto
        )
    }
}

/// Una sentencia de la secuencia plana.
#[derive(Clone, Debug)]
pub struct Stmt {
    pub kind: StmtKind,
    pub mods: Option<ModsHandle>,
    pub link: Option<StmtHandle>,
    pub location: Location,
    pub expr: Option<ExprHandle>,
}

impl Stmt {
    pub fn new(kind: StmtKind, location: Location) -> Self {
        Stmt {
            kind,
            mods: None,
            link: None,
            location,
            expr: None,
        }
    }

    pub fn with_mods(self, mods: Option<ModsHandle>) -> Self {
        Stmt { mods, ..self }
    }

    pub fn with_link(self, link: StmtHandle) -> Self {
        Stmt {
            link: Some(link),
            ..self
        }
    }

    pub fn with_expr(self, expr: Option<ExprHandle>) -> Self {
        Stmt { expr, ..self }
    }
}

/// Nombre y tipo de una variable, parámetro o constante.
#[derive(Clone, Debug)]
pub struct VarDecl<T> {
    pub name: Located<Identifier>,
    pub ty: T,
}

#[derive(Clone, Debug)]
pub struct LocalVar<T> {
    pub decl: VarDecl<T>,
    pub mods: Option<ModsHandle>,
}

/// Constante local o etiqueta de ensamblador.
///
/// Las etiquetas no tienen expresión: su valor es su propia dirección.
#[derive(Clone, Debug)]
pub struct LocalConst<T> {
    pub decl: VarDecl<T>,
    pub mods: Option<ModsHandle>,
    pub expr: Option<ExprHandle>,
}

/// Forma de transferencia de control dentro de un bloque de ensamblador.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AsmCall {
    Call,
    Goto,
    GotoMode,
}

/// Elemento de un cuerpo en ensamblador.
#[derive(Clone, Debug)]
pub enum AsmItem {
    Label {
        location: Location,
        index: u32,
        mods: Option<ModsHandle>,
    },

    Op {
        location: Location,
        mnemonic: Mnemonic,
        mode: AddrMode,
        opcode: u8,
        operand: Option<ExprHandle>,
    },

    Call {
        location: Location,
        kind: AsmCall,
        target: ExprHandle,
        mods: Option<ModsHandle>,
    },

    WaitNmi {
        location: Location,
        mods: Option<ModsHandle>,
    },
}

/// Definición completa de una función.
#[derive(Debug)]
pub struct FnDef<T, E> {
    pub stmts: Vec<Stmt>,
    pub exprs: Vec<E>,
    pub mods: Vec<Mods>,
    pub local_vars: Vec<LocalVar<T>>,
    pub local_consts: Vec<LocalConst<T>>,
    pub name_hashes: Vec<u64>,
    pub num_params: u32,
    pub return_type: Option<T>,
    pub default_label: Option<u32>,
    pub asm: Vec<AsmItem>,
}

impl<T, E> Default for FnDef<T, E> {
    fn default() -> Self {
        FnDef {
            stmts: Vec::new(),
            exprs: Vec::new(),
            mods: Vec::new(),
            local_vars: Vec::new(),
            local_consts: Vec::new(),
            name_hashes: Vec::new(),
            num_params: 0,
            return_type: None,
            default_label: None,
            asm: Vec::new(),
        }
    }
}

impl<T, E> FnDef<T, E> {
    /// Agrega una sentencia y retorna su índice.
    pub fn push_stmt(&mut self, stmt: Stmt) -> StmtHandle {
        let handle = StmtHandle(self.stmts.len() as u32);
        self.stmts.push(stmt);
        handle
    }

    pub fn push_expr(&mut self, expr: E) -> ExprHandle {
        let handle = ExprHandle(self.exprs.len() as u32);
        self.exprs.push(expr);
        handle
    }

    pub fn push_mods(&mut self, mods: Option<Mods>) -> Option<ModsHandle> {
        mods.map(|mods| {
            let handle = ModsHandle(self.mods.len() as u32);
            self.mods.push(mods);
            handle
        })
    }

    /// Índice que recibirá la próxima sentencia.
    pub fn next_stmt(&self) -> StmtHandle {
        StmtHandle(self.stmts.len() as u32)
    }

    pub fn expr(&self, handle: ExprHandle) -> &E {
        &self.exprs[handle.0 as usize]
    }

    pub fn expr_mut(&mut self, handle: ExprHandle) -> &mut E {
        &mut self.exprs[handle.0 as usize]
    }

    pub fn mods(&self, handle: ModsHandle) -> &Mods {
        &self.mods[handle.0 as usize]
    }

    /// Declaración a la que refiere un símbolo local.
    pub fn var_decl(&self, handle: SymbolHandle) -> &VarDecl<T> {
        match handle {
            SymbolHandle::Var(index) => &self.local_vars[index as usize].decl,
            SymbolHandle::Const(index) => &self.local_consts[index as usize].decl,
        }
    }

    /// Primera sentencia que requiere `link` y no lo tiene o apunta
    /// fuera de la secuencia.
    pub fn first_unlinked(&self) -> Option<StmtHandle> {
        let len = self.stmts.len();
        self.stmts
            .iter()
            .position(|stmt| {
                stmt.kind.needs_link()
                    && stmt.link.map_or(true, |link| link.index() >= len)
            })
            .map(|index| StmtHandle(index as u32))
    }
}

impl<T, E> Index<StmtHandle> for FnDef<T, E> {
    type Output = Stmt;

    fn index(&self, handle: StmtHandle) -> &Stmt {
        &self.stmts[handle.index()]
    }
}

impl<T, E> IndexMut<StmtHandle> for FnDef<T, E> {
    fn index_mut(&mut self, handle: StmtHandle) -> &mut Stmt {
        &mut self.stmts[handle.index()]
    }
}

/// Campo de una estructura.
#[derive(Clone, Debug)]
pub struct Field<T> {
    pub decl: VarDecl<T>,
    pub hash: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Source;

    #[test]
    fn links_are_checked() {
        let source = Source::new("ir.fab", "if x");
        let at = Location::new(&source, 0..2);

        let mut def: FnDef<(), ()> = FnDef::default();
        let begin = def.push_stmt(Stmt::new(StmtKind::If, at.clone()));
        let end = def.push_stmt(Stmt::new(StmtKind::EndIf, at.clone()).with_link(begin));
        assert_eq!(def.first_unlinked(), Some(begin));

        def[begin].link = Some(end.next());
        assert_eq!(def.first_unlinked(), Some(begin));

        def.push_stmt(Stmt::new(StmtKind::EndFn, at));
        assert_eq!(def.first_unlinked(), None);
    }

    #[test]
    fn arenas() {
        let mut def: FnDef<(), &str> = FnDef::default();
        let expr = def.push_expr("x + 1");
        assert_eq!(*def.expr(expr), "x + 1");
        assert_eq!(def.push_mods(None), None);
        assert_eq!(def.next_stmt(), StmtHandle(0));
    }
}
