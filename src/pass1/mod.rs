//! Construcción del grafo de sentencias.
//!
//! Esta es la primera pasada sobre declaraciones ya analizadas
//! sintácticamente. Un [`Pass1`] representa la sesión de un archivo y es
//! el punto de entrada a cada definición global: funciones mediante
//! [`FnBuilder`], estructuras mediante [`StructBuilder`], y variables y
//! constantes globales directamente.
//!
//! Todo el estado mutable de una función en construcción (tabla de
//! símbolos, mapa de etiquetas, saltos pendientes, pilas de `break`,
//! `continue` y `switch`) pertenece al [`FnBuilder`] correspondiente. Si
//! cualquier operación falla, quien invoca debe descartar el builder; no
//! existe forma de observar una secuencia parcial.
//!
//! Los tipos, las expresiones y los globales son opacos para esta pasada.
//! Se obtienen y registran a través de un [`Registry`].

use crate::{
    asm::{AddrMode, Mnemonic},
    error::Annotated,
    expand::{self, MacroError},
    ir::{FnDef, LocalConst, LocalVar, StmtHandle, VarDecl},
    lex::Identifier,
    mods::{ModFlags, ModLists, Mods, ModsError},
    source::{Located, Location, Source},
    symbol::{SymbolHandle, SymbolTable},
};

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::{
    fmt::{self, Display},
    rc::Rc,
};

use thiserror::Error;
use tracing::debug;

mod asm;
mod flow;
mod structs;

pub use asm::MAX_ASM_LOCAL_VARS;
pub use flow::{ElseFrame, ForFrame, ForInit, IfFrame, WhileFrame};
pub use structs::{fnv1a, DefinedStruct, StructBuilder};

#[cfg(test)]
mod tests;

/// Clase de dependencia que una referencia introduce.
///
/// Una dependencia de tipo debe resolverse antes de conocer la forma
/// de quien la usa; una dependencia de valor solo importa al generar
/// código.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IdepClass {
    Type,
    Value,
}

/// Colaboradores externos de la pasada.
pub trait Registry {
    type Global;
    type Type: Clone;
    type Expr;

    /// Obtiene o crea el global con el nombre dado.
    fn lookup_global(&mut self, name: &Located<Identifier>) -> Self::Global;

    /// Registra que la definición actual depende de un tipo.
    fn uses_type(&mut self, ty: &Self::Type, class: IdepClass);

    /// Tipo de una función con los parámetros y retorno dados.
    fn fn_type(&mut self, params: &[Self::Type], ret: &Self::Type) -> Self::Type;

    /// Tipo de una dirección, con o sin banco.
    fn addr_type(&mut self, banked: bool) -> Self::Type;

    /// Resuelve nombres y dependencias de una expresión.
    fn convert_expr(&mut self, expr: &mut Self::Expr, class: IdepClass);
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FnClass {
    Ct,
    Fn,
    Mode,
    Nmi,
    Irq,
}

impl FnClass {
    /// Banderas y listas que acepta una función de esta clase.
    pub fn permitted_mods(self) -> (ModFlags, ModLists) {
        let common = ModFlags::ZERO_PAGE
            | ModFlags::ALIGN
            | ModFlags::GRAPHVIZ
            | ModFlags::STATIC
            | ModFlags::INFO
            | ModFlags::SLOPPY;

        let lists = ModLists::VARS | ModLists::DATA | ModLists::EMPLOYS;

        match self {
            FnClass::Ct => (ModFlags::empty(), ModLists::empty()),
            FnClass::Fn => (common | ModFlags::INLINE, lists),
            FnClass::Mode | FnClass::Nmi | FnClass::Irq => (common, lists),
        }
    }

    /// Solo los modos pueden declarar manejadores `nmi` e `irq`.
    pub fn accepts_handlers(self) -> bool {
        self == FnClass::Mode
    }

    pub fn keyword(self) -> &'static str {
        match self {
            FnClass::Ct => "ct",
            FnClass::Fn => "fn",
            FnClass::Mode => "mode",
            FnClass::Nmi => "nmi",
            FnClass::Irq => "irq",
        }
    }
}

impl Display for FnClass {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(self.keyword())
    }
}

pub type Pass1Result<T> = Result<T, Annotated<Pass1Error>>;

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Pass1Error {
    #[error("Identifier {0} already in use.")]
    InUse(Identifier),

    #[error("Identifier {0} (defined from file) already in use.")]
    InUseFromFile(Identifier),

    #[error("Label name already in use.")]
    LabelInUse,

    #[error("Label not in scope.")]
    LabelNotInScope,

    #[error("break cannot be used here.")]
    BreakOutside,

    #[error("continue cannot be used here.")]
    ContinueOutside,

    #[error("case without switch.")]
    CaseOutside,

    #[error("default without switch.")]
    DefaultOutside,

    #[error("Multiple default labels inside switch.")]
    MultipleSwitchDefaults,

    #[error("Multiple default labels.")]
    MultipleAsmDefaults,

    #[error("Missing preserves modifier.")]
    MissingPreserves,

    #[error("Too many local variables. Max {0}.")]
    TooManyLocals(usize),

    #[error("{0} does not support inline assembly.")]
    NoInlineAsm(FnClass),

    #[error("{0} lacks addressing mode {1}.")]
    MissingAddrMode(Mnemonic, AddrMode),

    #[error("Multiple definitions of {field} in {name}.")]
    FieldRedefined { field: Identifier, name: Identifier },

    #[error("Hash collision! {field} in {name}...")]
    HashCollision { field: Identifier, name: Identifier },

    #[error("While parsing macro file...")]
    Macro,

    #[error(transparent)]
    Mods(#[from] ModsError),
}

impl From<Located<ModsError>> for Annotated<Pass1Error> {
    fn from(error: Located<ModsError>) -> Self {
        Annotated::new(error.map(Pass1Error::from))
    }
}

/// Función completamente construida.
#[derive(Debug)]
pub struct DefinedFn<R: Registry> {
    pub global: R::Global,
    pub name: Located<Identifier>,
    pub class: FnClass,
    pub fn_type: R::Type,
    pub def: FnDef<R::Type, R::Expr>,
    pub mods: Option<Mods>,
    pub assembly: bool,
}

#[derive(Debug)]
pub struct DefinedVar<R: Registry> {
    pub global: R::Global,
    pub decl: VarDecl<R::Type>,
    pub init: Option<R::Expr>,
    pub mods: Option<Mods>,
}

#[derive(Debug)]
pub struct DefinedConst<R: Registry> {
    pub global: R::Global,
    pub decl: VarDecl<R::Type>,
    pub init: R::Expr,
    pub mods: Option<Mods>,
}

/// Sesión de primera pasada sobre un archivo.
pub struct Pass1<R> {
    registry: R,
}

impl<R: Registry> Pass1<R> {
    pub fn new(registry: R) -> Self {
        Pass1 { registry }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn into_registry(self) -> R {
        self.registry
    }

    /// Inicia una función con cuerpo estructurado.
    pub fn begin_fn(
        &mut self,
        name: Located<Identifier>,
        params: Vec<VarDecl<R::Type>>,
        return_type: R::Type,
        class: FnClass,
    ) -> Pass1Result<FnBuilder<'_, R>> {
        self.begin(name, params, return_type, class, false)
    }

    /// Inicia una función cuyo cuerpo es un bloque de ensamblador.
    pub fn begin_asm_fn(
        &mut self,
        name: Located<Identifier>,
        params: Vec<VarDecl<R::Type>>,
        return_type: R::Type,
        class: FnClass,
    ) -> Pass1Result<FnBuilder<'_, R>> {
        self.begin(name, params, return_type, class, true)
    }

    fn begin(
        &mut self,
        name: Located<Identifier>,
        params: Vec<VarDecl<R::Type>>,
        return_type: R::Type,
        class: FnClass,
        assembly: bool,
    ) -> Pass1Result<FnBuilder<'_, R>> {
        debug!(name = %name.val(), %class, assembly, "begin fn");

        let global = self.registry.lookup_global(&name);
        let param_types: Vec<R::Type> = params.iter().map(|param| param.ty.clone()).collect();
        let fn_type = self.registry.fn_type(&param_types, &return_type);
        self.registry.uses_type(&fn_type, IdepClass::Type);

        let mut builder = FnBuilder {
            registry: &mut self.registry,
            global,
            name,
            class,
            fn_type,
            assembly,
            def: FnDef::default(),
            symbols: SymbolTable::new(),
            label_map: FxHashMap::default(),
            unlinked_gotos: SmallVec::new(),
            break_stack: SmallVec::new(),
            continue_stack: SmallVec::new(),
            switch_stack: SmallVec::new(),
            prev_label_name: None,
        };

        // Ámbito de parámetros
        builder.symbols.push_scope();

        builder.def.num_params = params.len() as u32;
        for param in params {
            builder.def.name_hashes.push(fnv1a(param.name.val().as_ref()));
            builder.add_symbol(param, false, None, None)?;
        }

        builder.def.return_type = Some(return_type);

        // Ámbito del cuerpo
        if !assembly {
            builder.symbols.push_scope();
        }

        Ok(builder)
    }

    /// Inicia una estructura.
    pub fn begin_struct(&mut self, name: Located<Identifier>) -> StructBuilder<'_, R> {
        StructBuilder::new(&mut self.registry, name)
    }

    /// Define una variable global.
    pub fn global_var(
        &mut self,
        decl: VarDecl<R::Type>,
        mut init: Option<R::Expr>,
        mods: Option<Mods>,
    ) -> Pass1Result<DefinedVar<R>> {
        self.registry.uses_type(&decl.ty, IdepClass::Type);
        validate_mods!(
            mods,
            ModFlags::ZERO_PAGE | ModFlags::ALIGN | ModFlags::SRAM,
            ModLists::empty(),
            false
        );

        let global = self.registry.lookup_global(&decl.name);
        if let Some(init) = &mut init {
            self.registry.convert_expr(init, IdepClass::Type);
        }

        debug!(name = %decl.name.val(), "global var");
        Ok(DefinedVar {
            global,
            decl,
            init,
            mods,
        })
    }

    /// Define una constante global.
    pub fn global_const(
        &mut self,
        decl: VarDecl<R::Type>,
        mut init: R::Expr,
        mods: Option<Mods>,
    ) -> Pass1Result<DefinedConst<R>> {
        self.registry.uses_type(&decl.ty, IdepClass::Type);
        validate_mods!(
            mods,
            ModFlags::ALIGN | ModFlags::DPCM | ModFlags::STATIC,
            ModLists::empty(),
            false
        );

        let global = self.registry.lookup_global(&decl.name);
        self.registry.convert_expr(&mut init, IdepClass::Type);

        debug!(name = %decl.name.val(), "global const");
        Ok(DefinedConst {
            global,
            decl,
            init,
            mods,
        })
    }

    /// Expande una macro invocada en `at`.
    ///
    /// El resultado es un nuevo origen, nombrado como el archivo de la
    /// macro, listo para someterse a análisis léxico.
    pub fn invoke_macro<S: AsRef<str>>(
        &mut self,
        at: &Location,
        macro_source: &Rc<Source>,
        args: &[S],
    ) -> Pass1Result<Rc<Source>> {
        match expand::expand(macro_source, args) {
            Ok(text) => Ok(Source::new(macro_source.name(), text)),
            Err(error) => {
                let (location, error): (Location, MacroError) = error.split();
                Err(Annotated::new(Located::at(Pass1Error::Macro, at.clone()))
                    .note(location, error.to_string()))
            }
        }
    }
}

struct SwitchFrame {
    prev_case: StmtHandle,
    default_case: Option<StmtHandle>,
}

/// Sesión de construcción de una función.
///
/// Se obtiene de [`Pass1::begin_fn`] o [`Pass1::begin_asm_fn`] y se
/// consume con [`FnBuilder::end_fn`] o [`FnBuilder::end_asm_fn`].
pub struct FnBuilder<'p, R: Registry> {
    registry: &'p mut R,
    global: R::Global,
    name: Located<Identifier>,
    class: FnClass,
    fn_type: R::Type,
    assembly: bool,
    def: FnDef<R::Type, R::Expr>,
    symbols: SymbolTable,
    label_map: FxHashMap<Identifier, StmtHandle>,
    unlinked_gotos: SmallVec<[(Identifier, StmtHandle); 4]>,
    break_stack: SmallVec<[SmallVec<[StmtHandle; 4]>; 8]>,
    continue_stack: SmallVec<[SmallVec<[StmtHandle; 4]>; 8]>,
    switch_stack: SmallVec<[SwitchFrame; 4]>,
    prev_label_name: Option<Identifier>,
}

impl<R: Registry> FnBuilder<'_, R> {
    /// Función en construcción.
    pub fn def(&self) -> &FnDef<R::Type, R::Expr> {
        &self.def
    }

    /// Busca un símbolo local visible.
    pub fn find(&self, name: &Identifier) -> Option<SymbolHandle> {
        self.symbols.find(name)
    }

    /// Cantidad de ámbitos abiertos.
    pub fn scope_depth(&self) -> usize {
        self.symbols.depth()
    }

    fn add_symbol(
        &mut self,
        decl: VarDecl<R::Type>,
        is_const: bool,
        mods: Option<Mods>,
        expr: Option<R::Expr>,
    ) -> Pass1Result<SymbolHandle> {
        let handle = if is_const {
            SymbolHandle::Const(self.def.local_consts.len() as u32)
        } else {
            SymbolHandle::Var(self.def.local_vars.len() as u32)
        };

        if let Some(existing) = self.symbols.new_def(handle, decl.name.val()) {
            let previous = self.def.var_decl(existing).name.location().clone();
            let error = Pass1Error::InUse(decl.name.val().clone());

            return Err(Annotated::new(Located::at(error, decl.name.location().clone()))
                .note(previous, "Previous definition here:"));
        }

        let mods = self.def.push_mods(mods);
        if is_const {
            let expr = expr.map(|expr| self.def.push_expr(expr));
            self.def.name_hashes.push(fnv1a(decl.name.val().as_ref()));
            self.def.local_consts.push(LocalConst { decl, mods, expr });
        } else {
            self.def.local_vars.push(LocalVar { decl, mods });
        }

        Ok(handle)
    }

    /// Conversión diferida de las constantes locales.
    fn convert_local_consts(&mut self) {
        let Self { registry, def, .. } = self;
        for index in 0..def.local_consts.len() {
            if let Some(expr) = def.local_consts[index].expr {
                registry.convert_expr(def.expr_mut(expr), IdepClass::Type);
            }
        }
    }

    fn finish(self, mods: Option<Mods>) -> DefinedFn<R> {
        debug_assert!(self.symbols.is_empty());
        debug_assert!(self.switch_stack.is_empty());
        debug_assert_eq!(self.def.first_unlinked(), None, "unresolved statement link");

        debug!(
            name = %self.name.val(),
            stmts = self.def.stmts.len(),
            locals = self.def.local_vars.len(),
            "end fn"
        );

        DefinedFn {
            global: self.global,
            name: self.name,
            class: self.class,
            fn_type: self.fn_type,
            def: self.def,
            mods,
            assembly: self.assembly,
        }
    }
}
