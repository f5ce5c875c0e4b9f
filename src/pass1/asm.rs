//! Funciones con cuerpo en ensamblador.
//!
//! Un cuerpo en ensamblador es una lista plana de instrucciones,
//! etiquetas y llamadas, sin control de flujo estructurado. Las
//! etiquetas no son destinos de `goto` sino constantes locales cuyo
//! valor es su propia dirección, por lo que comparten el espacio de
//! símbolos con las constantes.

use super::{DefinedFn, FnBuilder, FnClass, IdepClass, Pass1Error, Pass1Result, Registry};

use crate::{
    asm::{self as opcodes, AddrMode, Mnemonic},
    error::Annotated,
    ir::{AsmCall, AsmItem, LocalConst, Stmt, StmtKind, VarDecl},
    lex::Identifier,
    mods::{ModFlags, ModLists, Mods},
    source::{Located, Location},
    symbol::SymbolHandle,
};

use tracing::trace;

/// Máximo de variables locales en una función en ensamblador.
pub const MAX_ASM_LOCAL_VARS: usize = 8;

impl<'p, R: Registry> FnBuilder<'p, R> {
    /// Declara una variable local del bloque.
    pub fn asm_var(&mut self, decl: VarDecl<R::Type>, mods: Option<Mods>) -> Pass1Result<u32> {
        debug_assert!(self.assembly);
        validate_mods!(mods, ModFlags::ZERO_PAGE);

        let ty = decl.ty.clone();
        let index = self.def.local_vars.len() as u32;
        self.add_symbol(decl, false, mods, None)?;
        self.registry.uses_type(&ty, IdepClass::Type);

        Ok(index)
    }

    /// Define una etiqueta, retornando su índice de constante local.
    ///
    /// A lo sumo una etiqueta por función puede ser la entrada por defecto.
    pub fn asm_label(
        &mut self,
        label: Located<Identifier>,
        is_default: bool,
        banked: bool,
        mods: Option<Mods>,
    ) -> Pass1Result<u32> {
        debug_assert!(self.assembly);
        self.prev_label_name = Some(label.val().clone());

        let location = label.location().clone();
        let ty = self.registry.addr_type(banked);
        let index = self.def.local_consts.len() as u32;
        self.add_symbol(VarDecl { name: label, ty }, true, None, None)?;

        if is_default {
            if self.def.default_label.is_some() {
                fail!(&location, Pass1Error::MultipleAsmDefaults);
            }

            self.def.default_label = Some(index);
        }

        validate_mods!(mods);

        trace!(index, at = %location, "asm label");
        let mods = self.def.push_mods(mods);
        self.def.asm.push(AsmItem::Label {
            location,
            index,
            mods,
        });

        Ok(index)
    }

    /// Define un valor con nombre relativo a la etiqueta previa.
    ///
    /// Si existe una etiqueta previa `l`, el nombre efectivo es `l_name`.
    pub fn asm_named_value(
        &mut self,
        at: Location,
        name: &str,
        ty: R::Type,
        value: R::Expr,
    ) -> Pass1Result<u32> {
        debug_assert!(self.assembly);

        let name = match &self.prev_label_name {
            Some(label) => Identifier::new(&format!("{}_{}", label, name)),
            None => Identifier::new(name),
        };

        let index = self.def.local_consts.len() as u32;
        if let Some(existing) = self.symbols.new_def(SymbolHandle::Const(index), &name) {
            let previous = self.def.var_decl(existing).name.location().clone();
            return Err(
                Annotated::new(Located::at(Pass1Error::InUseFromFile(name), at))
                    .note(previous, "Previous definition here:"),
            );
        }

        let expr = self.def.push_expr(value);
        self.def.name_hashes.push(super::fnv1a(name.as_ref()));
        self.def.local_consts.push(LocalConst {
            decl: VarDecl {
                name: Located::at(name, at),
                ty,
            },
            mods: None,
            expr: Some(expr),
        });

        Ok(index)
    }

    /// Agrega una instrucción.
    ///
    /// Un modo de direccionamiento absoluto sin opcode propio se reduce a
    /// su equivalente de página cero. El operando se convierte al cerrar
    /// la función, cuando ya existen todas las etiquetas.
    pub fn asm_op(
        &mut self,
        at: Location,
        mnemonic: Mnemonic,
        mode: AddrMode,
        operand: Option<R::Expr>,
    ) -> Pass1Result<u8> {
        debug_assert!(self.assembly);

        let opcode = match opcodes::opcode_or_zp(mnemonic, mode) {
            Some(opcode) => opcode,
            None => fail!(&at, Pass1Error::MissingAddrMode(mnemonic, mode)),
        };

        let operand = operand.map(|operand| self.def.push_expr(operand));
        self.def.asm.push(AsmItem::Op {
            location: at,
            mnemonic,
            mode,
            opcode,
            operand,
        });

        Ok(opcode)
    }

    /// Llamada, salto o cambio de modo desde el bloque.
    pub fn asm_call(
        &mut self,
        at: Location,
        kind: AsmCall,
        target: R::Expr,
        mods: Option<Mods>,
    ) -> Pass1Result<()> {
        debug_assert!(self.assembly);

        if kind == AsmCall::GotoMode {
            validate_mods!(mods, ModFlags::empty(), ModLists::PRESERVES, false);

            let preserves = mods
                .as_ref()
                .map_or(false, |mods| mods.explicit_lists.contains(ModLists::PRESERVES));

            if !preserves {
                fail!(&at, Pass1Error::MissingPreserves);
            }
        } else {
            validate_mods!(mods);
        }

        let target = self.def.push_expr(target);
        let mods = self.def.push_mods(mods);
        self.def.asm.push(AsmItem::Call {
            location: at,
            kind,
            target,
            mods,
        });

        Ok(())
    }

    /// Espera al siguiente NMI.
    pub fn asm_wait_nmi(&mut self, at: Location, mods: Option<Mods>) -> Pass1Result<()> {
        debug_assert!(self.assembly);
        validate_mods!(mods);

        let mods = self.def.push_mods(mods);
        self.def.asm.push(AsmItem::WaitNmi { location: at, mods });

        Ok(())
    }

    /// Finaliza una función en ensamblador.
    #[tracing::instrument(level = "debug", skip_all, fields(name = %self.name.val()))]
    pub fn end_asm_fn(mut self, mods: Option<Mods>) -> Pass1Result<DefinedFn<R>> {
        debug_assert!(self.assembly);

        self.convert_local_consts();
        self.convert_operands();

        let at = self.name.location().clone();
        self.def.push_stmt(Stmt::new(StmtKind::Asm, at.clone()));
        self.def.push_stmt(Stmt::new(StmtKind::EndFn, at.clone()));

        if self.def.local_vars.len() > MAX_ASM_LOCAL_VARS {
            fail!(&at, Pass1Error::TooManyLocals(MAX_ASM_LOCAL_VARS));
        }

        // Parámetros
        self.symbols.pop_scope();
        self.label_map.clear();

        if self.class != FnClass::Fn {
            fail!(&at, Pass1Error::NoInlineAsm(self.class));
        }

        let (flags, lists) = self.class.permitted_mods();
        validate_mods!(mods, flags, lists, false);

        Ok(self.finish(mods))
    }

    fn convert_operands(&mut self) {
        let Self { registry, def, .. } = self;
        for index in 0..def.asm.len() {
            let expr = match &def.asm[index] {
                AsmItem::Op {
                    operand: Some(expr),
                    ..
                } => *expr,
                AsmItem::Call { target, .. } => *target,
                _ => continue,
            };

            registry.convert_expr(def.expr_mut(expr), IdepClass::Type);
        }
    }
}
