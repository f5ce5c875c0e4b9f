//! Sentencias estructuradas.
//!
//! Cada construcción de control de flujo se abre con un `begin_*` que
//! retorna un marco, y se cierra entregando ese marco al `end_*`
//! correspondiente. Al cerrar se parchean todos los `link` internos de
//! la construcción; solo las etiquetas pueden quedar pendientes hasta el
//! final de la función.

use super::{
    DefinedFn, FnBuilder, IdepClass, Pass1Error, Pass1Result, Registry, SwitchFrame,
};

use crate::{
    error::Annotated,
    ir::{ExprHandle, ModsHandle, Stmt, StmtHandle, StmtKind, VarDecl},
    lex::Identifier,
    mods::{ModFlags, ModLists, Mods},
    source::{Located, Location},
};

use smallvec::SmallVec;
use tracing::trace;

/// Banderas aceptadas por los ciclos.
const LOOP_FLAGS: ModFlags = ModFlags::from_bits_truncate(
    ModFlags::UNROLL.bits() | ModFlags::UNLOOP.bits(),
);

#[must_use]
pub struct IfFrame {
    begin: StmtHandle,
    mods: Option<ModsHandle>,
    location: Location,
}

#[must_use]
pub struct ElseFrame {
    begin: StmtHandle,
    mods: Option<ModsHandle>,
    location: Location,
}

#[must_use]
pub struct WhileFrame<E> {
    begin: StmtHandle,
    mods: Option<ModsHandle>,
    location: Location,
    is_do: bool,
    condition: Option<E>,
}

#[must_use]
pub struct ForFrame<E> {
    begin: StmtHandle,
    mods: Option<ModsHandle>,
    location: Location,
    is_do: bool,
    condition: Option<E>,
    effect: Option<E>,
}

impl<'p, R: Registry> FnBuilder<'p, R> {
    fn push(&mut self, stmt: Stmt) -> StmtHandle {
        trace!(kind = ?stmt.kind, at = %stmt.location, "push stmt");
        self.def.push_stmt(stmt)
    }

    /// Convierte y almacena la expresión de una sentencia.
    fn stmt_expr(&mut self, expr: Option<R::Expr>) -> Option<ExprHandle> {
        expr.map(|mut expr| {
            self.registry.convert_expr(&mut expr, IdepClass::Value);
            self.def.push_expr(expr)
        })
    }

    fn link(&mut self, from: StmtHandle, to: StmtHandle) {
        self.def[from].link = Some(to);
    }

    /// Sentencia de expresión.
    pub fn expr_statement(&mut self, at: Location, expr: R::Expr) -> StmtHandle {
        debug_assert!(!self.assembly);

        let expr = self.stmt_expr(Some(expr));
        self.push(Stmt::new(StmtKind::Expr, at).with_expr(expr))
    }

    /// Declara una variable local y emite su inicialización.
    pub fn local_var(&mut self, decl: VarDecl<R::Type>, init: Option<R::Expr>) -> Pass1Result<u32> {
        let at = decl.name.location().clone();
        let ty = decl.ty.clone();

        let index = self.def.local_vars.len() as u32;
        self.add_symbol(decl, false, None, None)?;

        let init = self.stmt_expr(init);
        self.push(Stmt::new(StmtKind::VarInit(index), at).with_expr(init));
        self.registry.uses_type(&ty, IdepClass::Type);

        Ok(index)
    }

    /// Declara una constante local.
    ///
    /// El inicializador no se convierte aquí: puede depender de contexto
    /// que solo se conoce al terminar la función.
    pub fn local_const(
        &mut self,
        decl: VarDecl<R::Type>,
        init: R::Expr,
        mods: Option<Mods>,
    ) -> Pass1Result<u32> {
        validate_mods!(mods);

        let index = self.def.local_consts.len() as u32;
        self.add_symbol(decl, true, mods, Some(init))?;

        Ok(index)
    }

    pub fn begin_if(
        &mut self,
        at: Location,
        condition: R::Expr,
        mods: Option<Mods>,
    ) -> Pass1Result<IfFrame> {
        self.symbols.push_scope();
        validate_mods!(mods);

        let mods = self.def.push_mods(mods);
        let condition = self.stmt_expr(Some(condition));
        let begin = self.push(
            Stmt::new(StmtKind::If, at.clone())
                .with_mods(mods)
                .with_expr(condition),
        );

        Ok(IfFrame {
            begin,
            mods,
            location: at,
        })
    }

    fn close_arm(&mut self, begin: StmtHandle, mods: Option<ModsHandle>, at: Location) {
        let end = self.push(
            Stmt::new(StmtKind::EndIf, at)
                .with_mods(mods)
                .with_link(begin),
        );

        self.link(begin, end.next());
        self.symbols.pop_scope();
    }

    pub fn end_if(&mut self, frame: IfFrame) {
        self.close_arm(frame.begin, frame.mods, frame.location);
    }

    pub fn end_if_begin_else(
        &mut self,
        frame: IfFrame,
        at: Location,
        mods: Option<Mods>,
    ) -> Pass1Result<ElseFrame> {
        self.close_arm(frame.begin, frame.mods, frame.location);
        self.symbols.push_scope();
        validate_mods!(mods);

        let mods = self.def.push_mods(mods);
        let begin = self.push(Stmt::new(StmtKind::Else, at.clone()).with_mods(mods));

        Ok(ElseFrame {
            begin,
            mods,
            location: at,
        })
    }

    pub fn end_else(&mut self, frame: ElseFrame) {
        self.close_arm(frame.begin, frame.mods, frame.location);
    }

    fn open_loop(&mut self) {
        self.break_stack.push(SmallVec::new());
        self.continue_stack.push(SmallVec::new());
    }

    /// Parchea las salidas pendientes del ciclo más interno.
    fn close_loop(&mut self, exit: StmtHandle, resume: StmtHandle) {
        let breaks = self.break_stack.pop().unwrap_or_default();
        let continues = self.continue_stack.pop().unwrap_or_default();

        for stmt in breaks {
            self.link(stmt, exit.next());
        }

        for stmt in continues {
            self.link(stmt, resume);
        }
    }

    pub fn begin_while(
        &mut self,
        at: Location,
        condition: R::Expr,
        mods: Option<Mods>,
    ) -> Pass1Result<WhileFrame<R::Expr>> {
        self.open_while(at, condition, mods, false)
    }

    /// Inicia un `do ... while`; la condición se evalúa al cerrar.
    pub fn begin_do_while(
        &mut self,
        at: Location,
        condition: R::Expr,
        mods: Option<Mods>,
    ) -> Pass1Result<WhileFrame<R::Expr>> {
        self.open_while(at, condition, mods, true)
    }

    fn open_while(
        &mut self,
        at: Location,
        condition: R::Expr,
        mods: Option<Mods>,
        is_do: bool,
    ) -> Pass1Result<WhileFrame<R::Expr>> {
        self.symbols.push_scope();
        self.open_loop();
        validate_mods!(mods, LOOP_FLAGS);

        let mods = self.def.push_mods(mods);
        let (begin, condition) = if is_do {
            let begin = self.push(Stmt::new(StmtKind::DoWhile, at.clone()).with_mods(mods));
            (begin, Some(condition))
        } else {
            let condition = self.stmt_expr(Some(condition));
            let stmt = Stmt::new(StmtKind::While, at.clone())
                .with_mods(mods)
                .with_expr(condition);

            (self.push(stmt), None)
        };

        Ok(WhileFrame {
            begin,
            mods,
            location: at,
            is_do,
            condition,
        })
    }

    pub fn end_while(&mut self, frame: WhileFrame<R::Expr>) {
        let WhileFrame {
            begin,
            mods,
            location,
            is_do,
            condition,
        } = frame;

        let exit = if is_do {
            let condition = self.stmt_expr(condition);
            let exit = self.push(
                Stmt::new(StmtKind::EndDoWhile, location)
                    .with_mods(mods)
                    .with_link(begin)
                    .with_expr(condition),
            );

            self.link(begin, exit);
            exit
        } else {
            let exit = self.push(
                Stmt::new(StmtKind::EndWhile, location)
                    .with_mods(mods)
                    .with_link(begin),
            );

            self.link(begin, exit.next());
            exit
        };

        // `continue` siempre llega a la evaluación de la condición
        self.close_loop(exit, if is_do { exit } else { begin });
        self.symbols.pop_scope();
    }

    /// Inicia un `for`.
    ///
    /// El inicializador, ya sea una declaración o una expresión, se emite
    /// antes de la cabeza del ciclo en un ámbito externo al del cuerpo.
    pub fn begin_for(
        &mut self,
        at: Location,
        init: ForInit<R::Type, R::Expr>,
        condition: Option<R::Expr>,
        effect: Option<R::Expr>,
        mods: Option<Mods>,
    ) -> Pass1Result<ForFrame<R::Expr>> {
        self.open_for(at, init, condition, effect, mods, false)
    }

    /// Inicia un `do ... for`; la condición se evalúa al cerrar.
    pub fn begin_do_for(
        &mut self,
        at: Location,
        init: ForInit<R::Type, R::Expr>,
        condition: Option<R::Expr>,
        effect: Option<R::Expr>,
        mods: Option<Mods>,
    ) -> Pass1Result<ForFrame<R::Expr>> {
        self.open_for(at, init, condition, effect, mods, true)
    }

    fn open_for(
        &mut self,
        at: Location,
        init: ForInit<R::Type, R::Expr>,
        condition: Option<R::Expr>,
        effect: Option<R::Expr>,
        mods: Option<Mods>,
        is_do: bool,
    ) -> Pass1Result<ForFrame<R::Expr>> {
        self.symbols.push_scope();

        match init {
            ForInit::None => (),
            ForInit::Var(decl, init) => {
                self.local_var(decl, init)?;
            }

            ForInit::Expr(expr) => {
                self.expr_statement(at.clone(), expr);
            }
        }

        validate_mods!(mods, LOOP_FLAGS);
        let mods = self.def.push_mods(mods);

        let (begin, condition) = if is_do {
            let begin = self.push(Stmt::new(StmtKind::DoFor, at.clone()).with_mods(mods));
            (begin, condition)
        } else {
            let condition = self.stmt_expr(condition);
            let stmt = Stmt::new(StmtKind::For, at.clone())
                .with_mods(mods)
                .with_expr(condition);

            (self.push(stmt), None)
        };

        self.symbols.push_scope();
        self.open_loop();

        Ok(ForFrame {
            begin,
            mods,
            location: at,
            is_do,
            condition,
            effect,
        })
    }

    pub fn end_for(&mut self, frame: ForFrame<R::Expr>) {
        let ForFrame {
            begin,
            mods,
            location,
            is_do,
            condition,
            effect,
        } = frame;

        let effect_expr = self.stmt_expr(effect);
        let effect = self.push(
            Stmt::new(StmtKind::ForEffect, location.clone())
                .with_mods(mods)
                .with_link(begin)
                .with_expr(effect_expr),
        );

        self.symbols.pop_scope();

        let exit = if is_do {
            let condition = self.stmt_expr(condition);
            let exit = self.push(
                Stmt::new(StmtKind::EndDoFor, location)
                    .with_mods(mods)
                    .with_link(begin)
                    .with_expr(condition),
            );

            self.link(begin, exit);
            exit
        } else {
            let exit = self.push(
                Stmt::new(StmtKind::EndFor, location)
                    .with_mods(mods)
                    .with_link(begin),
            );

            self.link(begin, exit.next());
            exit
        };

        self.close_loop(exit, effect);
        self.symbols.pop_scope();
    }

    pub fn return_statement(
        &mut self,
        at: Location,
        expr: Option<R::Expr>,
        mods: Option<Mods>,
    ) -> Pass1Result<StmtHandle> {
        validate_mods!(mods);

        let mods = self.def.push_mods(mods);
        let expr = self.stmt_expr(expr);
        Ok(self.push(Stmt::new(StmtKind::Return, at).with_mods(mods).with_expr(expr)))
    }

    pub fn break_statement(&mut self, at: Location, mods: Option<Mods>) -> Pass1Result<StmtHandle> {
        validate_mods!(mods);
        if self.break_stack.is_empty() {
            fail!(&at, Pass1Error::BreakOutside);
        }

        let mods = self.def.push_mods(mods);
        let stmt = self.push(Stmt::new(StmtKind::Break, at).with_mods(mods));

        if let Some(frame) = self.break_stack.last_mut() {
            frame.push(stmt);
        }

        Ok(stmt)
    }

    pub fn continue_statement(
        &mut self,
        at: Location,
        mods: Option<Mods>,
    ) -> Pass1Result<StmtHandle> {
        validate_mods!(mods);
        if self.continue_stack.is_empty() {
            fail!(&at, Pass1Error::ContinueOutside);
        }

        let mods = self.def.push_mods(mods);
        let stmt = self.push(Stmt::new(StmtKind::Continue, at).with_mods(mods));

        if let Some(frame) = self.continue_stack.last_mut() {
            frame.push(stmt);
        }

        Ok(stmt)
    }

    pub fn begin_switch(
        &mut self,
        at: Location,
        selector: R::Expr,
        mods: Option<Mods>,
    ) -> Pass1Result<()> {
        self.symbols.push_scope();
        self.break_stack.push(SmallVec::new());
        validate_mods!(mods);

        let mods = self.def.push_mods(mods);
        let selector = self.stmt_expr(Some(selector));
        let begin = self.push(
            Stmt::new(StmtKind::Switch, at)
                .with_mods(mods)
                .with_expr(selector),
        );

        self.switch_stack.push(SwitchFrame {
            prev_case: begin,
            default_case: None,
        });

        Ok(())
    }

    /// Cierra el `switch` más interno, sintetizando `default` si falta.
    pub fn end_switch(&mut self, at: Location) -> Pass1Result<()> {
        let has_default = match self.switch_stack.last() {
            Some(frame) => frame.default_case.is_some(),
            None => fail!(&at, Pass1Error::DefaultOutside),
        };

        if !has_default {
            self.begin_default_label(at.clone(), None)?;
            self.end_label();
        }

        let exit = self.push(Stmt::new(StmtKind::EndSwitch, at));
        if let Some(SwitchFrame {
            prev_case,
            default_case: Some(default_case),
        }) = self.switch_stack.pop()
        {
            self.link(prev_case, default_case);
            self.link(default_case, exit);
        }

        for stmt in self.break_stack.pop().unwrap_or_default() {
            self.link(stmt, exit.next());
        }

        self.symbols.pop_scope();
        Ok(())
    }

    /// Abre una etiqueta `case`; se cierra con [`FnBuilder::end_label`].
    pub fn begin_case_label(
        &mut self,
        at: Location,
        expr: R::Expr,
        mods: Option<Mods>,
    ) -> Pass1Result<StmtHandle> {
        validate_mods!(mods);
        if self.switch_stack.is_empty() {
            fail!(&at, Pass1Error::CaseOutside);
        }

        self.symbols.push_scope();

        let mods = self.def.push_mods(mods);
        let expr = self.stmt_expr(Some(expr));
        let label = self.push(Stmt::new(StmtKind::Case, at).with_mods(mods).with_expr(expr));

        if let Some(prev_case) = self.switch_stack.last().map(|frame| frame.prev_case) {
            self.link(prev_case, label);
        }

        if let Some(frame) = self.switch_stack.last_mut() {
            frame.prev_case = label;
        }

        Ok(label)
    }

    /// Abre la etiqueta `default`; se cierra con [`FnBuilder::end_label`].
    pub fn begin_default_label(
        &mut self,
        at: Location,
        mods: Option<Mods>,
    ) -> Pass1Result<StmtHandle> {
        validate_mods!(mods);
        match self.switch_stack.last() {
            None => fail!(&at, Pass1Error::DefaultOutside),
            Some(frame) if frame.default_case.is_some() => {
                fail!(&at, Pass1Error::MultipleSwitchDefaults)
            }

            Some(_) => (),
        }

        self.symbols.push_scope();

        let mods = self.def.push_mods(mods);
        let label = self.push(Stmt::new(StmtKind::Default, at).with_mods(mods));

        if let Some(frame) = self.switch_stack.last_mut() {
            frame.default_case = Some(label);
        }

        Ok(label)
    }

    /// Define una etiqueta y resuelve los `goto` que la esperaban.
    pub fn begin_label(
        &mut self,
        name: Located<Identifier>,
        mods: Option<Mods>,
    ) -> Pass1Result<StmtHandle> {
        self.symbols.push_scope();
        validate_mods!(mods);

        if let Some(&previous) = self.label_map.get(name.val()) {
            let previous = self.def[previous].location.clone();
            return Err(
                Annotated::new(Located::at(Pass1Error::LabelInUse, name.location().clone()))
                    .note(previous, "Previous definition here:"),
            );
        }

        let (location, name) = name.split();
        let mods = self.def.push_mods(mods);
        let label = self.push(Stmt::new(StmtKind::Label { use_count: 0 }, location).with_mods(mods));

        let mut use_count = 0;
        let mut pending = std::mem::take(&mut self.unlinked_gotos);
        pending.retain(|(target, goto)| {
            if *target != name {
                return true;
            }

            self.def[*goto].link = Some(label);
            use_count += 1;
            false
        });

        self.unlinked_gotos = pending;
        self.def[label].kind = StmtKind::Label { use_count };
        self.label_map.insert(name, label);

        Ok(label)
    }

    /// Cierra el ámbito de una etiqueta, `case` o `default`.
    pub fn end_label(&mut self) {
        self.symbols.pop_scope();
    }

    /// Salto a una etiqueta, posiblemente aún no definida.
    pub fn goto_statement(
        &mut self,
        label: Located<Identifier>,
        mods: Option<Mods>,
    ) -> Pass1Result<StmtHandle> {
        validate_mods!(mods);

        let (location, label) = label.split();
        let mods = self.def.push_mods(mods);
        let goto = self.push(Stmt::new(StmtKind::Goto, location).with_mods(mods));

        match self.label_map.get(&label).copied() {
            None => self.unlinked_gotos.push((label, goto)),
            Some(target) => {
                self.link(goto, target);
                if let StmtKind::Label { use_count } = &mut self.def[target].kind {
                    *use_count += 1;
                }
            }
        }

        Ok(goto)
    }

    /// Cambio de modo; requiere una lista `preserves` explícita.
    pub fn goto_mode_statement(
        &mut self,
        at: Location,
        mode: R::Expr,
        mods: Option<Mods>,
    ) -> Pass1Result<StmtHandle> {
        validate_mods!(mods, ModFlags::empty(), ModLists::PRESERVES, false);

        let preserves = mods
            .as_ref()
            .map_or(false, |mods| mods.explicit_lists.contains(ModLists::PRESERVES));

        if !preserves {
            fail!(&at, Pass1Error::MissingPreserves);
        }

        let mods = self.def.push_mods(mods);
        let mode = self.stmt_expr(Some(mode));
        Ok(self.push(Stmt::new(StmtKind::GotoMode, at).with_mods(mods).with_expr(mode)))
    }

    pub fn nmi_statement(&mut self, at: Location, mods: Option<Mods>) -> Pass1Result<StmtHandle> {
        validate_mods!(mods);

        let mods = self.def.push_mods(mods);
        Ok(self.push(Stmt::new(StmtKind::Nmi, at).with_mods(mods)))
    }

    pub fn irq_statement(
        &mut self,
        at: Location,
        enable: R::Expr,
        mods: Option<Mods>,
    ) -> Pass1Result<StmtHandle> {
        validate_mods!(mods);

        let mods = self.def.push_mods(mods);
        let enable = self.stmt_expr(Some(enable));
        Ok(self.push(Stmt::new(StmtKind::Irq, at).with_mods(mods).with_expr(enable)))
    }

    pub fn fence_statement(&mut self, at: Location, mods: Option<Mods>) -> Pass1Result<StmtHandle> {
        validate_mods!(mods);

        let mods = self.def.push_mods(mods);
        Ok(self.push(Stmt::new(StmtKind::Fence, at).with_mods(mods)))
    }

    /// Intercambio de dos lugares, emitido como un par de sentencias.
    pub fn swap_statement(
        &mut self,
        at: Location,
        first: R::Expr,
        second: R::Expr,
        mods: Option<Mods>,
    ) -> Pass1Result<StmtHandle> {
        validate_mods!(mods);

        let mods = self.def.push_mods(mods);
        let first = self.stmt_expr(Some(first));
        let second = self.stmt_expr(Some(second));

        let stmt = self.push(
            Stmt::new(StmtKind::SwapFirst, at.clone())
                .with_mods(mods)
                .with_expr(first),
        );

        self.push(Stmt::new(StmtKind::SwapSecond, at).with_expr(second));
        Ok(stmt)
    }

    /// Finaliza una función estructurada.
    #[tracing::instrument(level = "debug", skip_all, fields(name = %self.name.val()))]
    pub fn end_fn(mut self, mods: Option<Mods>) -> Pass1Result<DefinedFn<R>> {
        debug_assert!(!self.assembly);

        self.convert_local_consts();

        // Cuerpo y parámetros
        self.symbols.pop_scope();
        self.symbols.pop_scope();
        self.label_map.clear();

        let at = self.name.location().clone();
        self.push(Stmt::new(StmtKind::EndFn, at));

        if let Some((_, goto)) = self.unlinked_gotos.first() {
            fail!(&self.def[*goto].location, Pass1Error::LabelNotInScope);
        }

        let (flags, lists) = self.class.permitted_mods();
        validate_mods!(mods, flags, lists, self.class.accepts_handlers());

        Ok(self.finish(mods))
    }
}

/// Inicializador de un `for`.
pub enum ForInit<T, E> {
    None,
    Var(VarDecl<T>, Option<E>),
    Expr(E),
}
