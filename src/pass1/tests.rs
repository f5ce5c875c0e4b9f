use super::*;
use crate::{
    asm::{AddrMode, Mnemonic},
    ir::{AsmCall, AsmItem, StmtKind},
    mods::ModsError,
};

use pretty_assertions::assert_eq;

#[derive(Debug, Default)]
struct Mock {
    globals: Vec<String>,
    types: Vec<(String, IdepClass)>,
    conversions: Vec<(String, IdepClass)>,
}

impl Registry for Mock {
    type Global = usize;
    type Type = String;
    type Expr = String;

    fn lookup_global(&mut self, name: &Located<Identifier>) -> usize {
        self.globals.push(name.val().to_string());
        self.globals.len() - 1
    }

    fn uses_type(&mut self, ty: &String, class: IdepClass) {
        self.types.push((ty.clone(), class));
    }

    fn fn_type(&mut self, params: &[String], ret: &String) -> String {
        format!("fn({}) {}", params.join(", "), ret)
    }

    fn addr_type(&mut self, banked: bool) -> String {
        if banked { "PP" } else { "AA" }.to_string()
    }

    fn convert_expr(&mut self, expr: &mut String, class: IdepClass) {
        self.conversions.push((expr.clone(), class));
        *expr = format!("<{}>", expr);
    }
}

struct Env {
    source: Rc<Source>,
}

impl Env {
    fn new() -> Self {
        Env {
            source: Source::new("test.fab", "abcdefghij".repeat(20)),
        }
    }

    fn at(&self, start: usize) -> Location {
        Location::new(&self.source, start..start + 1)
    }

    fn id(&self, name: &str, start: usize) -> Located<Identifier> {
        Located::at(Identifier::new(name), self.at(start))
    }

    fn decl(&self, name: &str, start: usize, ty: &str) -> VarDecl<String> {
        VarDecl {
            name: self.id(name, start),
            ty: ty.to_string(),
        }
    }

    fn mods(&self) -> Mods {
        Mods::new(self.at(150))
    }
}

fn begin<'p>(pass1: &'p mut Pass1<Mock>, env: &Env, class: FnClass) -> FnBuilder<'p, Mock> {
    pass1
        .begin_fn(env.id("main", 0), vec![], "Void".into(), class)
        .unwrap()
}

fn begin_asm<'p>(pass1: &'p mut Pass1<Mock>, env: &Env, class: FnClass) -> FnBuilder<'p, Mock> {
    pass1
        .begin_asm_fn(env.id("blit", 0), vec![], "Void".into(), class)
        .unwrap()
}

fn error<T>(result: Pass1Result<T>) -> Annotated<Pass1Error> {
    match result {
        Err(error) => error,
        Ok(_) => panic!("expected an error"),
    }
}

fn kinds(def: &FnDef<String, String>) -> Vec<StmtKind> {
    def.stmts.iter().map(|stmt| stmt.kind).collect()
}

fn links(def: &FnDef<String, String>) -> Vec<Option<u32>> {
    def.stmts
        .iter()
        .map(|stmt| stmt.link.map(|link| link.0))
        .collect()
}

// === Flujo estructurado ===

#[test]
fn if_else_links() {
    let env = Env::new();
    let mut pass1 = Pass1::new(Mock::default());
    let mut f = begin(&mut pass1, &env, FnClass::Fn);

    let frame = f.begin_if(env.at(1), "c".into(), None).unwrap();
    let frame = f.end_if_begin_else(frame, env.at(2), None).unwrap();
    f.end_else(frame);

    let def = f.end_fn(None).unwrap().def;
    assert_eq!(
        kinds(&def),
        [
            StmtKind::If,
            StmtKind::EndIf,
            StmtKind::Else,
            StmtKind::EndIf,
            StmtKind::EndFn
        ]
    );

    assert_eq!(links(&def), [Some(2), Some(0), Some(4), Some(2), None]);
    assert_eq!(def.expr(def.stmts[0].expr.unwrap()), "<c>");
}

#[test]
fn while_links() {
    let env = Env::new();
    let mut pass1 = Pass1::new(Mock::default());
    let mut f = begin(&mut pass1, &env, FnClass::Fn);

    let frame = f.begin_while(env.at(1), "c".into(), None).unwrap();
    f.break_statement(env.at(2), None).unwrap();
    f.continue_statement(env.at(3), None).unwrap();
    f.end_while(frame);

    let def = f.end_fn(None).unwrap().def;
    assert_eq!(
        kinds(&def),
        [
            StmtKind::While,
            StmtKind::Break,
            StmtKind::Continue,
            StmtKind::EndWhile,
            StmtKind::EndFn
        ]
    );

    assert_eq!(links(&def), [Some(4), Some(4), Some(0), Some(0), None]);
}

#[test]
fn do_while_links() {
    let env = Env::new();
    let mut pass1 = Pass1::new(Mock::default());
    let mut f = begin(&mut pass1, &env, FnClass::Fn);

    let frame = f.begin_do_while(env.at(1), "c".into(), None).unwrap();
    f.expr_statement(env.at(2), "body".into());
    f.break_statement(env.at(3), None).unwrap();
    f.continue_statement(env.at(4), None).unwrap();
    f.end_while(frame);

    let def = f.end_fn(None).unwrap().def;
    assert_eq!(
        kinds(&def),
        [
            StmtKind::DoWhile,
            StmtKind::Expr,
            StmtKind::Break,
            StmtKind::Continue,
            StmtKind::EndDoWhile,
            StmtKind::EndFn
        ]
    );

    assert_eq!(links(&def), [Some(4), None, Some(5), Some(4), Some(0), None]);

    // La condición vive en el cierre y se convierte después del cuerpo
    assert_eq!(def.stmts[0].expr, None);
    assert_eq!(def.expr(def.stmts[4].expr.unwrap()), "<c>");
    assert_eq!(
        pass1.registry().conversions,
        [
            ("body".to_string(), IdepClass::Value),
            ("c".to_string(), IdepClass::Value)
        ]
    );
}

#[test]
fn for_links_and_scopes() {
    let env = Env::new();
    let mut pass1 = Pass1::new(Mock::default());
    let mut f = begin(&mut pass1, &env, FnClass::Fn);
    let i = Identifier::new("i");

    assert_eq!(f.scope_depth(), 2);

    let frame = f
        .begin_for(
            env.at(1),
            ForInit::Var(env.decl("i", 2, "U"), Some("0".into())),
            Some("i < 8".into()),
            Some("i += 1".into()),
            None,
        )
        .unwrap();

    assert_eq!(f.scope_depth(), 4);
    assert_eq!(f.find(&i), Some(SymbolHandle::Var(0)));

    f.break_statement(env.at(3), None).unwrap();
    f.continue_statement(env.at(4), None).unwrap();
    f.end_for(frame);

    assert_eq!(f.scope_depth(), 2);
    assert_eq!(f.find(&i), None);

    let def = f.end_fn(None).unwrap().def;
    assert_eq!(
        kinds(&def),
        [
            StmtKind::VarInit(0),
            StmtKind::For,
            StmtKind::Break,
            StmtKind::Continue,
            StmtKind::ForEffect,
            StmtKind::EndFor,
            StmtKind::EndFn
        ]
    );

    assert_eq!(
        links(&def),
        [None, Some(6), Some(6), Some(4), Some(1), Some(1), None]
    );

    assert_eq!(def.expr(def.stmts[0].expr.unwrap()), "<0>");
    assert_eq!(def.expr(def.stmts[4].expr.unwrap()), "<i += 1>");
}

#[test]
fn do_for_links() {
    let env = Env::new();
    let mut pass1 = Pass1::new(Mock::default());
    let mut f = begin(&mut pass1, &env, FnClass::Fn);

    let frame = f
        .begin_do_for(
            env.at(1),
            ForInit::Expr("setup".into()),
            Some("c".into()),
            None,
            None,
        )
        .unwrap();

    f.continue_statement(env.at(2), None).unwrap();
    f.end_for(frame);

    let def = f.end_fn(None).unwrap().def;
    assert_eq!(
        kinds(&def),
        [
            StmtKind::Expr,
            StmtKind::DoFor,
            StmtKind::Continue,
            StmtKind::ForEffect,
            StmtKind::EndDoFor,
            StmtKind::EndFn
        ]
    );

    assert_eq!(links(&def), [None, Some(4), Some(3), Some(1), Some(1), None]);
    assert_eq!(def.expr(def.stmts[4].expr.unwrap()), "<c>");
}

#[test]
fn switch_synthesizes_default() {
    let env = Env::new();
    let mut pass1 = Pass1::new(Mock::default());
    let mut f = begin(&mut pass1, &env, FnClass::Fn);

    f.begin_switch(env.at(1), "s".into(), None).unwrap();
    f.begin_case_label(env.at(2), "1".into(), None).unwrap();
    f.break_statement(env.at(3), None).unwrap();
    f.end_label();
    f.begin_case_label(env.at(4), "2".into(), None).unwrap();
    f.end_label();
    f.end_switch(env.at(5)).unwrap();

    let def = f.end_fn(None).unwrap().def;
    assert_eq!(
        kinds(&def),
        [
            StmtKind::Switch,
            StmtKind::Case,
            StmtKind::Break,
            StmtKind::Case,
            StmtKind::Default,
            StmtKind::EndSwitch,
            StmtKind::EndFn
        ]
    );

    assert_eq!(
        links(&def),
        [Some(1), Some(3), Some(6), Some(4), Some(5), None, None]
    );
}

#[test]
fn explicit_default_ends_chain() {
    let env = Env::new();
    let mut pass1 = Pass1::new(Mock::default());
    let mut f = begin(&mut pass1, &env, FnClass::Fn);

    f.begin_switch(env.at(1), "s".into(), None).unwrap();
    f.begin_default_label(env.at(2), None).unwrap();
    f.end_label();
    f.begin_case_label(env.at(3), "1".into(), None).unwrap();
    f.end_label();
    f.end_switch(env.at(4)).unwrap();

    let def = f.end_fn(None).unwrap().def;
    assert_eq!(
        kinds(&def),
        [
            StmtKind::Switch,
            StmtKind::Default,
            StmtKind::Case,
            StmtKind::EndSwitch,
            StmtKind::EndFn
        ]
    );

    assert_eq!(links(&def), [Some(2), Some(3), Some(1), None, None]);
}

#[test]
fn continue_crosses_switch() {
    let env = Env::new();
    let mut pass1 = Pass1::new(Mock::default());
    let mut f = begin(&mut pass1, &env, FnClass::Fn);

    let frame = f.begin_while(env.at(1), "c".into(), None).unwrap();
    f.begin_switch(env.at(2), "s".into(), None).unwrap();
    f.begin_case_label(env.at(3), "1".into(), None).unwrap();
    f.continue_statement(env.at(4), None).unwrap();
    f.end_label();
    f.end_switch(env.at(5)).unwrap();
    f.end_while(frame);

    let def = f.end_fn(None).unwrap().def;
    assert_eq!(
        kinds(&def),
        [
            StmtKind::While,
            StmtKind::Switch,
            StmtKind::Case,
            StmtKind::Continue,
            StmtKind::Default,
            StmtKind::EndSwitch,
            StmtKind::EndWhile,
            StmtKind::EndFn
        ]
    );

    assert_eq!(
        links(&def),
        [Some(7), Some(2), Some(4), Some(0), Some(5), None, Some(0), None]
    );
}

#[test]
fn switch_errors() {
    let env = Env::new();
    let mut pass1 = Pass1::new(Mock::default());
    let mut f = begin(&mut pass1, &env, FnClass::Fn);

    let e = error(f.begin_case_label(env.at(1), "1".into(), None));
    assert_eq!(e.kind(), &Pass1Error::CaseOutside);
    let e = error(f.begin_default_label(env.at(1), None));
    assert_eq!(e.kind(), &Pass1Error::DefaultOutside);

    f.begin_switch(env.at(2), "s".into(), None).unwrap();
    f.begin_default_label(env.at(3), None).unwrap();
    f.end_label();

    let e = error(f.begin_default_label(env.at(4), None));
    assert_eq!(e.kind(), &Pass1Error::MultipleSwitchDefaults);
    assert_eq!(e.error().location(), &env.at(4));
    assert_eq!(
        e.kind().to_string(),
        "Multiple default labels inside switch."
    );
}

#[test]
fn break_and_continue_need_frames() {
    let env = Env::new();
    let mut pass1 = Pass1::new(Mock::default());
    let mut f = begin(&mut pass1, &env, FnClass::Fn);

    let e = error(f.break_statement(env.at(7), None));
    assert_eq!(e.kind(), &Pass1Error::BreakOutside);
    assert_eq!(e.error().location(), &env.at(7));

    f.begin_switch(env.at(1), "s".into(), None).unwrap();
    f.break_statement(env.at(2), None).unwrap();

    let e = error(f.continue_statement(env.at(3), None));
    assert_eq!(e.kind().to_string(), "continue cannot be used here.");
}

// === Etiquetas ===

#[test]
fn gotos_resolve_both_ways() {
    let env = Env::new();
    let mut pass1 = Pass1::new(Mock::default());
    let mut f = begin(&mut pass1, &env, FnClass::Fn);

    f.goto_statement(env.id("l", 1), None).unwrap();
    f.goto_statement(env.id("other", 2), None).unwrap();
    f.begin_label(env.id("l", 3), None).unwrap();
    f.end_label();
    f.goto_statement(env.id("l", 4), None).unwrap();
    f.begin_label(env.id("other", 5), None).unwrap();
    f.end_label();

    let def = f.end_fn(None).unwrap().def;
    assert_eq!(
        kinds(&def),
        [
            StmtKind::Goto,
            StmtKind::Goto,
            StmtKind::Label { use_count: 2 },
            StmtKind::Goto,
            StmtKind::Label { use_count: 1 },
            StmtKind::EndFn
        ]
    );

    assert_eq!(links(&def), [Some(2), Some(4), None, Some(2), None, None]);
}

#[test]
fn unresolved_goto() {
    let env = Env::new();
    let mut pass1 = Pass1::new(Mock::default());
    let mut f = begin(&mut pass1, &env, FnClass::Fn);

    f.goto_statement(env.id("nowhere", 30), None).unwrap();
    f.goto_statement(env.id("elsewhere", 40), None).unwrap();

    let e = error(f.end_fn(None));
    assert_eq!(e.kind(), &Pass1Error::LabelNotInScope);
    assert_eq!(e.error().location(), &env.at(30));
}

#[test]
fn duplicate_label() {
    let env = Env::new();
    let mut pass1 = Pass1::new(Mock::default());
    let mut f = begin(&mut pass1, &env, FnClass::Fn);

    f.begin_label(env.id("l", 1), None).unwrap();
    f.end_label();

    let e = error(f.begin_label(env.id("l", 9), None));
    assert_eq!(e.kind(), &Pass1Error::LabelInUse);
    assert_eq!(e.error().location(), &env.at(9));
    assert_eq!(e.notes().len(), 1);
    assert_eq!(e.notes()[0].location(), Some(&env.at(1)));
    assert_eq!(e.notes()[0].message(), "Previous definition here:");
}

// === Símbolos ===

#[test]
fn duplicate_identifier() {
    let env = Env::new();
    let mut pass1 = Pass1::new(Mock::default());
    let mut f = begin(&mut pass1, &env, FnClass::Fn);

    f.local_var(env.decl("x", 1, "U"), None).unwrap();

    let frame = f.begin_if(env.at(2), "c".into(), None).unwrap();
    assert_eq!(f.local_var(env.decl("x", 3, "S"), None).unwrap(), 1);
    assert_eq!(f.find(&Identifier::new("x")), Some(SymbolHandle::Var(1)));
    f.end_if(frame);

    assert_eq!(f.find(&Identifier::new("x")), Some(SymbolHandle::Var(0)));

    let e = error(f.local_const(env.decl("x", 4, "U"), "1".into(), None));
    assert_eq!(e.kind(), &Pass1Error::InUse(Identifier::new("x")));
    assert_eq!(e.kind().to_string(), "Identifier x already in use.");
    assert_eq!(e.notes()[0].location(), Some(&env.at(1)));
}

#[test]
fn duplicate_parameter() {
    let env = Env::new();
    let mut pass1 = Pass1::new(Mock::default());
    let params = vec![env.decl("a", 1, "U"), env.decl("a", 3, "U")];

    let e = error(pass1.begin_fn(env.id("f", 0), params, "Void".into(), FnClass::Fn));
    assert_eq!(e.kind(), &Pass1Error::InUse(Identifier::new("a")));
    assert_eq!(e.error().location(), &env.at(3));
}

#[test]
fn local_consts_are_converted_last() {
    let env = Env::new();
    let mut pass1 = Pass1::new(Mock::default());
    let params = vec![env.decl("a", 1, "U"), env.decl("b", 3, "S")];

    let mut f = pass1
        .begin_fn(env.id("f", 0), params, "U".into(), FnClass::Fn)
        .unwrap();

    assert_eq!(f.local_const(env.decl("k", 5, "U"), "5".into(), None).unwrap(), 0);
    assert_eq!(f.find(&Identifier::new("k")), Some(SymbolHandle::Const(0)));
    assert_eq!(f.find(&Identifier::new("b")), Some(SymbolHandle::Var(1)));
    f.expr_statement(env.at(6), "e".into());

    let defined = f.end_fn(None).unwrap();
    let def = &defined.def;

    assert_eq!(defined.fn_type, "fn(U, S) U");
    assert_eq!(def.num_params, 2);
    assert_eq!(def.return_type.as_deref(), Some("U"));
    assert_eq!(
        def.name_hashes,
        [fnv1a("a"), fnv1a("b"), fnv1a("k")]
    );

    assert_eq!(def.expr(def.local_consts[0].expr.unwrap()), "<5>");

    let registry = pass1.into_registry();
    assert_eq!(
        registry.conversions,
        [
            ("e".to_string(), IdepClass::Value),
            ("5".to_string(), IdepClass::Type)
        ]
    );

    assert_eq!(registry.globals, ["f"]);
    assert_eq!(registry.types, [("fn(U, S) U".to_string(), IdepClass::Type)]);
}

// === Modificadores ===

#[test]
fn goto_mode_needs_preserves() {
    let env = Env::new();
    let mut pass1 = Pass1::new(Mock::default());
    let mut f = begin(&mut pass1, &env, FnClass::Mode);

    let e = error(f.goto_mode_statement(env.at(1), "menu".into(), None));
    assert_eq!(e.kind(), &Pass1Error::MissingPreserves);

    let mut mods = env.mods();
    mods.enable = ModFlags::INLINE;
    mods.explicit_lists = ModLists::PRESERVES;
    let e = error(f.goto_mode_statement(env.at(1), "menu".into(), Some(mods)));
    assert_eq!(e.kind(), &Pass1Error::Mods(ModsError::Flag("inline")));

    let mut mods = env.mods();
    mods.explicit_lists = ModLists::PRESERVES;
    let stmt = f
        .goto_mode_statement(env.at(2), "menu".into(), Some(mods))
        .unwrap();

    let def = f.end_fn(None).unwrap().def;
    assert_eq!(def.stmts[stmt.index()].kind, StmtKind::GotoMode);
    assert!(def.stmts[stmt.index()].mods.is_some());
}

#[test]
fn loops_accept_unroll() {
    let env = Env::new();
    let mut pass1 = Pass1::new(Mock::default());
    let mut f = begin(&mut pass1, &env, FnClass::Fn);

    let mut mods = env.mods();
    mods.enable = ModFlags::UNROLL;

    let frame = f
        .begin_while(env.at(1), "c".into(), Some(mods.clone()))
        .unwrap();
    f.end_while(frame);

    let e = error(f.begin_if(env.at(2), "c".into(), Some(mods)));
    assert_eq!(e.kind(), &Pass1Error::Mods(ModsError::Flag("unroll")));
    assert_eq!(e.kind().to_string(), "Unexpected modifier: unroll.");
}

#[test]
fn fn_class_mods() {
    let env = Env::new();
    let mut pass1 = Pass1::new(Mock::default());

    let mut handlers = env.mods();
    handlers.irq = Some(env.id("on_irq", 20));
    handlers.explicit_lists = ModLists::EMPLOYS;

    let f = begin(&mut pass1, &env, FnClass::Mode);
    assert!(f.end_fn(Some(handlers.clone())).is_ok());

    let f = begin(&mut pass1, &env, FnClass::Fn);
    let e = error(f.end_fn(Some(handlers)));
    assert_eq!(e.kind(), &Pass1Error::Mods(ModsError::Handler("irq")));

    let mut inline = env.mods();
    inline.enable = ModFlags::INLINE;

    let f = begin(&mut pass1, &env, FnClass::Ct);
    let e = error(f.end_fn(Some(inline.clone())));
    assert_eq!(e.kind(), &Pass1Error::Mods(ModsError::Flag("inline")));

    let f = begin(&mut pass1, &env, FnClass::Fn);
    let defined = f.end_fn(Some(inline)).unwrap();
    assert_eq!(defined.class, FnClass::Fn);
    assert!(defined.mods.is_some());
}

#[test]
fn single_statements() {
    let env = Env::new();
    let mut pass1 = Pass1::new(Mock::default());
    let mut f = begin(&mut pass1, &env, FnClass::Nmi);

    f.swap_statement(env.at(1), "a".into(), "b".into(), Some(env.mods()))
        .unwrap();
    f.nmi_statement(env.at(2), None).unwrap();
    f.irq_statement(env.at(3), "true".into(), None).unwrap();
    f.fence_statement(env.at(4), None).unwrap();
    f.return_statement(env.at(5), None, None).unwrap();

    let def = f.end_fn(None).unwrap().def;
    assert_eq!(
        kinds(&def),
        [
            StmtKind::SwapFirst,
            StmtKind::SwapSecond,
            StmtKind::Nmi,
            StmtKind::Irq,
            StmtKind::Fence,
            StmtKind::Return,
            StmtKind::EndFn
        ]
    );

    assert!(def.stmts[0].mods.is_some());
    assert!(def.stmts[1].mods.is_none());
    assert_eq!(def.expr(def.stmts[1].expr.unwrap()), "<b>");
    assert_eq!(def.stmts[5].expr, None);
}

// === Ensamblador ===

#[test]
fn asm_body() {
    let env = Env::new();
    let mut pass1 = Pass1::new(Mock::default());
    let mut f = begin_asm(&mut pass1, &env, FnClass::Fn);

    assert_eq!(f.scope_depth(), 1);
    assert_eq!(f.asm_var(env.decl("x", 1, "U"), None).unwrap(), 0);
    assert_eq!(f.asm_label(env.id("loop", 2), true, false, None).unwrap(), 0);
    assert_eq!(
        f.asm_named_value(env.at(3), "size", "U".into(), "4".into())
            .unwrap(),
        1
    );

    assert_eq!(
        f.find(&Identifier::new("loop_size")),
        Some(SymbolHandle::Const(1))
    );

    assert_eq!(
        f.asm_op(env.at(4), Mnemonic::Lda, AddrMode::Absolute, Some("x".into()))
            .unwrap(),
        0xAD
    );

    assert_eq!(
        f.asm_op(env.at(5), Mnemonic::Stx, AddrMode::AbsoluteY, Some("y".into()))
            .unwrap(),
        0x96
    );

    let e = error(f.asm_op(env.at(6), Mnemonic::Jmp, AddrMode::ZeroPage, None));
    assert_eq!(
        e.kind().to_string(),
        "JMP lacks addressing mode zero page."
    );

    f.asm_call(env.at(7), AsmCall::Call, "helper".into(), None)
        .unwrap();
    f.asm_wait_nmi(env.at(8), None).unwrap();

    let defined = f.end_asm_fn(None).unwrap();
    assert!(defined.assembly);

    let def = &defined.def;
    assert_eq!(kinds(def), [StmtKind::Asm, StmtKind::EndFn]);
    assert_eq!(def.default_label, Some(0));
    assert_eq!(def.local_consts[0].decl.ty, "AA");
    assert_eq!(def.name_hashes, [fnv1a("loop"), fnv1a("loop_size")]);
    assert_eq!(def.asm.len(), 5);
    assert!(matches!(def.asm[0], AsmItem::Label { index: 0, .. }));

    let registry = pass1.into_registry();
    assert_eq!(
        registry.conversions,
        [
            ("4".to_string(), IdepClass::Type),
            ("x".to_string(), IdepClass::Type),
            ("y".to_string(), IdepClass::Type),
            ("helper".to_string(), IdepClass::Type)
        ]
    );
}

#[test]
fn asm_named_value_clash() {
    let env = Env::new();
    let mut pass1 = Pass1::new(Mock::default());
    let mut f = begin_asm(&mut pass1, &env, FnClass::Fn);

    f.asm_label(env.id("a", 1), false, true, None).unwrap();
    f.asm_named_value(env.at(2), "b", "U".into(), "1".into())
        .unwrap();

    let e = error(f.asm_named_value(env.at(3), "b", "U".into(), "2".into()));
    assert_eq!(e.kind(), &Pass1Error::InUseFromFile(Identifier::new("a_b")));
    assert_eq!(e.notes()[0].location(), Some(&env.at(2)));

    let e = error(f.asm_label(env.id("a", 4), false, false, None));
    assert_eq!(e.kind(), &Pass1Error::InUse(Identifier::new("a")));
}

#[test]
fn asm_limits() {
    let env = Env::new();
    let mut pass1 = Pass1::new(Mock::default());

    let mut f = begin_asm(&mut pass1, &env, FnClass::Fn);
    f.asm_label(env.id("a", 1), true, false, None).unwrap();
    let e = error(f.asm_label(env.id("b", 2), true, false, None));
    assert_eq!(e.kind(), &Pass1Error::MultipleAsmDefaults);
    drop(f);

    let mut f = begin_asm(&mut pass1, &env, FnClass::Fn);
    for i in 0..=MAX_ASM_LOCAL_VARS {
        f.asm_var(env.decl(&format!("v{}", i), 10 + i, "U"), None)
            .unwrap();
    }

    let e = error(f.end_asm_fn(None));
    assert_eq!(e.kind(), &Pass1Error::TooManyLocals(8));
    assert_eq!(e.kind().to_string(), "Too many local variables. Max 8.");

    let f = begin_asm(&mut pass1, &env, FnClass::Mode);
    let e = error(f.end_asm_fn(None));
    assert_eq!(e.kind().to_string(), "mode does not support inline assembly.");

    let mut f = begin_asm(&mut pass1, &env, FnClass::Fn);
    let e = error(f.asm_call(env.at(1), AsmCall::GotoMode, "menu".into(), None));
    assert_eq!(e.kind(), &Pass1Error::MissingPreserves);

    let mut mods = env.mods();
    mods.enable = ModFlags::SRAM;
    let e = error(f.asm_var(env.decl("v", 1, "U"), Some(mods)));
    assert_eq!(e.kind(), &Pass1Error::Mods(ModsError::Flag("sram")));
}

// === Estructuras y globales ===

#[test]
fn fnv1a_reference_values() {
    assert_eq!(fnv1a(""), 0xcbf2_9ce4_8422_2325);
    assert_eq!(fnv1a("a"), 0xaf63_dc4c_8601_ec8c);
}

#[test]
fn struct_fields() {
    let env = Env::new();
    let mut pass1 = Pass1::new(Mock::default());

    let mut s = pass1.begin_struct(env.id("Point", 0));
    s.field(env.decl("x", 1, "S")).unwrap();
    s.field(env.decl("y", 2, "S")).unwrap();

    let e = error(s.field(env.decl("x", 3, "U")));
    assert_eq!(e.kind().to_string(), "Multiple definitions of x in Point.");
    assert_eq!(e.notes()[0].location(), Some(&env.at(1)));

    let defined = s.end_struct();
    assert_eq!(defined.fields.len(), 2);
    assert_eq!(defined.fields[1].hash, fnv1a("y"));
    assert_eq!(pass1.registry().types.len(), 2);
}

#[test]
fn struct_hash_collision() {
    let env = Env::new();
    let mut pass1 = Pass1::new(Mock::default());

    let mut s = pass1.begin_struct(env.id("Point", 0)).with_hasher(|_| 7);
    s.field(env.decl("x", 1, "S")).unwrap();

    let e = error(s.field(env.decl("y", 2, "S")));
    assert_eq!(
        e.kind(),
        &Pass1Error::HashCollision {
            field: Identifier::new("y"),
            name: Identifier::new("Point"),
        }
    );

    assert_eq!(e.kind().to_string(), "Hash collision! y in Point...");
    assert_eq!(e.notes().len(), 2);
    assert_eq!(e.notes()[0].location(), Some(&env.at(1)));
    assert_eq!(e.notes()[0].message(), "...has the same fnv1a hash as:");
    assert_eq!(e.notes()[1].location(), None);
}

#[test]
fn globals() {
    let env = Env::new();
    let mut pass1 = Pass1::new(Mock::default());

    let mut sram = env.mods();
    sram.enable = ModFlags::SRAM;
    let var = pass1
        .global_var(env.decl("save", 1, "U"), Some("0".into()), Some(sram.clone()))
        .unwrap();

    assert_eq!(var.init.as_deref(), Some("<0>"));

    let e = error(pass1.global_const(env.decl("k", 2, "U"), "1".into(), Some(sram)));
    assert_eq!(e.kind(), &Pass1Error::Mods(ModsError::Flag("sram")));

    let mut dpcm = env.mods();
    dpcm.enable = ModFlags::DPCM;
    let constant = pass1
        .global_const(env.decl("sample", 3, "U"), "data".into(), Some(dpcm))
        .unwrap();

    assert_eq!(constant.init, "<data>");
    assert_eq!(constant.global, 1);

    let registry = pass1.into_registry();
    assert_eq!(registry.globals, ["save", "sample"]);
    assert!(registry
        .conversions
        .iter()
        .all(|(_, class)| *class == IdepClass::Type));
}

// === Macros ===

#[test]
fn macro_invocation() {
    let env = Env::new();
    let mut pass1 = Pass1::new(Mock::default());
    let template = Source::new("greet.macrofab", "#:x:# hello #x#");

    let expanded = pass1
        .invoke_macro(&env.at(5), &template, &["Bob"])
        .unwrap();

    assert_eq!(expanded.name(), "greet.macrofab");
    assert_eq!(expanded.content(), b" hello Bob");

    let broken = Source::new("broken.macrofab", "#y#");
    let e = error(pass1.invoke_macro(&env.at(5), &broken, &["Bob"]));

    assert_eq!(e.kind(), &Pass1Error::Macro);
    assert_eq!(e.error().location(), &env.at(5));
    assert_eq!(
        e.notes()[0].message(),
        "Macro parameter #y# must be declared before use."
    );

    assert_eq!(e.notes()[0].location().unwrap().range(), 0..3);
}
