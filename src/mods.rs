//! Modificadores de declaraciones y sentencias.
//!
//! Casi cualquier constructo puede ir acompañado de un bloque de
//! modificadores que habilita o deshabilita banderas (`+inline`,
//! `-zero_page`), enumera listas explícitas (`vars`, `preserves`, ...)
//! o asocia un manejador `nmi`/`irq`. Cada constructo acepta solo un
//! subconjunto; [`Mods::validate`] rechaza el resto.

use crate::{
    lex::Identifier,
    source::{Located, Location},
};

use bitflags::bitflags;
use thiserror::Error;

bitflags! {
    /// Banderas que un bloque de modificadores puede habilitar o deshabilitar.
    pub struct ModFlags: u16 {
        const ZERO_PAGE = 1 << 0;
        const ALIGN     = 1 << 1;
        const INLINE    = 1 << 2;
        const GRAPHVIZ  = 1 << 3;
        const STATIC    = 1 << 4;
        const INFO      = 1 << 5;
        const SLOPPY    = 1 << 6;
        const SRAM      = 1 << 7;
        const DPCM      = 1 << 8;
        const UNROLL    = 1 << 9;
        const UNLOOP    = 1 << 10;
    }
}

bitflags! {
    /// Listas explícitas.
    pub struct ModLists: u8 {
        const VARS      = 1 << 0;
        const DATA      = 1 << 1;
        const EMPLOYS   = 1 << 2;
        const PRESERVES = 1 << 3;
        const STOWS     = 1 << 4;
    }
}

const FLAG_NAMES: &[(ModFlags, &str)] = &[
    (ModFlags::ZERO_PAGE, "zero_page"),
    (ModFlags::ALIGN, "align"),
    (ModFlags::INLINE, "inline"),
    (ModFlags::GRAPHVIZ, "graphviz"),
    (ModFlags::STATIC, "static"),
    (ModFlags::INFO, "info"),
    (ModFlags::SLOPPY, "sloppy"),
    (ModFlags::SRAM, "sram"),
    (ModFlags::DPCM, "dpcm"),
    (ModFlags::UNROLL, "unroll"),
    (ModFlags::UNLOOP, "unloop"),
];

const LIST_NAMES: &[(ModLists, &str)] = &[
    (ModLists::VARS, "vars"),
    (ModLists::DATA, "data"),
    (ModLists::EMPLOYS, "employs"),
    (ModLists::PRESERVES, "preserves"),
    (ModLists::STOWS, "stows"),
];

impl ModFlags {
    /// Busca una bandera por nombre.
    pub fn named(name: &str) -> Option<Self> {
        FLAG_NAMES
            .iter()
            .find(|&&(_, flag_name)| flag_name == name)
            .map(|&(flag, _)| flag)
    }

    /// Nombre de la primera bandera presente.
    pub fn first_name(self) -> Option<&'static str> {
        FLAG_NAMES
            .iter()
            .find(|&&(flag, _)| self.contains(flag))
            .map(|&(_, name)| name)
    }
}

impl ModLists {
    /// Busca una lista por nombre.
    pub fn named(name: &str) -> Option<Self> {
        LIST_NAMES
            .iter()
            .find(|&&(_, list_name)| list_name == name)
            .map(|&(list, _)| list)
    }

    /// Nombre de la primera lista presente.
    pub fn first_name(self) -> Option<&'static str> {
        LIST_NAMES
            .iter()
            .find(|&&(list, _)| self.contains(list))
            .map(|&(_, name)| name)
    }
}

/// Modificador no permitido en un constructo.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModsError {
    #[error("Unexpected modifier: {0}.")]
    Flag(&'static str),

    #[error("Unexpected modifier list: {0}.")]
    List(&'static str),

    #[error("Unexpected {0} modifier.")]
    Handler(&'static str),
}

/// Un bloque de modificadores tal como lo produjo el parser.
#[derive(Debug, Clone)]
pub struct Mods {
    pub location: Location,
    pub enable: ModFlags,
    pub disable: ModFlags,
    pub explicit_lists: ModLists,
    pub nmi: Option<Located<Identifier>>,
    pub irq: Option<Located<Identifier>>,
}

impl Mods {
    /// Bloque vacío.
    pub fn new(location: Location) -> Self {
        Mods {
            location,
            enable: ModFlags::empty(),
            disable: ModFlags::empty(),
            explicit_lists: ModLists::empty(),
            nmi: None,
            irq: None,
        }
    }

    /// Falla con el primer modificador que no esté permitido.
    pub fn validate(
        &self,
        flags: ModFlags,
        lists: ModLists,
        accepts_handlers: bool,
    ) -> Result<(), Located<ModsError>> {
        let fail = |error| Err(Located::at(error, self.location.clone()));

        let extra_flags = (self.enable | self.disable) - flags;
        if let Some(name) = extra_flags.first_name() {
            return fail(ModsError::Flag(name));
        }

        let extra_lists = self.explicit_lists - lists;
        if let Some(name) = extra_lists.first_name() {
            return fail(ModsError::List(name));
        }

        if !accepts_handlers {
            if self.nmi.is_some() {
                return fail(ModsError::Handler("nmi"));
            } else if self.irq.is_some() {
                return fail(ModsError::Handler("irq"));
            }
        }

        Ok(())
    }

    /// Determina si una bandera se mencionó en cualquier sentido.
    pub fn mentions(&self, flag: ModFlags) -> bool {
        (self.enable | self.disable).intersects(flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Source;

    fn mods() -> Mods {
        let source = Source::new("mods.fab", ": +inline -zero_page");
        Mods::new(Location::new(&source, 0..20))
    }

    #[test]
    fn empty_block_is_always_valid() {
        assert_eq!(mods().validate(ModFlags::empty(), ModLists::empty(), false), Ok(()));
    }

    #[test]
    fn disallowed_flag() {
        let mut mods = mods();
        mods.enable = ModFlags::INLINE;
        mods.disable = ModFlags::ZERO_PAGE;

        assert_eq!(
            mods.validate(ModFlags::ZERO_PAGE | ModFlags::INLINE, ModLists::empty(), false),
            Ok(())
        );

        let error = mods
            .validate(ModFlags::INLINE, ModLists::empty(), false)
            .unwrap_err();
        assert_eq!(error.val(), &ModsError::Flag("zero_page"));
        assert!(mods.mentions(ModFlags::ZERO_PAGE));
    }

    #[test]
    fn disallowed_list() {
        let mut mods = mods();
        mods.explicit_lists = ModLists::VARS | ModLists::PRESERVES;

        let error = mods
            .validate(ModFlags::all(), ModLists::VARS, true)
            .unwrap_err();
        assert_eq!(error.into_inner(), ModsError::List("preserves"));
    }

    #[test]
    fn handlers() {
        let mut mods = mods();
        let location = mods.location.clone();
        mods.irq = Some(Located::at(Identifier::new("on_irq"), location));

        assert_eq!(mods.validate(ModFlags::empty(), ModLists::empty(), true), Ok(()));
        assert_eq!(
            mods.validate(ModFlags::empty(), ModLists::empty(), false)
                .unwrap_err()
                .into_inner(),
            ModsError::Handler("irq")
        );
    }

    #[test]
    fn names() {
        assert_eq!(ModFlags::named("sram"), Some(ModFlags::SRAM));
        assert_eq!(ModLists::named("stows"), Some(ModLists::STOWS));
        assert_eq!(ModFlags::named("fast"), None);
    }
}
