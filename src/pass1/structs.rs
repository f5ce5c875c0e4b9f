//! Definiciones de estructuras.
//!
//! Los campos se indexan por el hash FNV-1a de 64 bits de su nombre.
//! Dos campos con el mismo nombre son una redefinición; dos nombres
//! distintos con el mismo hash son una colisión, la cual se reporta
//! aparte porque el usuario no cometió un error de escritura.

use super::{IdepClass, Pass1Error, Pass1Result, Registry};

use crate::{
    error::Annotated,
    ir::{Field, VarDecl},
    lex::Identifier,
    source::Located,
};

use rustc_hash::FxHashMap;
use tracing::debug;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Hash FNV-1a de 64 bits.
pub fn fnv1a(name: &str) -> u64 {
    name.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
    })
}

/// Estructura completamente construida.
#[derive(Debug)]
pub struct DefinedStruct<R: Registry> {
    pub global: R::Global,
    pub name: Located<Identifier>,
    pub fields: Vec<Field<R::Type>>,
}

/// Sesión de construcción de una estructura.
pub struct StructBuilder<'p, R: Registry> {
    registry: &'p mut R,
    global: R::Global,
    name: Located<Identifier>,
    fields: Vec<Field<R::Type>>,
    by_hash: FxHashMap<u64, usize>,
    hasher: fn(&str) -> u64,
}

impl<'p, R: Registry> StructBuilder<'p, R> {
    pub(super) fn new(registry: &'p mut R, name: Located<Identifier>) -> Self {
        debug!(name = %name.val(), "begin struct");

        let global = registry.lookup_global(&name);
        StructBuilder {
            registry,
            global,
            name,
            fields: Vec::new(),
            by_hash: FxHashMap::default(),
            hasher: fnv1a,
        }
    }

    /// Reemplaza la función de hash de los campos.
    pub fn with_hasher(self, hasher: fn(&str) -> u64) -> Self {
        debug_assert!(self.fields.is_empty());
        StructBuilder { hasher, ..self }
    }

    pub fn field(&mut self, decl: VarDecl<R::Type>) -> Pass1Result<()> {
        let hash = (self.hasher)(decl.name.val().as_ref());

        if let Some(&existing) = self.by_hash.get(&hash) {
            let previous = &self.fields[existing].decl.name;
            let field = decl.name.val().clone();
            let name = self.name.val().clone();
            let at = decl.name.location().clone();

            return Err(if previous.val() == decl.name.val() {
                Annotated::new(Located::at(Pass1Error::FieldRedefined { field, name }, at))
                    .note(previous.location().clone(), "Previous definition here:")
            } else {
                Annotated::new(Located::at(Pass1Error::HashCollision { field, name }, at))
                    .note(
                        previous.location().clone(),
                        "...has the same fnv1a hash as:",
                    )
                    .hint("Rename one to avoid this issue.")
            });
        }

        self.registry.uses_type(&decl.ty, IdepClass::Type);
        self.by_hash.insert(hash, self.fields.len());
        self.fields.push(Field { decl, hash });

        Ok(())
    }

    pub fn end_struct(self) -> DefinedStruct<R> {
        debug!(name = %self.name.val(), fields = self.fields.len(), "end struct");

        DefinedStruct {
            global: self.global,
            name: self.name,
            fields: self.fields,
        }
    }
}
