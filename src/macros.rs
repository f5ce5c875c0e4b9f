/// Retorna un error estructural ubicado, sin notas.
macro_rules! fail {
    ($location:expr, $error:expr) => {
        return Err(crate::error::Annotated::new(crate::source::Located::at(
            $error,
            ::std::clone::Clone::clone($location),
        )))
    };
}

/// Valida un bloque de modificadores opcional.
macro_rules! validate_mods {
    ($mods:expr) => {
        validate_mods!($mods, crate::mods::ModFlags::empty())
    };

    ($mods:expr, $flags:expr) => {
        validate_mods!($mods, $flags, crate::mods::ModLists::empty(), false)
    };

    ($mods:expr, $flags:expr, $lists:expr, $handlers:expr) => {
        if let Some(mods) = &$mods {
            mods.validate($flags, $lists, $handlers)?;
        }
    };
}
