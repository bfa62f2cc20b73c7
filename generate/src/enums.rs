//! `Enums.cs`: one C# enum per named native enum.

use crate::type_map::TypeMapper;
use c_ast::decls::EnumDef;
use csbind_core::GeneratedFile;
use csbind_core::code_writer::CodeWriter;
use csbind_core::config::Config;
use tracing::debug;

const INTEGRAL_TYPES: &[&str] = &[
    "byte", "sbyte", "short", "ushort", "int", "uint", "long", "ulong",
];

/// Whether the enum gets `[Flags]`. Besides the configured names and the `Flags` suffix, the
/// non-zero members must be distinct powers of two reaching at least 4, so that a plain
/// `0, 1, 2` sequence stays an ordinary enum.
pub fn is_flags(config: &Config, name: &str, def: &EnumDef) -> bool {
    if config.types.flag_enums.iter().any(|f| f == name) || name.ends_with("Flags") {
        return true;
    }
    let nonzero: Vec<i128> = def
        .constants
        .iter()
        .map(|c| c.value)
        .filter(|&v| v != 0)
        .collect();
    let mut distinct = nonzero.clone();
    distinct.sort_unstable();
    distinct.dedup();
    nonzero.len() >= 2
        && distinct.len() == nonzero.len()
        && nonzero.iter().all(|&v| v > 0 && (v & (v - 1)) == 0)
        && distinct.last().is_some_and(|&max| max >= 4)
}

/// The C# underlying type: the declared fixed type when it is integral, otherwise the narrowest
/// of `int`, `uint`, `long` and `ulong` that holds every value.
pub fn underlying_type(mapper: &TypeMapper, def: &EnumDef) -> &'static str {
    if let Some(fixed) = def.underlying.as_ref().and_then(|ty| mapper.map(ty)) {
        if let Some(ty) = INTEGRAL_TYPES.iter().copied().find(|t| *t == fixed) {
            return ty;
        }
        debug!("Fixed enum type {fixed} is not integral");
    }
    let fits = |min: i128, max: i128| def.constants.iter().all(|c| (min..=max).contains(&c.value));
    if fits(i32::MIN.into(), i32::MAX.into()) {
        "int"
    } else if fits(0, u32::MAX.into()) {
        "uint"
    } else if fits(i64::MIN.into(), i64::MAX.into()) {
        "long"
    } else {
        "ulong"
    }
}

pub fn emit<'e>(
    config: &Config,
    mapper: &TypeMapper,
    enums: impl Iterator<Item = (&'e str, &'e EnumDef)>,
) -> GeneratedFile {
    let mut writer = CodeWriter::new("Enums.cs", &config.namespace, &["System"], None);
    let tag = |w: &mut CodeWriter, name: &str| {
        if config.enum_unmanaged_tag {
            w.write_line(format!("/// <unmanaged>{name}</unmanaged>"));
        }
    };
    for (name, def) in enums {
        tag(&mut writer, name);
        if is_flags(config, name, def) {
            writer.write_line("[Flags]");
        }
        let header = format!(
            "{} enum {name} : {}",
            config.visibility(),
            underlying_type(mapper, def)
        );
        writer.block(header, |w| {
            for constant in &def.constants {
                tag(w, &constant.name);
                w.write_line(format!("{} = {},", constant.name, constant.value));
            }
        });
        writer.blank_line();
    }
    writer.finish()
}
