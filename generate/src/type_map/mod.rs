//! Native type to C# type name.
//!
//! Names go through the configured substitution table first, then the structure of the type
//! decides. `None` means the type has no C# equivalent and whatever uses it cannot be emitted.

use crate::registry::TypeRegistry;
use c_ast::ctype::{CType, PrimitiveKind};
use csbind_core::config::TypesConfig;
use tracing::trace;

/// C# element types allowed in a `fixed` buffer.
const FIXED_BUFFER_TYPES: &[&str] = &[
    "bool", "byte", "char", "short", "int", "long", "sbyte", "ushort", "uint", "ulong", "float",
    "double",
];

/// Whether `managed` can be the element type of a `fixed` buffer.
pub fn is_fixed_buffer_type(managed: &str) -> bool {
    FIXED_BUFFER_TYPES.contains(&managed)
}

const KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
];

/// A native field or parameter name as a C# identifier, `@`-escaped when it is a keyword.
pub fn identifier(name: &str) -> String {
    if KEYWORDS.contains(&name) {
        format!("@{name}")
    } else {
        name.to_string()
    }
}

pub struct TypeMapper<'a> {
    config: &'a TypesConfig,
    registry: &'a TypeRegistry,
}

impl<'a> TypeMapper<'a> {
    pub fn new(config: &'a TypesConfig, registry: &'a TypeRegistry) -> TypeMapper<'a> {
        TypeMapper { config, registry }
    }

    /// Maps a type used by value: a field, parameter or return type.
    pub fn map(&self, ty: &CType) -> Option<String> {
        self.map_as(ty, false)
    }

    /// The substitution table entry for `name`, or `nint` for a handle prefix.
    fn substitute(&self, name: &str) -> Option<String> {
        if let Some(mapping) = self.config.mappings.iter().find(|m| m.native == name) {
            return Some(mapping.managed.clone());
        }
        self.config
            .handle_prefixes
            .iter()
            .any(|prefix| name.starts_with(prefix.as_str()))
            .then(|| "nint".to_string())
    }

    fn clean_name(&self, name: &str) -> String {
        self.substitute(name).unwrap_or_else(|| name.to_string())
    }

    /// `pointer` is set when the result names the pointee of a pointer (or the element of an
    /// array) and should come back as a pointer type.
    fn map_as(&self, ty: &CType, pointer: bool) -> Option<String> {
        let star = |name: String| if pointer { name + "*" } else { name };
        match ty {
            CType::Primitive(kind) => primitive(*kind, pointer),
            CType::Qualified { inner, .. } => self.map_as(inner, pointer),
            CType::Enum(Some(name)) => Some(star(self.clean_name(name))),
            CType::Enum(None) => None,
            CType::Typedef(name) => self.typedef(name, pointer),
            CType::Record { name: Some(name), .. } => Some(star(self.clean_name(name))),
            CType::Record { name: None, .. } => None,
            CType::Pointer(pointee) => self.pointer(pointee).map(star),
            CType::Array { element, .. } => self.map_as(element, true),
            CType::Function { .. } => None,
        }
    }

    fn typedef(&self, name: &str, pointer: bool) -> Option<String> {
        let star = |name: String| if pointer { name + "*" } else { name };
        if let Some(managed) = self.substitute(name) {
            return Some(star(managed));
        }
        if self.config.keep_typedefs.iter().any(|k| k == name)
            || self.registry.is_pointer_handle(name)
        {
            return Some(star(name.to_string()));
        }
        match self.registry.typedef(name) {
            Some(underlying) => self.map_as(underlying, pointer),
            None => {
                trace!("Unknown typedef {name}");
                None
            }
        }
    }

    fn pointer(&self, pointee: &CType) -> Option<String> {
        if let Some(function) = self.function_type(pointee) {
            return Some(self.function_pointer(function));
        }
        match pointee {
            CType::Qualified {
                qualifier,
                inner,
            } if qualifier.is_const() && **inner == CType::Primitive(PrimitiveKind::Void) => {
                Some("void*".to_string())
            }
            _ => self.map_as(pointee, true),
        }
    }

    /// Looks through qualifiers and typedefs for a function type, as in `SDL_main_func *`.
    fn function_type<'t>(&'t self, ty: &'t CType) -> Option<&'t CType> {
        match ty.unqualified() {
            function @ CType::Function { .. } => Some(function),
            CType::Typedef(name) if self.substitute(name).is_none() => {
                self.function_type(self.registry.typedef(name)?)
            }
            _ => None,
        }
    }

    /// `delegate* unmanaged<P..., R>`. Boolean-like names become their integer type; anything
    /// unmappable turns the whole pointer into `nint`.
    pub fn function_pointer(&self, function: &CType) -> String {
        let CType::Function {
            ret,
            params,
            variadic: false,
        } = function
        else {
            return "nint".to_string();
        };
        let parts: Option<Vec<String>> = params
            .iter()
            .chain(std::iter::once(&**ret))
            .map(|part| self.callback_part(part))
            .collect();
        match parts {
            Some(parts) => format!("delegate* unmanaged<{}>", parts.join(", ")),
            None => "nint".to_string(),
        }
    }

    fn callback_part(&self, ty: &CType) -> Option<String> {
        if let CType::Typedef(name) = ty.unqualified() {
            if let Some(mapping) = self.config.bool_like.iter().find(|m| m.native == *name) {
                return Some(mapping.managed.clone());
            }
        }
        let mapped = self.map(ty)?;
        Some(
            self.config
                .bool_like
                .iter()
                .find(|m| m.native == mapped)
                .map_or(mapped, |m| m.managed.clone()),
        )
    }
}

fn primitive(kind: PrimitiveKind, pointer: bool) -> Option<String> {
    use PrimitiveKind::*;
    let name = match kind {
        Void => return Some(if pointer { "nint" } else { "void" }.to_string()),
        Bool => "bool",
        Char | SignedChar => "sbyte",
        UnsignedChar => "byte",
        WChar | UnsignedShort => "ushort",
        Short => "short",
        Int => "int",
        UnsignedInt => "uint",
        // Width follows the platform ABI, which these interop types track.
        Long => "CLong",
        UnsignedLong => "CULong",
        LongLong => "long",
        UnsignedLongLong => "ulong",
        Float => "float",
        Double => "double",
        LongDouble | Int128 | UnsignedInt128 => return None,
    };
    Some(if pointer {
        format!("{name}*")
    } else {
        name.to_string()
    })
}

#[cfg(test)]
mod tests;
