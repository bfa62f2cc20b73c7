//! `Constants.cs`: macros and anonymous enum members as members of the static partial class.
//!
//! The C# type is inferred from the surface syntax of the replacement text, the way a reader
//! skimming the header would guess it.

use crate::type_map::{TypeMapper, is_fixed_buffer_type};
use c_ast::macros::MacroDef;
use csbind_core::GeneratedFile;
use csbind_core::code_writer::CodeWriter;
use csbind_core::config::Config;
use std::collections::HashMap;
use tracing::{debug, warn};

/// How a constant is declared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Constant {
    /// `public const {ty} NAME = value;`
    Const { ty: String, value: String },
    /// `public static readonly {ty} NAME = value;`
    Readonly { ty: String, value: String },
    /// `public static ReadOnlySpan<byte> NAME => value;`
    Utf8 { value: String },
}

impl Constant {
    fn declaration(&self, name: &str) -> String {
        match self {
            Constant::Const { ty, value } => format!("public const {ty} {name} = {value};"),
            Constant::Readonly { ty, value } => {
                format!("public static readonly {ty} {name} = {value};")
            }
            Constant::Utf8 { value } => {
                format!("public static ReadOnlySpan<byte> {name} => {value};")
            }
        }
    }

    /// The same declaration kind and type with a different value.
    fn with_value(&self, value: String) -> Constant {
        match self {
            Constant::Const { ty, .. } => Constant::Const {
                ty: ty.clone(),
                value,
            },
            Constant::Readonly { ty, .. } => Constant::Readonly {
                ty: ty.clone(),
                value,
            },
            Constant::Utf8 { .. } => Constant::Utf8 { value },
        }
    }
}

/// Strips enclosing parentheses and joins the tokens without whitespace. `ULL` and `LL`
/// suffixes become `UL` and `L`, which C# accepts.
pub fn normalize(tokens: &[String]) -> String {
    strip_parens(tokens)
        .iter()
        .map(|token| {
            let is_number = token.starts_with(|c: char| c.is_ascii_digit());
            let lower = token.to_ascii_lowercase();
            if is_number && lower.ends_with("ll") {
                let cut = token.len() - 2;
                format!("{}L", &token[..cut])
            } else {
                token.clone()
            }
        })
        .collect()
}

fn strip_parens(tokens: &[String]) -> &[String] {
    let mut tokens = tokens;
    while tokens.len() >= 2
        && tokens[0] == "("
        && tokens[tokens.len() - 1] == ")"
        && closes_at_end(tokens)
    {
        tokens = &tokens[1..tokens.len() - 1];
    }
    tokens
}

/// Whether the `(` at the start of `tokens` is closed by the last token.
fn closes_at_end(tokens: &[String]) -> bool {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        match token.as_str() {
            "(" => depth += 1,
            ")" => {
                depth -= 1;
                if depth == 0 {
                    return i == tokens.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}

fn is_hex(value: &str) -> bool {
    value.starts_with("0x") || value.starts_with("0X")
}

/// Starts with a digit, or with `-` or `.` and then a digit.
fn is_numeric(value: &str) -> bool {
    let unsigned = value.strip_prefix('-').unwrap_or(value);
    let digits = unsigned.strip_prefix('.').unwrap_or(unsigned);
    digits.starts_with(|c: char| c.is_ascii_digit())
}

/// Infers the C# type of a normalized literal, or `None` when it is not a recognizable number.
/// Suffixes are only read off numeric text.
pub fn infer_type(value: &str) -> Option<&'static str> {
    let lower = value.to_ascii_lowercase();
    let numeric = is_numeric(value);
    let ty = if !numeric {
        if value.contains("<<") {
            "int"
        } else {
            return None;
        }
    } else if lower.ends_with('f') && !is_hex(value) {
        "float"
    } else if lower.ends_with("ul") || lower.ends_with("lu") {
        "ulong"
    } else if lower.ends_with('u') {
        "uint"
    } else if lower.ends_with('l') {
        "long"
    } else if value.parse::<u32>().is_ok() || is_hex(value) {
        "uint"
    } else if value.parse::<i32>().is_ok() {
        "int"
    } else if value.contains('.') && value.parse::<f64>().is_ok() {
        "double"
    } else if value.contains("<<") {
        "int"
    } else {
        return None;
    };
    Some(ty)
}

pub struct ConstantsEmitter<'a> {
    config: &'a Config,
    mapper: &'a TypeMapper<'a>,
    /// Constants emitted so far, for expressions that refer to them.
    known: HashMap<String, Constant>,
}

impl<'a> ConstantsEmitter<'a> {
    pub fn new(config: &'a Config, mapper: &'a TypeMapper<'a>) -> ConstantsEmitter<'a> {
        ConstantsEmitter {
            config,
            mapper,
            known: HashMap::new(),
        }
    }

    pub fn emit<'m>(
        mut self,
        constants: impl Iterator<Item = (&'m str, &'m MacroDef)>,
    ) -> GeneratedFile {
        let config = self.config;
        let mut writer = CodeWriter::new("Constants.cs", &config.namespace, &[], None);
        let header = format!(
            "{} static partial class {}",
            config.visibility(),
            config.class_name
        );
        writer.block(header, |w| {
            for (name, def) in constants {
                let Some(constant) = self.constant(def) else {
                    warn!("Skipping constant {name}: cannot form a value from {:?}", def.value);
                    continue;
                };
                w.write_line(format!("/// <unmanaged>{name}</unmanaged>"));
                w.write_line(constant.declaration(name));
                self.known.insert(name.to_string(), constant);
            }
        });
        writer.finish()
    }

    /// Decides the declaration of one macro.
    pub fn constant(&self, def: &MacroDef) -> Option<Constant> {
        let constants = &self.config.constants;
        if let Some(over) = constants.overrides.iter().find(|o| o.name == def.name) {
            return Some(Constant::Readonly {
                ty: over.ty.clone(),
                value: over.value.clone(),
            });
        }
        if let Some(composite) = constants.composite.as_ref().filter(|c| c.name == def.name) {
            // NAME(a, b, c): the arguments are tokens 2, 4 and 6.
            let args: Option<Vec<&String>> =
                [2, 4, 6].iter().map(|&i| def.tokens.get(i)).collect();
            let args: Vec<&str> = args?
                .into_iter()
                .map(String::as_str)
                .chain(composite.extra_args.iter().map(String::as_str))
                .collect();
            let ty = &composite.type_name;
            return Some(Constant::Readonly {
                ty: ty.clone(),
                value: format!("new {ty}({})", args.join(", ")),
            });
        }

        if !def.tokens.is_empty() && def.tokens.iter().all(|t| t.starts_with('"')) {
            // Adjacent literals concatenate.
            let text: String = def
                .tokens
                .iter()
                .map(|t| t.strip_prefix('"').and_then(|t| t.strip_suffix('"')).unwrap_or(t))
                .collect();
            return Some(Constant::Utf8 {
                value: format!("\"{text}\"u8"),
            });
        }
        let value = normalize(&def.tokens);
        if let Some(ty) = infer_type(&value) {
            return Some(Constant::Const {
                ty: ty.to_string(),
                value,
            });
        }
        if let Some(cast) = self.cast(&def.tokens) {
            return Some(cast);
        }
        let first_identifier = def
            .tokens
            .iter()
            .find(|t| t.starts_with(|c: char| c.is_alphabetic() || c == '_'));
        if let Some(inherited) = first_identifier.and_then(|t| self.known.get(t)) {
            debug!("{} takes its type from {first_identifier:?}", def.name);
            return Some(inherited.with_value(value));
        }
        Some(Constant::Const {
            ty: "string".to_string(),
            value: format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\"")),
        })
    }

    /// `(Type)literal`, where `Type` maps to a C# type. Built-in numeric targets stay `const`.
    fn cast(&self, tokens: &[String]) -> Option<Constant> {
        let [open, name, close, rest @ ..] = strip_parens(tokens) else {
            return None;
        };
        if open != "(" || close != ")" || rest.is_empty() {
            return None;
        }
        let ty = self.mapper.map(&name.parse().ok()?)?;
        let literal = normalize(rest);
        infer_type(&literal)?;
        let value = format!("({ty}){literal}");
        Some(if is_fixed_buffer_type(&ty) {
            Constant::Const { ty, value }
        } else {
            Constant::Readonly { ty, value }
        })
    }
}

#[cfg(test)]
mod tests;
