//! Macro definitions, read from the output of `clang -E -dD`. That output keeps every `#define`
//! in place between linemarkers, so each definition can be traced back to the header that made
//! it.

use std::path::{Path, PathBuf};
use tracing::trace;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MacroDef {
    pub name: String,
    /// Replacement text, trimmed. Empty for `#define NAME`.
    pub value: String,
    /// `value` split into preprocessing tokens.
    pub tokens: Vec<String>,
    /// `#define NAME(args) ...`. These never become constants.
    pub function_like: bool,
}

impl MacroDef {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> MacroDef {
        let value = value.into().trim().to_string();
        MacroDef {
            name: name.into(),
            tokens: tokenize(&value),
            value,
            function_like: false,
        }
    }
}

/// Extracts the macros defined in files under `scope` (every file when `scope` is `None`), in
/// definition order. `#undef` removes an earlier definition; a repeated definition keeps the
/// first.
pub fn parse_macro_dump(dump: &str, scope: Option<&Path>) -> Vec<MacroDef> {
    let mut macros: Vec<MacroDef> = Vec::new();
    let mut current: Option<PathBuf> = None;
    for line in dump.lines() {
        if let Some(file) = linemarker_file(line) {
            current = Some(file);
            continue;
        }
        let in_scope = match (scope, &current) {
            (None, _) => true,
            (Some(scope), Some(file)) => file.starts_with(scope),
            (Some(_), None) => false,
        };
        if let Some(rest) = line.strip_prefix("#define ") {
            if !in_scope {
                continue;
            }
            let Some(def) = parse_define(rest) else {
                continue;
            };
            if macros.iter().any(|m| m.name == def.name) {
                trace!("Ignoring redefinition of {}", def.name);
                continue;
            }
            macros.push(def);
        } else if let Some(name) = line.strip_prefix("#undef ") {
            if in_scope {
                let name = name.trim();
                macros.retain(|m| m.name != name);
            }
        }
    }
    macros
}

/// Returns the file named by a `# 12 "path" flags` linemarker.
fn linemarker_file(line: &str) -> Option<PathBuf> {
    let rest = line.strip_prefix("# ").or_else(|| line.strip_prefix("#line "))?;
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_digit()).trim_start();
    let quoted = rest.strip_prefix('"')?;
    let mut path = String::new();
    let mut chars = quoted.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => return Some(PathBuf::from(path)),
            '\\' => path.push(chars.next()?),
            c => path.push(c),
        }
    }
    None
}

fn parse_define(rest: &str) -> Option<MacroDef> {
    let name_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    if name_len == 0 {
        return None;
    }
    let (name, after) = rest.split_at(name_len);
    let mut def = MacroDef::new(name, after);
    if after.starts_with('(') {
        def.function_like = true;
        let body = after.find(')').map_or("", |close| &after[close + 1..]);
        def.value = body.trim().to_string();
        def.tokens = tokenize(&def.value);
    }
    Some(def)
}

const PUNCTUATORS: &[&str] = &[
    "<<", ">>", "<=", ">=", "==", "!=", "&&", "||", "##", "->", "++", "--",
];

/// Splits macro replacement text into preprocessing tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let start = i;
        if c.is_whitespace() {
            i += 1;
            continue;
        } else if c == '"' || c == '\'' {
            i += 1;
            while i < chars.len() && chars[i] != c {
                if chars[i] == '\\' {
                    i += 1;
                }
                i += 1;
            }
            i = (i + 1).min(chars.len());
        } else if c.is_ascii_digit()
            || (c == '.' && chars.get(i + 1).is_some_and(char::is_ascii_digit))
        {
            let hex = c == '0' && matches!(chars.get(i + 1), Some('x' | 'X'));
            i += 1;
            while i < chars.len() {
                let d = chars[i];
                let exponent_sign = (d == '+' || d == '-')
                    && matches!(chars[i - 1], 'e' | 'E' | 'p' | 'P')
                    && !hex;
                if d.is_ascii_alphanumeric() || d == '.' || d == '_' || exponent_sign {
                    i += 1;
                } else {
                    break;
                }
            }
        } else if c.is_alphabetic() || c == '_' {
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
        } else {
            let pair: String = chars[i..(i + 2).min(chars.len())].iter().collect();
            i += if PUNCTUATORS.contains(&pair.as_str()) { 2 } else { 1 };
        }
        tokens.push(chars[start..i].iter().collect());
    }
    tokens
}
