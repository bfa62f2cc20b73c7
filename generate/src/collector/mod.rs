//! Decides which declarations of the parsed headers are emitted, and in what order.

use crate::registry::TypeRegistry;
use c_ast::ParsedHeader;
use c_ast::ctype::RecordKind;
use c_ast::decls::{Decl, EnumDef, FunctionDef, RecordDef};
use c_ast::macros::MacroDef;
use csbind_core::config::CollectConfig;
use std::collections::HashSet;
use tracing::{debug, info};

/// Entities in first-seen order, deduplicated by name.
#[derive(Debug)]
pub struct Worklist<T> {
    entries: Vec<(String, T)>,
    seen: HashSet<String>,
}

impl<T> Default for Worklist<T> {
    fn default() -> Self {
        Worklist {
            entries: Vec::new(),
            seen: HashSet::new(),
        }
    }
}

impl<T> Worklist<T> {
    /// Appends `item` unless an entry named `name` already exists. Returns whether it was added.
    pub fn push(&mut self, name: &str, item: T) -> bool {
        if !self.seen.insert(name.to_string()) {
            debug!("{name} already collected");
            return false;
        }
        self.entries.push((name.to_string(), item));
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(name, item)| (name.as_str(), item))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleKind {
    /// A record that is only ever declared, such as `struct SDL_Window`.
    Opaque,
    /// A typedef of a pointer to an opaque record, such as `VkInstance`.
    Pointer,
}

/// Everything selected for emission, plus the type information the emitters resolve against.
#[derive(Debug, Default)]
pub struct Collection {
    pub registry: TypeRegistry,
    /// Macros and the members of anonymous enums.
    pub constants: Worklist<MacroDef>,
    pub enums: Worklist<EnumDef>,
    pub records: Worklist<RecordDef>,
    pub handles: Worklist<HandleKind>,
    pub functions: Worklist<FunctionDef>,
}

impl Collection {
    /// Registers the types of every header, then collects each header in order.
    pub fn build(config: &CollectConfig, headers: &[ParsedHeader]) -> Collection {
        let mut collection = Collection::default();
        for header in headers {
            collection.registry.register(header);
        }
        let collector = Collector::new(config);
        for header in headers {
            collector.collect(&mut collection, header);
        }
        info!(
            "Collected {} constants, {} enums, {} structs, {} handles, {} functions",
            collection.constants.len(),
            collection.enums.len(),
            collection.records.len(),
            collection.handles.len(),
            collection.functions.len()
        );
        collection
    }
}

/// Applies the collection filters of one configuration.
pub struct Collector<'c> {
    config: &'c CollectConfig,
}

impl<'c> Collector<'c> {
    pub fn new(config: &'c CollectConfig) -> Collector<'c> {
        Collector { config }
    }

    pub fn collect(&self, collection: &mut Collection, header: &ParsedHeader) {
        debug!("Collecting {}", header.path.display());
        for def in &header.macros {
            if self.accepts_macro(def) {
                collection.constants.push(&def.name, def.clone());
            }
        }
        for decl in &header.decls {
            match decl {
                Decl::Record(record) => self.collect_record(collection, record),
                Decl::Enum(enumeration) => match &enumeration.name {
                    Some(name) => {
                        collection.enums.push(name, enumeration.clone());
                    }
                    None => {
                        for constant in &enumeration.constants {
                            let def = MacroDef::new(&constant.name, enum_literal(constant.value));
                            collection.constants.push(&constant.name, def);
                        }
                    }
                },
                Decl::Typedef(typedef) => {
                    if collection.registry.is_pointer_handle(&typedef.name) {
                        collection.handles.push(&typedef.name, HandleKind::Pointer);
                    }
                }
                Decl::Function(function) => {
                    if self.accepts_function(function) {
                        collection.functions.push(&function.name, function.clone());
                    }
                }
            }
        }
    }

    fn accepts_macro(&self, def: &MacroDef) -> bool {
        let name = def.name.to_ascii_lowercase();
        let reason = if def.function_like {
            "function-like"
        } else if def.value.is_empty() {
            "empty"
        } else if self
            .config
            .header_guard_suffixes
            .iter()
            .any(|suffix| name.ends_with(&suffix.to_ascii_lowercase()))
        {
            "header guard"
        } else if self
            .config
            .excluded_macros
            .iter()
            .any(|excluded| excluded.eq_ignore_ascii_case(&def.name))
        {
            "excluded"
        } else {
            return true;
        };
        debug!("Skipping macro {} ({reason})", def.name);
        false
    }

    fn collect_record(&self, collection: &mut Collection, record: &RecordDef) {
        let Some(name) = &record.name else {
            debug!("Skipping anonymous top-level record");
            return;
        };
        let reason = if record.kind == RecordKind::Class {
            "class"
        } else if name.ends_with(&self.config.opaque_suffix) {
            "opaque handle target"
        } else if self.config.handwritten_structs.contains(name) {
            "written by hand"
        } else if !record.complete {
            if collection.registry.is_opaque(name) {
                collection.handles.push(name, HandleKind::Opaque);
            }
            return;
        } else if record.is_zero_sized() {
            "zero size"
        } else {
            collection.records.push(name, record.clone());
            return;
        };
        debug!("Skipping record {name} ({reason})");
    }

    fn accepts_function(&self, function: &FunctionDef) -> bool {
        let reason = if function.is_static {
            "static"
        } else if function.inline {
            "inline"
        } else if function.variadic {
            "variadic"
        } else if self.config.excluded_functions.contains(&function.name) {
            "excluded"
        } else {
            return true;
        };
        debug!("Skipping function {} ({reason})", function.name);
        false
    }
}

/// The literal for an enum member value, suffixed so that constant inference picks a type wide
/// enough to hold it.
fn enum_literal(value: i128) -> String {
    if u32::try_from(value).is_ok() || i32::try_from(value).is_ok() {
        value.to_string()
    } else if i64::try_from(value).is_ok() {
        format!("{value}L")
    } else {
        format!("{value}UL")
    }
}

#[cfg(test)]
mod tests;
