//! Typedefs and records of every parsed header, by name.

use c_ast::ParsedHeader;
use c_ast::ctype::CType;
use c_ast::decls::{Decl, RecordDef};
use std::collections::HashMap;
use tracing::trace;

#[derive(Debug, Default)]
pub struct TypeRegistry {
    typedefs: HashMap<String, CType>,
    records: HashMap<String, RecordDef>,
}

impl TypeRegistry {
    /// Adds the declarations of `header`. The first typedef of a name wins; a complete record
    /// definition replaces a forward declaration.
    pub fn register(&mut self, header: &ParsedHeader) {
        for decl in header.included.iter().chain(&header.decls) {
            match decl {
                Decl::Typedef(typedef) => {
                    self.typedefs
                        .entry(typedef.name.clone())
                        .or_insert_with(|| typedef.underlying.clone());
                }
                Decl::Record(record) => {
                    let Some(name) = &record.name else { continue };
                    match self.records.get(name) {
                        Some(known) if known.complete || !record.complete => {
                            trace!("{name} already registered");
                        }
                        _ => {
                            self.records.insert(name.clone(), record.clone());
                        }
                    }
                }
                Decl::Enum(_) | Decl::Function(_) => {}
            }
        }
    }

    pub fn typedef(&self, name: &str) -> Option<&CType> {
        self.typedefs.get(name)
    }

    pub fn record(&self, name: &str) -> Option<&RecordDef> {
        self.records.get(name)
    }

    /// A record with no definition in any header. Only pointers to it can cross the boundary.
    pub fn is_opaque(&self, name: &str) -> bool {
        !self.records.get(name).is_some_and(|r| r.complete)
    }

    /// `typedef struct X_T *X;` where `struct X_T` is opaque.
    pub fn is_pointer_handle(&self, typedef: &str) -> bool {
        let Some(CType::Pointer(pointee)) = self.typedef(typedef).map(CType::unqualified) else {
            return false;
        };
        matches!(pointee.unqualified(), CType::Record { name: Some(name), .. } if self.is_opaque(name))
    }
}
