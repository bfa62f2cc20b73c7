//! `Structs.cs`: sequential-layout mirrors of native structs and explicit-layout unions.
//!
//! Records defined inline in a field become nested structs named `{Parent}_{field}`. Arrays of
//! primitives become `fixed` buffers; arrays of anything else get a small wrapper struct with
//! one field per element.

use crate::type_map::{TypeMapper, identifier, is_fixed_buffer_type};
use c_ast::ctype::{CType, RecordKind};
use c_ast::decls::{FieldDef, RecordDef};
use csbind_core::GeneratedFile;
use csbind_core::code_writer::CodeWriter;
use csbind_core::config::Config;
use tracing::{debug, warn};

const USINGS: &[&str] = &[
    "System.Runtime.InteropServices",
    "System.Runtime.CompilerServices",
    "System.Diagnostics.CodeAnalysis",
];

/// Qualified name of a field with no C# type. A record containing one is not emitted, since a
/// partial layout would be wrong.
struct Unmappable(String);

pub struct StructsEmitter<'a> {
    config: &'a Config,
    mapper: &'a TypeMapper<'a>,
}

impl<'a> StructsEmitter<'a> {
    pub fn new(config: &'a Config, mapper: &'a TypeMapper<'a>) -> StructsEmitter<'a> {
        StructsEmitter { config, mapper }
    }

    pub fn emit<'r>(&self, records: impl Iterator<Item = (&'r str, &'r RecordDef)>) -> GeneratedFile {
        let mut writer = CodeWriter::new(
            "Structs.cs",
            &self.config.namespace,
            USINGS,
            Some("#pragma warning disable CS0649"),
        );
        for (name, def) in records {
            let mut fragment = writer.fragment();
            match self.write_struct(&mut fragment, name, def) {
                Ok(()) => {
                    writer.append(fragment);
                    writer.blank_line();
                }
                Err(Unmappable(field)) => {
                    warn!("Skipping struct {name}: field {field} has no C# type")
                }
            }
        }
        writer.finish()
    }

    fn write_struct(&self, w: &mut CodeWriter, name: &str, def: &RecordDef) -> Result<(), Unmappable> {
        let union = def.kind == RecordKind::Union;
        if union {
            w.write_line("[StructLayout(LayoutKind.Explicit)]");
        }
        let mut result = Ok(());
        w.block(format!("{} partial struct {name}", self.config.visibility()), |w| {
            result = def
                .fields
                .iter()
                .try_for_each(|field| self.write_field(w, name, union, field));
        });
        result
    }

    fn write_field(
        &self,
        w: &mut CodeWriter,
        parent: &str,
        union: bool,
        field: &FieldDef,
    ) -> Result<(), Unmappable> {
        let unmappable = || Unmappable(format!("{parent}.{}", field.name));
        let nested_name = format!("{parent}_{}", field.name);
        let ty = match &field.nested {
            Some(nested) => rename_record(&field.ty, nested.name.as_deref(), &nested_name),
            None => field.ty.clone(),
        };
        let name = identifier(&field.name);

        let mut sizes = Vec::new();
        let mut element = ty.unqualified();
        while let CType::Array { element: inner, size } = element {
            sizes.push(*size);
            element = inner.unqualified();
        }

        if sizes.is_empty() {
            let managed = self.mapper.map(&ty).ok_or_else(unmappable)?;
            if union {
                w.write_line("[FieldOffset(0)]");
            }
            let prefix = if managed.contains('*') { "unsafe " } else { "" };
            w.write_line(format!("public {prefix}{managed} {name};"));
        } else {
            let Some(sizes) = sizes
                .into_iter()
                .collect::<Option<Vec<u64>>>()
                .filter(|sizes| !sizes.contains(&0))
            else {
                debug!("Dropping flexible array member {parent}.{}", field.name);
                return Ok(());
            };
            let managed = self.mapper.map(element).ok_or_else(unmappable)?;
            // The element count has to fit the `int` indexer on the C# side.
            let length = sizes
                .iter()
                .try_fold(1u64, |acc, &n| acc.checked_mul(n))
                .filter(|&n| i32::try_from(n).is_ok())
                .ok_or_else(unmappable)?;
            if union {
                w.write_line("[FieldOffset(0)]");
            }
            if is_fixed_buffer_type(&managed) {
                let extent: Vec<String> = sizes.iter().map(u64::to_string).collect();
                w.write_line(format!(
                    "public unsafe fixed {managed} {name}[{}];",
                    extent.join(" * ")
                ));
            } else {
                fixed_buffer(w, &field.name, &managed, length);
            }
        }

        if let Some(nested) = &field.nested {
            w.blank_line();
            self.write_struct(w, &nested_name, nested)?;
        }
        Ok(())
    }
}

/// `name__FixedBuffer`: `length` fields `e0..` of `element`, an indexer and, when the element is
/// not a pointer, a span over all of them.
fn fixed_buffer(w: &mut CodeWriter, field: &str, element: &str, length: u64) {
    let wrapper = format!("{field}__FixedBuffer");
    let pointer = element.contains('*');
    w.write_line(format!("public {wrapper} {};", identifier(field)));
    w.blank_line();
    w.block(format!("public unsafe struct {wrapper}"), |w| {
        for i in 0..length {
            w.write_line(format!("public {element} e{i};"));
        }
        w.blank_line();
        w.write_line("[UnscopedRef]");
        w.block(format!("public ref {element} this[int index]"), |w| {
            w.write_line("[MethodImpl(MethodImplOptions.AggressiveInlining)]");
            w.block("get", |w| {
                if pointer {
                    w.block(format!("fixed ({element}* pThis = &e0)"), |w| {
                        w.write_line("return ref pThis[index];");
                    });
                } else {
                    w.write_line("return ref AsSpan()[index];");
                }
            });
        });
        if !pointer {
            w.blank_line();
            w.write_line("[UnscopedRef]");
            w.write_line("[MethodImpl(MethodImplOptions.AggressiveInlining)]");
            w.block(format!("public Span<{element}> AsSpan()"), |w| {
                w.write_line(format!("return MemoryMarshal.CreateSpan(ref e0, {length});"));
            });
        }
    });
}

/// Replaces the record `from` (anonymous when `None`) with `to` wherever it appears in `ty`.
fn rename_record(ty: &CType, from: Option<&str>, to: &str) -> CType {
    let rename = |inner: &CType| Box::new(rename_record(inner, from, to));
    match ty {
        CType::Record { kind, name } if name.as_deref() == from => CType::Record {
            kind: *kind,
            name: Some(to.to_string()),
        },
        CType::Qualified { qualifier, inner } => CType::Qualified {
            qualifier: *qualifier,
            inner: rename(inner),
        },
        CType::Pointer(pointee) => CType::Pointer(rename(pointee)),
        CType::Array { element, size } => CType::Array {
            element: rename(element),
            size: *size,
        },
        other => other.clone(),
    }
}
