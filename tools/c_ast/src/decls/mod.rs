//! The declaration model: typedefs, records, enums and functions read out of a clang
//! translation unit, with their types parsed into [CType].

use crate::ctype::{CType, RecordKind, TypeParseError};
use crate::{Clang, QualType, file_of};
use clang_ast::Node;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, trace, warn};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypedefDef {
    pub name: String,
    pub underlying: CType,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub ty: CType,
    /// The record defined inline for this field (`struct { int x; } pos;`).
    pub nested: Option<RecordDef>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordDef {
    pub name: Option<String>,
    pub kind: RecordKind,
    /// False for forward declarations such as `struct SDL_Window;`.
    pub complete: bool,
    pub fields: Vec<FieldDef>,
}

impl RecordDef {
    /// A record without a complete definition, or with no fields, has no size to mirror.
    pub fn is_zero_sized(&self) -> bool {
        !self.complete || self.fields.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumConstant {
    pub name: String,
    pub value: i128,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumDef {
    pub name: Option<String>,
    /// The fixed underlying type (`enum X : Uint8`), when the header declares one.
    pub underlying: Option<CType>,
    pub constants: Vec<EnumConstant>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamDef {
    pub name: Option<String>,
    pub ty: CType,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionDef {
    pub name: String,
    pub ret: CType,
    pub params: Vec<ParamDef>,
    pub variadic: bool,
    pub is_static: bool,
    pub inline: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decl {
    Typedef(TypedefDef),
    Record(RecordDef),
    Enum(EnumDef),
    Function(FunctionDef),
}

#[derive(Debug, Error)]
pub enum DeclError {
    #[error(transparent)]
    Type(#[from] TypeParseError),

    #[error("bit-field {0} has no explicit-layout equivalent")]
    Bitfield(String),

    #[error("enum constant {name} has no usable value ({value:?})")]
    EnumValue { name: String, value: Option<String> },

    #[error("declared type {0:?} is not a function type")]
    NotAFunction(String),
}

fn parse(qtype: &QualType) -> Result<CType, TypeParseError> {
    qtype.qual_type.parse()
}

fn in_scope(node: &Node<Clang>, scope: Option<&Path>) -> bool {
    match scope {
        None => true,
        Some(scope) => file_of(node.kind.loc()).is_some_and(|file| Path::new(file).starts_with(scope)),
    }
}

/// Converts the top-level declarations of a translation unit. Declarations outside `scope` are
/// skipped; declarations that cannot be converted are skipped with a warning.
pub fn extract_decls(root: &Node<Clang>, scope: Option<&Path>) -> Vec<Decl> {
    extract_matching(root, |node| in_scope(node, scope))
}

/// The declarations under `scope` that are not in `main`: what `main` includes from its sibling
/// headers.
pub fn extract_included(root: &Node<Clang>, scope: &Path, main: &Path) -> Vec<Decl> {
    extract_matching(root, |node| {
        in_scope(node, Some(scope)) && !in_scope(node, Some(main))
    })
}

fn extract_matching(root: &Node<Clang>, keep: impl Fn(&Node<Clang>) -> bool) -> Vec<Decl> {
    let mut decls = Vec::new();
    for node in &root.inner {
        if !keep(node) {
            continue;
        }
        match convert(node) {
            Ok(Some(decl)) => decls.push(decl),
            Ok(None) => {}
            Err(e) => warn!("Skipping {}: {e}", node.kind.name().unwrap_or("<anonymous>")),
        }
    }
    name_anonymous_tags(&mut decls);
    decls
}

fn convert(node: &Node<Clang>) -> Result<Option<Decl>, DeclError> {
    let decl = match &node.kind {
        Clang::TypedefDecl { name, qtype, .. } => Decl::Typedef(TypedefDef {
            name: name.clone(),
            underlying: parse(qtype)?,
        }),
        Clang::RecordDecl { .. } => Decl::Record(record(node)?),
        Clang::EnumDecl {
            name,
            fixed_underlying_type,
            ..
        } => Decl::Enum(enumeration(name, fixed_underlying_type, &node.inner)?),
        Clang::FunctionDecl {
            name,
            storage_class,
            qtype,
            variadic,
            inline,
            ..
        } => {
            let CType::Function { ret, .. } = parse(qtype)? else {
                return Err(DeclError::NotAFunction(qtype.qual_type.clone()));
            };
            let params = node
                .inner
                .iter()
                .filter_map(|child| match &child.kind {
                    Clang::ParmVarDecl { name, qtype, .. } => Some(parse(qtype).map(|ty| ParamDef {
                        name: name.clone().filter(|n| !n.is_empty()),
                        ty,
                    })),
                    _ => None,
                })
                .collect::<Result<Vec<_>, _>>()?;
            Decl::Function(FunctionDef {
                name: name.clone(),
                ret: *ret,
                params,
                variadic: *variadic,
                is_static: storage_class.as_deref() == Some("static"),
                inline: *inline,
            })
        }
        other => {
            trace!("Ignoring top-level {other:?}");
            return Ok(None);
        }
    };
    Ok(Some(decl))
}

fn record(node: &Node<Clang>) -> Result<RecordDef, DeclError> {
    let Clang::RecordDecl {
        name,
        tag_used,
        complete_definition,
        ..
    } = &node.kind
    else {
        unreachable!("record() called on {:?}", node.kind);
    };
    let kind = tag_used
        .as_deref()
        .and_then(RecordKind::from_tag)
        .unwrap_or(RecordKind::Struct);

    // Records defined inside this one, waiting for the field that uses them.
    let mut pending: Vec<RecordDef> = Vec::new();
    let mut fields = Vec::new();
    let mut anonymous_members = 0;
    for child in &node.inner {
        match &child.kind {
            Clang::RecordDecl { .. } => pending.push(record(child)?),
            Clang::FieldDecl {
                name,
                qtype,
                is_bitfield,
                ..
            } => {
                let field_name = match name.as_deref() {
                    Some(n) if !n.is_empty() => n.to_string(),
                    _ => {
                        anonymous_members += 1;
                        match anonymous_members {
                            1 => "Anonymous".to_string(),
                            n => format!("Anonymous{n}"),
                        }
                    }
                };
                if *is_bitfield {
                    return Err(DeclError::Bitfield(field_name));
                }
                let ty = parse(qtype)?;
                let nested = take_nested(&mut pending, &ty);
                fields.push(FieldDef {
                    name: field_name,
                    ty,
                    nested,
                });
            }
            _ => {}
        }
    }
    for unused in &pending {
        debug!("Nested record {:?} is not used by any field", unused.name);
    }
    Ok(RecordDef {
        name: name.clone(),
        kind,
        complete: *complete_definition,
        fields,
    })
}

/// Removes and returns the pending nested record a field's type refers to.
fn take_nested(pending: &mut Vec<RecordDef>, ty: &CType) -> Option<RecordDef> {
    let mut base = ty.unqualified();
    while let CType::Array { element, .. } | CType::Pointer(element) = base {
        base = element.unqualified();
    }
    let CType::Record { name, .. } = base else {
        return None;
    };
    let position = match name {
        // Anonymous records pair with the most recent anonymous definition.
        None => pending.iter().rposition(|r| r.name.is_none()),
        Some(name) => pending.iter().position(|r| r.name.as_ref() == Some(name)),
    }?;
    Some(pending.remove(position))
}

fn enumeration(
    name: &Option<String>,
    fixed: &Option<QualType>,
    inner: &[Node<Clang>],
) -> Result<EnumDef, DeclError> {
    let underlying = fixed.as_ref().map(parse).transpose()?;
    let mut constants = Vec::new();
    let mut next: i128 = 0;
    for child in inner {
        let Clang::EnumConstantDecl { name, .. } = &child.kind else {
            continue;
        };
        let value = match explicit_value(child) {
            Ok(Some(text)) => text.parse().map_err(|_| DeclError::EnumValue {
                name: name.clone(),
                value: Some(text.to_string()),
            })?,
            Ok(None) => next,
            Err(()) => {
                return Err(DeclError::EnumValue {
                    name: name.clone(),
                    value: None,
                });
            }
        };
        constants.push(EnumConstant {
            name: name.clone(),
            value,
        });
        next = value + 1;
    }
    Ok(EnumDef {
        name: name.clone(),
        underlying,
        constants,
    })
}

/// The evaluated initializer of an enum constant. `Ok(None)` means there is no initializer,
/// `Err` means there is one but clang did not record its value. Other children, such as the
/// `FullComment` of a documented constant, are ignored.
fn explicit_value(constant: &Node<Clang>) -> Result<Option<&str>, ()> {
    for child in &constant.inner {
        match &child.kind {
            Clang::ConstantExpr { value } | Clang::IntegerLiteral { value } => {
                return value.as_deref().map(Some).ok_or(());
            }
            _ => {}
        }
    }
    Ok(None)
}

/// `typedef struct { ... } Foo;` declares an anonymous record followed by a typedef naming it.
/// Give the record the typedef's name so it can be emitted.
fn name_anonymous_tags(decls: &mut [Decl]) {
    for i in 1..decls.len() {
        let (before, after) = decls.split_at_mut(i);
        let Decl::Typedef(typedef) = &mut after[0] else {
            continue;
        };
        let names_it = |tag: &Option<String>| match tag {
            None => true,
            Some(tag) => *tag == typedef.name,
        };
        let is_self = matches!(typedef.underlying.unqualified(), CType::Typedef(n) if *n == typedef.name);
        match &mut before[i - 1] {
            Decl::Record(record) if record.name.is_none() => {
                let refers = is_self
                    || matches!(typedef.underlying.unqualified(), CType::Record { name, .. } if names_it(name));
                if refers {
                    record.name = Some(typedef.name.clone());
                    typedef.underlying = CType::Record {
                        kind: record.kind,
                        name: Some(typedef.name.clone()),
                    };
                }
            }
            Decl::Enum(enumeration) if enumeration.name.is_none() => {
                let refers = is_self
                    || matches!(typedef.underlying.unqualified(), CType::Enum(name) if names_it(name));
                if refers {
                    enumeration.name = Some(typedef.name.clone());
                    typedef.underlying = CType::Enum(Some(typedef.name.clone()));
                }
            }
            _ => {}
        }
    }
}
