//! The header front-end: runs clang over a header, reads its JSON AST and its macro dump, and
//! turns both into the declaration model the generator works on.

pub mod ctype;
pub mod decls;
pub mod macros;
pub mod test_util;

use clang_ast::Node;
use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, info};

pub use ctype::CType;
pub use decls::Decl;
pub use macros::MacroDef;

/// Represents a (possibly) qualified type in the Clang AST, such as `int`, `const int`, or `const volatile int`.
/// Clang Docs on QualType: https://clang.llvm.org/doxygen/classclang_1_1QualType.html
#[derive(Deserialize, Debug)]
pub struct QualType {
    /// String representation of the desugared type, i.e., it will have `typedefs` and `typeofs` resolved.
    #[serde(rename = "desugaredQualType")]
    pub desugared_qual_type: Option<String>,
    /// String representation of the type as written in the source code, i.e., it may include `typedefs` and `typeofs`.
    #[serde(rename = "qualType")]
    pub qual_type: String,
}

/// Represents a node in the Clang AST.
/// Only the declarations that can appear in a binding (and the expressions that carry enum
/// values) are decoded; everything else is `Other`.
#[derive(Deserialize, Debug)]
pub enum Clang {
    TranslationUnitDecl,
    /// Clang Docs: https://clang.llvm.org/doxygen/classclang_1_1TypedefDecl.html
    TypedefDecl {
        loc: Option<clang_ast::SourceLocation>,
        name: String,
        #[serde(rename = "type")]
        qtype: QualType,
    },
    /// Clang Docs: https://clang.llvm.org/doxygen/classclang_1_1FunctionDecl.html
    FunctionDecl {
        loc: Option<clang_ast::SourceLocation>,
        name: String,
        #[serde(rename = "storageClass")]
        storage_class: Option<String>,
        #[serde(rename = "type")]
        qtype: QualType,
        #[serde(default)]
        variadic: bool,
        #[serde(default)]
        inline: bool,
    },
    /// Represents a record (struct/union) declaration in the Clang AST.
    /// Clang Docs: https://clang.llvm.org/doxygen/classclang_1_1RecordDecl.html
    RecordDecl {
        loc: Option<clang_ast::SourceLocation>,
        name: Option<String>,
        #[serde(rename = "tagUsed")]
        tag_used: Option<String>,
        #[serde(rename = "completeDefinition", default)]
        complete_definition: bool,
    },
    /// Clang Docs: https://clang.llvm.org/doxygen/classclang_1_1FieldDecl.html
    FieldDecl {
        loc: Option<clang_ast::SourceLocation>,
        name: Option<String>,
        #[serde(rename = "type")]
        qtype: QualType,
        #[serde(rename = "isBitfield", default)]
        is_bitfield: bool,
    },
    /// Clang Docs: https://clang.llvm.org/doxygen/classclang_1_1EnumDecl.html
    EnumDecl {
        loc: Option<clang_ast::SourceLocation>,
        name: Option<String>,
        #[serde(rename = "fixedUnderlyingType")]
        fixed_underlying_type: Option<QualType>,
    },
    EnumConstantDecl {
        loc: Option<clang_ast::SourceLocation>,
        name: String,
        #[serde(rename = "type")]
        qtype: QualType,
    },
    /// Clang Docs: https://clang.llvm.org/doxygen/classclang_1_1ParmVarDecl.html
    ParmVarDecl {
        loc: Option<clang_ast::SourceLocation>,
        name: Option<String>,
        #[serde(rename = "type")]
        qtype: QualType,
    },
    /// Carries the evaluated value of an enum constant initializer.
    ConstantExpr { value: Option<String> },
    IntegerLiteral { value: Option<String> },
    /// Every other node (not relevant to binding generation)
    Other { kind: Option<String> },
}

impl Clang {
    /// Returns the source location of this AST node, if available.
    pub fn loc(&self) -> Option<&clang_ast::SourceLocation> {
        match self {
            Clang::TypedefDecl { loc, .. }
            | Clang::FunctionDecl { loc, .. }
            | Clang::RecordDecl { loc, .. }
            | Clang::FieldDecl { loc, .. }
            | Clang::EnumDecl { loc, .. }
            | Clang::EnumConstantDecl { loc, .. }
            | Clang::ParmVarDecl { loc, .. } => loc.as_ref(),
            Clang::TranslationUnitDecl
            | Clang::ConstantExpr { .. }
            | Clang::IntegerLiteral { .. }
            | Clang::Other { .. } => None,
        }
    }

    /// Returns the name of this declaration, if available.
    pub fn name(&self) -> Option<&str> {
        match self {
            Clang::TypedefDecl { name, .. }
            | Clang::FunctionDecl { name, .. }
            | Clang::EnumConstantDecl { name, .. } => Some(name),
            Clang::RecordDecl { name, .. }
            | Clang::FieldDecl { name, .. }
            | Clang::EnumDecl { name, .. }
            | Clang::ParmVarDecl { name, .. } => name.as_deref(),
            _ => None,
        }
    }
}

/// Returns the file a location points into, preferring where a macro was expanded over where its
/// text was spelled.
pub fn file_of(loc: Option<&clang_ast::SourceLocation>) -> Option<&str> {
    loc.and_then(|l| l.expansion_loc.as_ref().or(l.spelling_loc.as_ref()))
        .map(|bare| &*bare.file)
}

/// Everything the generator needs from one header.
#[derive(Debug, Default)]
pub struct ParsedHeader {
    pub path: PathBuf,
    /// Object-like and function-like macros, in definition order.
    pub macros: Vec<MacroDef>,
    /// Top-level declarations, in source order.
    pub decls: Vec<Decl>,
    /// Declarations of the other headers `path` pulls in from the include directory. They
    /// resolve types but are not bindings of this header.
    pub included: Vec<Decl>,
}

impl ParsedHeader {
    /// Builds a header from a translation unit. With a `scope`, only declarations located in
    /// `path` itself are its own and those elsewhere under `scope` land in
    /// [included](ParsedHeader::included); `None` makes everything its own.
    pub fn from_ast(
        path: impl Into<PathBuf>,
        ast: &Node<Clang>,
        macros: Vec<MacroDef>,
        scope: Option<&Path>,
    ) -> ParsedHeader {
        let path = path.into();
        let (decls, included) = match scope {
            Some(scope) => (
                decls::extract_decls(ast, Some(path.as_path())),
                decls::extract_included(ast, scope, &path),
            ),
            None => (decls::extract_decls(ast, None), Vec::new()),
        };
        ParsedHeader {
            path,
            macros,
            decls,
            included,
        }
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    /// The header did not compile. `messages` holds clang's error lines.
    #[error("{} has {} error(s)", header.display(), messages.len())]
    Diagnostics {
        header: PathBuf,
        messages: Vec<String>,
    },

    #[error("failed to run {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode the AST of {}: {source}", header.display())]
    Json {
        header: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Turns a header file into a [ParsedHeader].
///
/// The driver only talks to this trait, so tests can substitute a parser that does not need a
/// clang installation.
pub trait HeaderParser {
    /// This parser's name, for logging.
    fn name(&self) -> &'static str;

    fn parse(&self, header: &Path) -> Result<ParsedHeader, ParseError>;
}

/// Parses headers with the clang binary: `-ast-dump=json` for declarations and `-E -dD` for
/// macros. Only the macros of the header itself are kept. Declarations of other headers under
/// `includes` are kept apart for type resolution, and the rest (system headers) are dropped.
pub struct ClangParser {
    clang: PathBuf,
    includes: PathBuf,
}

impl ClangParser {
    pub fn new(clang: impl Into<PathBuf>, includes: impl Into<PathBuf>) -> ClangParser {
        ClangParser {
            clang: clang.into(),
            includes: includes.into(),
        }
    }

    /// Runs clang on `header` with `mode` arguments and returns its stdout. Any error line on
    /// stderr, or a failing exit status, is reported as [ParseError::Diagnostics].
    fn run(&self, header: &Path, mode: &[&str]) -> Result<Vec<u8>, ParseError> {
        let output = Command::new(&self.clang)
            .args(["-x", "c", "-std=gnu11"])
            .args(mode)
            .arg("-I")
            .arg(&self.includes)
            .arg(header)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ParseError::Spawn {
                program: self.clang.clone(),
                source,
            })?;
        let stderr = String::from_utf8_lossy(&output.stderr);
        let mut messages = error_messages(&stderr);
        if !output.status.success() || !messages.is_empty() {
            if messages.is_empty() {
                messages.push(format!("clang exited with {}", output.status));
            }
            return Err(ParseError::Diagnostics {
                header: header.to_path_buf(),
                messages,
            });
        }
        Ok(output.stdout)
    }
}

impl HeaderParser for ClangParser {
    fn name(&self) -> &'static str {
        "clang"
    }

    fn parse(&self, header: &Path) -> Result<ParsedHeader, ParseError> {
        let json = self.run(header, &["-fsyntax-only", "-Xclang", "-ast-dump=json"])?;
        let ast: Node<Clang> =
            serde_json::from_slice(&json).map_err(|source| ParseError::Json {
                header: header.to_path_buf(),
                source,
            })?;
        debug!("Decoded AST of {} ({} bytes)", header.display(), json.len());
        let dump = self.run(header, &["-E", "-dD"])?;
        let macros = macros::parse_macro_dump(&String::from_utf8_lossy(&dump), Some(header));
        let parsed = ParsedHeader::from_ast(header, &ast, macros, Some(self.includes.as_path()));
        info!(
            "Parsed {}: {} macros, {} declarations ({} included)",
            header.display(),
            parsed.macros.len(),
            parsed.decls.len(),
            parsed.included.len()
        );
        Ok(parsed)
    }
}

/// Picks the error lines out of clang's stderr.
pub fn error_messages(stderr: &str) -> Vec<String> {
    stderr
        .lines()
        .filter(|line| line.contains("error:"))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_lines() {
        let stderr = "\
/inc/a.h:3:1: warning: unused macro
/inc/a.h:4:9: error: unknown type name 'Foo'
/inc/a.h:9:1: fatal error: 'b.h' file not found
2 errors generated.
";
        assert_eq!(
            error_messages(stderr),
            [
                "/inc/a.h:4:9: error: unknown type name 'Foo'",
                "/inc/a.h:9:1: fatal error: 'b.h' file not found"
            ]
        );
        assert!(error_messages("1 warning generated.\n").is_empty());
    }

    #[test]
    fn hand_written_ast_key_order() {
        use crate::test_util::{ast, loc};
        use serde_json::json;
        // `inner` sorts before `kind`; the helper must still hand clang_ast `kind` first.
        let root = ast(json!({
            "inner": [{
                "inner": [{ "type": { "qualType": "int" }, "name": "x", "loc": loc("/inc/a.h"),
                            "kind": "FieldDecl" }],
                "completeDefinition": true, "tagUsed": "struct", "name": "SDL_Point",
                "loc": loc("/inc/a.h"), "kind": "RecordDecl"
            }],
            "kind": "TranslationUnitDecl"
        }));
        let header = ParsedHeader::from_ast("/inc/a.h", &root, Vec::new(), None);
        let [Decl::Record(record)] = header.decls.as_slice() else {
            panic!("unexpected declarations: {:?}", header.decls);
        };
        assert_eq!(record.name.as_deref(), Some("SDL_Point"));
        assert_eq!(record.fields.len(), 1);
        assert_eq!(record.fields[0].name, "x");
    }

    #[test]
    fn declarations_split_by_file() {
        use crate::test_util::{ast, loc};
        use serde_json::json;
        let typedef = |name: &str, file: &str| {
            json!({ "kind": "TypedefDecl", "loc": loc(file), "name": name,
                    "type": { "qualType": "int" } })
        };
        let root = ast(json!({
            "kind": "TranslationUnitDecl",
            "inner": [
                typedef("int8_t", "/usr/include/stdint.h"),
                typedef("Sint8", "/inc/SDL3/SDL_stdinc.h"),
                typedef("SDL_InitFlags", "/inc/SDL3/SDL_init.h"),
                typedef("SDL_Other", "/inc/SDL3/SDL_init_extra.h"),
            ]
        }));
        let names = |decls: &[Decl]| -> Vec<String> {
            decls
                .iter()
                .map(|decl| match decl {
                    Decl::Typedef(typedef) => typedef.name.clone(),
                    other => panic!("unexpected declaration {other:?}"),
                })
                .collect()
        };
        let header = ParsedHeader::from_ast(
            "/inc/SDL3/SDL_init.h",
            &root,
            Vec::new(),
            Some(Path::new("/inc")),
        );
        assert_eq!(names(&header.decls), ["SDL_InitFlags"]);
        assert_eq!(names(&header.included), ["Sint8", "SDL_Other"]);

        let header = ParsedHeader::from_ast("/inc/SDL3/SDL_init.h", &root, Vec::new(), None);
        assert_eq!(header.decls.len(), 4);
        assert!(header.included.is_empty());
    }

    #[cfg(not(miri))]
    #[test]
    fn missing_clang_binary() {
        let parser = ClangParser::new("/nonexistent/clang-for-csbind-tests", "/nonexistent");
        assert!(matches!(
            parser.parse(Path::new("/nonexistent/a.h")),
            Err(ParseError::Spawn { .. })
        ));
    }
}
