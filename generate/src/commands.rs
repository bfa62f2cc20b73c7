//! `Commands.cs`: `DllImport` declarations for the exported functions.

use crate::type_map::{TypeMapper, identifier};
use c_ast::decls::FunctionDef;
use csbind_core::GeneratedFile;
use csbind_core::code_writer::CodeWriter;
use csbind_core::config::Config;
use tracing::warn;

pub fn emit<'f>(
    config: &Config,
    mapper: &TypeMapper,
    functions: impl Iterator<Item = (&'f str, &'f FunctionDef)>,
) -> GeneratedFile {
    let mut writer = CodeWriter::new(
        "Commands.cs",
        &config.namespace,
        &["System.Runtime.InteropServices"],
        None,
    );
    let visibility = config.visibility();
    let header = format!("{visibility} static unsafe partial class {}", config.class_name);
    writer.block(header, |w| {
        w.write_line(format!(
            "{visibility} const string LibraryName = \"{}\";",
            config.library_name
        ));
        for (name, def) in functions {
            match signature(mapper, def) {
                Some(lines) => {
                    w.blank_line();
                    w.write_line(format!(
                        "[DllImport(LibraryName, CallingConvention = CallingConvention.Cdecl, EntryPoint = \"{name}\")]"
                    ));
                    for line in lines {
                        w.write_line(line);
                    }
                }
                None => warn!("Skipping function {name}: no C# equivalent for its signature"),
            }
        }
    });
    writer.finish()
}

/// The attribute and declaration lines following `[DllImport]`, or `None` when the return type or
/// a parameter cannot be mapped.
fn signature(mapper: &TypeMapper, def: &FunctionDef) -> Option<Vec<String>> {
    let ret = mapper.map(&def.ret)?;
    let mut unsafe_ = ret.contains('*');
    let mut params = Vec::with_capacity(def.params.len());
    for (i, param) in def.params.iter().enumerate() {
        let ty = mapper.map(&param.ty)?;
        unsafe_ |= ty.contains('*');
        let name = match &param.name {
            Some(name) => identifier(name),
            None => format!("arg{i}"),
        };
        let marshal = if ty == "bool" {
            "[MarshalAs(UnmanagedType.U1)] "
        } else {
            ""
        };
        params.push(format!("{marshal}{ty} {name}"));
    }

    let mut lines = Vec::new();
    if ret == "bool" {
        lines.push("[return: MarshalAs(UnmanagedType.U1)]".to_string());
    }
    lines.push(format!(
        "public static extern {}{ret} {}({});",
        if unsafe_ { "unsafe " } else { "" },
        def.name,
        params.join(", ")
    ));
    Some(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{collect, function};

    fn commands(config: &Config, decls: Vec<serde_json::Value>) -> String {
        let collection = collect(decls, "");
        let mapper = TypeMapper::new(&config.types, &collection.registry);
        emit(config, &mapper, collection.functions.iter())
            .contents()
            .to_string()
    }

    #[test]
    fn declarations() {
        let config = Config::mock();
        let contents = commands(
            &config,
            vec![
                function("SDL_Init", "bool (Uint32)", &[(Some("flags"), "Uint32")]),
                function(
                    "SDL_SetHint",
                    "bool (const char *, const char *)",
                    &[(Some("name"), "const char *"), (Some("value"), "const char *")],
                ),
                function("SDL_Quit", "void (void)", &[]),
                function(
                    "SDL_SetBool",
                    "void (bool, int)",
                    &[(Some("enabled"), "bool"), (None, "int")],
                ),
                function("SDL_GetTicksLD", "long double (void)", &[]),
            ],
        );
        let body = contents
            .split_once("namespace SDL;\n\n")
            .map(|(_, body)| body)
            .unwrap();
        assert_eq!(
            body,
            "public static unsafe partial class SDL\n\
             {\n\
             \tpublic const string LibraryName = \"SDL3\";\n\
             \n\
             \t[DllImport(LibraryName, CallingConvention = CallingConvention.Cdecl, EntryPoint = \"SDL_Init\")]\n\
             \t[return: MarshalAs(UnmanagedType.U1)]\n\
             \tpublic static extern bool SDL_Init(uint flags);\n\
             \n\
             \t[DllImport(LibraryName, CallingConvention = CallingConvention.Cdecl, EntryPoint = \"SDL_SetHint\")]\n\
             \t[return: MarshalAs(UnmanagedType.U1)]\n\
             \tpublic static extern unsafe bool SDL_SetHint(sbyte* name, sbyte* value);\n\
             \n\
             \t[DllImport(LibraryName, CallingConvention = CallingConvention.Cdecl, EntryPoint = \"SDL_Quit\")]\n\
             \tpublic static extern void SDL_Quit();\n\
             \n\
             \t[DllImport(LibraryName, CallingConvention = CallingConvention.Cdecl, EntryPoint = \"SDL_SetBool\")]\n\
             \tpublic static extern void SDL_SetBool([MarshalAs(UnmanagedType.U1)] bool enabled, int arg1);\n\
             }\n"
        );
        assert!(contents.contains("using System.Runtime.InteropServices;\n"));
    }

    #[test]
    fn keyword_parameters() {
        let mut config = Config::mock();
        config.library_name = "SDL3.dll".into();
        let contents = commands(
            &config,
            vec![function(
                "SDL_Log",
                "void (const char *)",
                &[(Some("string"), "const char *")],
            )],
        );
        assert!(contents.contains("public static extern unsafe void SDL_Log(sbyte* @string);"));
        assert!(contents.contains("public const string LibraryName = \"SDL3.dll\";"));
    }
}
