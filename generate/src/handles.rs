//! `Handles.cs`: opaque native types, which C# code only ever sees behind a pointer, and typedef'd
//! pointer handles, which become strongly-typed wrappers around `nint`.

use crate::collector::HandleKind;
use csbind_core::GeneratedFile;
use csbind_core::code_writer::CodeWriter;
use csbind_core::config::Config;

pub fn emit<'h>(
    config: &Config,
    handles: impl Iterator<Item = (&'h str, &'h HandleKind)>,
) -> GeneratedFile {
    let mut writer = CodeWriter::new(
        "Handles.cs",
        &config.namespace,
        &["System", "System.Diagnostics"],
        None,
    );
    let visibility = config.visibility();
    for (name, kind) in handles {
        match kind {
            HandleKind::Opaque => {
                writer.block(format!("{visibility} partial struct {name}"), |_| {});
            }
            HandleKind::Pointer => pointer_handle(&mut writer, visibility, name),
        }
        writer.blank_line();
    }
    writer.finish()
}

fn pointer_handle(w: &mut CodeWriter, visibility: &str, name: &str) {
    w.write_line("[DebuggerDisplay(\"{DebuggerDisplay,nq}\")]");
    let header =
        format!("{visibility} readonly partial struct {name}(nint handle) : IEquatable<{name}>");
    w.block(header, |w| {
        w.write_line("public nint Handle { get; } = handle;");
        w.write_line("public bool IsNull => Handle == 0;");
        w.blank_line();
        w.write_line(format!("public static {name} Null => new(0);"));
        w.write_line(format!(
            "public static implicit operator {name}(nint handle) => new(handle);"
        ));
        w.blank_line();
        for op in ["==", "!="] {
            w.write_line(format!(
                "public static bool operator {op}({name} left, {name} right) => left.Handle {op} right.Handle;"
            ));
        }
        for op in ["==", "!="] {
            w.write_line(format!(
                "public static bool operator {op}({name} left, nint right) => left.Handle {op} right;"
            ));
        }
        w.blank_line();
        w.write_line(format!(
            "public bool Equals({name} other) => Handle == other.Handle;"
        ));
        w.write_line(format!(
            "public override bool Equals(object? obj) => obj is {name} handle && Equals(handle);"
        ));
        w.write_line("public override int GetHashCode() => Handle.GetHashCode();");
        w.blank_line();
        w.write_line(format!(
            "private string DebuggerDisplay => $\"{{nameof({name})}} [0x{{Handle:X}}]\";"
        ));
    });
}
