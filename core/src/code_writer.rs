//! Indentation-aware writer for generated C# files.

use crate::output::GeneratedFile;

/// Header placed at the top of every generated file.
pub const BANNER: &str = "\
// ------------------------------------------------------------------------------
// <auto-generated>
//     This code was generated by a tool.
//
//     Changes to this file may cause incorrect behavior and will be lost if
//     the code is regenerated.
// </auto-generated>
// ------------------------------------------------------------------------------
";

/// Accumulates the text of one C# file. Blocks are tab indented.
#[derive(Debug)]
pub struct CodeWriter {
    name: &'static str,
    buf: String,
    indent: usize,
}

impl CodeWriter {
    /// Starts a file: banner, `using` directives, an optional preamble line and a file-scoped
    /// namespace.
    pub fn new(
        name: &'static str,
        namespace: &str,
        usings: &[&str],
        preamble: Option<&str>,
    ) -> CodeWriter {
        let mut writer = CodeWriter {
            name,
            buf: String::from(BANNER),
            indent: 0,
        };
        writer.blank_line();
        if !usings.is_empty() {
            for using in usings {
                writer.write_line(format!("using {using};"));
            }
            writer.blank_line();
        }
        if let Some(preamble) = preamble {
            writer.write_line(preamble);
            writer.blank_line();
        }
        writer.write_line(format!("namespace {namespace};"));
        writer.blank_line();
        writer
    }

    /// An empty writer at the same indentation. Text written to it is merged back with
    /// [CodeWriter::append], which lets a caller abandon a declaration halfway through.
    pub fn fragment(&self) -> CodeWriter {
        CodeWriter {
            name: self.name,
            buf: String::new(),
            indent: self.indent,
        }
    }

    /// Appends the text of a fragment created by [CodeWriter::fragment].
    pub fn append(&mut self, fragment: CodeWriter) {
        self.buf.push_str(&fragment.buf);
    }

    pub fn write_line(&mut self, line: impl AsRef<str>) {
        let line = line.as_ref();
        if !line.is_empty() {
            for _ in 0..self.indent {
                self.buf.push('\t');
            }
            self.buf.push_str(line);
        }
        self.buf.push('\n');
    }

    pub fn blank_line(&mut self) {
        self.buf.push('\n');
    }

    /// Writes `header`, then `body` inside braces one level deeper.
    pub fn block(&mut self, header: impl AsRef<str>, body: impl FnOnce(&mut CodeWriter)) {
        self.write_line(header);
        self.write_line("{");
        self.indent += 1;
        body(self);
        self.indent -= 1;
        self.write_line("}");
    }

    /// Text written so far.
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn finish(self) -> GeneratedFile {
        GeneratedFile::new(self.name, self.buf)
    }
}
