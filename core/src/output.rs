//! Generated files are held in memory until every emitter has finished, so a failed run never
//! leaves a partial set of files behind.

use crate::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// One rendered source file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedFile {
    name: &'static str,
    contents: String,
}

impl GeneratedFile {
    pub fn new(name: &'static str, contents: String) -> GeneratedFile {
        GeneratedFile { name, contents }
    }

    /// File name, relative to the output directory.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }
}

impl std::fmt::Display for GeneratedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} bytes)", self.name, self.contents.len())
    }
}

/// The complete output of one run.
#[derive(Debug, Default)]
pub struct Output {
    files: Vec<GeneratedFile>,
}

impl Output {
    pub fn push(&mut self, file: GeneratedFile) {
        self.files.push(file);
    }

    pub fn files(&self) -> &[GeneratedFile] {
        &self.files
    }

    /// Returns the file with the given name, if it was generated.
    pub fn get(&self, name: &str) -> Option<&GeneratedFile> {
        self.files.iter().find(|f| f.name == name)
    }

    /// Creates `dir` if needed and writes every file into it. Returns the written paths.
    pub fn materialize(&self, dir: &Path) -> Result<Vec<PathBuf>, Error> {
        fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        let mut written = Vec::with_capacity(self.files.len());
        for file in &self.files {
            let path = dir.join(file.name);
            fs::write(&path, &file.contents).map_err(|e| Error::io(&path, e))?;
            info!("Wrote {file}");
            written.push(path);
        }
        Ok(written)
    }
}
