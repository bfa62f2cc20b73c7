//! Generates C# interop bindings from C headers. This is normally used through the `generate`
//! binary, but is exposed as a library crate as well.
//!
//! A run parses every configured header, collects the declarations worth binding, renders all
//! output files in memory and only then writes them out, so a failed run leaves no partial
//! output behind.

pub mod cli;
pub mod collector;
pub mod commands;
pub mod constants;
pub mod enums;
pub mod handles;
pub mod registry;
pub mod structs;
pub mod type_map;

#[cfg(test)]
pub(crate) mod test_util;

use c_ast::{HeaderParser, ParseError};
use collector::Collection;
use constants::ConstantsEmitter;
use csbind_core::config::Config;
use csbind_core::Output;
use std::path::{Path, PathBuf};
use structs::StructsEmitter;
use thiserror::Error;
use tracing::{error, info};
use type_map::TypeMapper;

/// Name of the directory generated files are written to.
pub const OUTPUT_SUBDIR: &str = "Generated";

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] csbind_core::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// How a run that did not fail ended.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Generated { files: Vec<PathBuf> },
    /// A header did not compile; nothing was written.
    Aborted {
        header: PathBuf,
        diagnostics: Vec<String>,
    },
}

/// Parses the configured headers below `includes` and writes the bindings into `output_dir`.
pub fn run(
    config: &Config,
    parser: &dyn HeaderParser,
    includes: &Path,
    output_dir: &Path,
) -> Result<Outcome, Error> {
    let mut headers = Vec::with_capacity(config.headers.len());
    for path in config.header_paths(includes) {
        info!("Parsing {} with {}", path.display(), parser.name());
        match parser.parse(&path) {
            Ok(header) => headers.push(header),
            Err(ParseError::Diagnostics { header, messages }) => {
                error!("{} failed to compile", header.display());
                return Ok(Outcome::Aborted {
                    header,
                    diagnostics: messages,
                });
            }
            Err(e) => return Err(e.into()),
        }
    }
    let collection = Collection::build(&config.collect, &headers);
    let output = generate(config, &collection);
    let files = output.materialize(output_dir)?;
    Ok(Outcome::Generated { files })
}

/// Renders every output file for an already collected set of declarations.
pub fn generate(config: &Config, collection: &Collection) -> Output {
    let mapper = TypeMapper::new(&config.types, &collection.registry);
    let mut output = Output::default();
    output.push(ConstantsEmitter::new(config, &mapper).emit(collection.constants.iter()));
    output.push(enums::emit(config, &mapper, collection.enums.iter()));
    output.push(handles::emit(config, collection.handles.iter()));
    output.push(StructsEmitter::new(config, &mapper).emit(collection.records.iter()));
    output.push(commands::emit(config, &mapper, collection.functions.iter()));
    output
}

/// The directory output goes to: `arg` if given, else `exe_dir`. Relative paths resolve against
/// `exe_dir`, and [OUTPUT_SUBDIR] is appended unless the path already ends with it.
pub fn resolve_output_dir(arg: Option<&Path>, exe_dir: &Path) -> PathBuf {
    let base = match arg {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => exe_dir.join(path),
        None => exe_dir.to_path_buf(),
    };
    if base.ends_with(OUTPUT_SUBDIR) {
        base
    } else {
        base.join(OUTPUT_SUBDIR)
    }
}
