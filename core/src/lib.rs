//! Pieces shared by the csbind crates: configuration, the C# source writer, and the in-memory
//! set of generated files that is written out once a run has fully succeeded.

pub mod code_writer;
pub mod config;
mod error;
pub mod output;
pub mod test_util;

pub use error::Error;
pub use output::{GeneratedFile, Output};
