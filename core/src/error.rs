use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures outside of header parsing: configuration problems and output I/O.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to build configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid config override {0:?}; expected NAME=VALUE")]
    Override(String),

    #[error("no home directory found for the user config file")]
    NoHomeDir,

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Wraps an [io::Error] together with the path it happened at.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Error {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
