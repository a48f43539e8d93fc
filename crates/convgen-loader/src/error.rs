//! Errors that abort loading.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no Go source files in {0}")]
    NoSources(PathBuf),

    #[error("{file}:{line}:{column}: syntax error")]
    Syntax {
        file: PathBuf,
        line: usize,
        column: usize,
    },

    #[error("{dir}: found packages {first} and {second}")]
    MixedPackages {
        dir: PathBuf,
        first: String,
        second: String,
    },

    #[error("no go.mod found for {0}")]
    MissingGoMod(PathBuf),

    #[error("invalid package manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("parser setup failed: {0}")]
    Parser(String),
}

impl LoadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LoadError::Io {
            path: path.into(),
            source,
        }
    }
}
