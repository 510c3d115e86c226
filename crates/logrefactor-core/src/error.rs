use std::path::PathBuf;

use thiserror::Error;

/// Error types for scanning, catalog handling and rewriting.
///
/// Run-wide failures (`InvalidPattern`, `Config`, an empty or missing catalog)
/// abort before any file is touched. The remaining variants are local to one
/// file or one catalog entry and are recovered by the caller.
#[derive(Error, Debug)]
pub enum RefactorError {
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("cannot generate code for {id}: {message}")]
    Generation { id: String, message: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl RefactorError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn generation(id: impl Into<String>, message: impl ToString) -> Self {
        Self::Generation {
            id: id.into(),
            message: message.to_string(),
        }
    }

    /// True for errors that must stop the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidPattern(_) | Self::Config(_) | Self::Catalog(_))
    }
}

/// Result type for logrefactor operations
pub type Result<T> = std::result::Result<T, RefactorError>;
