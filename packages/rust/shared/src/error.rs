//! Error types for koaton.
//!
//! Library crates use [`KoatonError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all bundle build operations.
#[derive(Debug, thiserror::Error)]
pub enum KoatonError {
    /// Project or bundle configuration could not be loaded.
    #[error("config error: {message}")]
    Config { message: String },

    /// A preprocessor or minifier rejected a source.
    #[error("compile error in {source_path:?}: {message}")]
    Compile {
        source_path: PathBuf,
        message: String,
    },

    /// The bundle manifest could not be serialized or written.
    #[error("manifest error: {0}")]
    Manifest(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad target name, malformed pattern, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, KoatonError>;

impl KoatonError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a compile error for the given source file.
    pub fn compile(source_path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Compile {
            source_path: source_path.into(),
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = KoatonError::config("bundle file is empty");
        assert_eq!(err.to_string(), "config error: bundle file is empty");

        let err = KoatonError::compile("styles/a.less", "unexpected token");
        let msg = err.to_string();
        assert!(msg.contains("styles/a.less"));
        assert!(msg.contains("unexpected token"));
    }
}
