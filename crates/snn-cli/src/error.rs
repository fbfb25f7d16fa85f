//! Error handling for the `snn` CLI.

use thiserror::Error;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// CLI-specific errors. Wraps [`snn_core::CoreError`] for anything that
/// bubbles up from the engine, plus variants for CLI-only concerns.
#[derive(Error, Debug)]
pub enum CliError {
    /// Error from the core engine (load failure, invalid parameter, ...).
    #[error("{0}")]
    Core(#[from] snn_core::CoreError),

    /// A dataset manifest line could not be parsed.
    #[error("dataset manifest error at line {line}: {reason}")]
    Manifest {
        /// 1-indexed line number.
        line: usize,
        /// Human-readable description.
        reason: String,
    },

    /// Configuration file could not be read or written.
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid combination of command-line arguments.
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failure.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Build a [`CliError::Manifest`].
    pub fn manifest(line: usize, reason: impl Into<String>) -> Self {
        Self::Manifest {
            line,
            reason: reason.into(),
        }
    }

    /// Build a [`CliError::Config`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`CliError::InvalidArgs`].
    pub fn invalid_args(msg: impl Into<String>) -> Self {
        Self::InvalidArgs(msg.into())
    }
}
