//! Error types for the SNN core engine.

use thiserror::Error;

/// Result type for core engine operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur while building, running, or persisting a network.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A neuron id was referenced that does not exist in the network.
    #[error("unknown neuron: {id}")]
    UnknownNeuron {
        /// The id that could not be resolved.
        id: String,
    },

    /// An `add_neuron` call reused an id already present in the network.
    #[error("duplicate neuron: {id}")]
    DuplicateNeuron {
        /// The id that was already present.
        id: String,
    },

    /// A parameter violated one of the invariants in the data model.
    #[error("invalid parameter {parameter}: {value} (expected {constraint})")]
    InvalidParameter {
        /// Parameter name.
        parameter: String,
        /// Value that was rejected.
        value: String,
        /// Constraint description.
        constraint: String,
    },

    /// A `.net` or `.seq` line could not be parsed.
    #[error("parse error at line {line}: {reason}")]
    ParseError {
        /// 1-indexed line number within the source file.
        line: usize,
        /// Human-readable description of the problem.
        reason: String,
    },

    /// A required file could not be opened.
    #[error("missing file: {path}")]
    MissingFile {
        /// Path that could not be opened.
        path: String,
    },

    /// Underlying I/O failure while reading or writing a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Build an [`CoreError::UnknownNeuron`].
    pub fn unknown_neuron(id: impl Into<String>) -> Self {
        Self::UnknownNeuron { id: id.into() }
    }

    /// Build a [`CoreError::DuplicateNeuron`].
    pub fn duplicate_neuron(id: impl Into<String>) -> Self {
        Self::DuplicateNeuron { id: id.into() }
    }

    /// Build an [`CoreError::InvalidParameter`].
    pub fn invalid_parameter(
        parameter: impl Into<String>,
        value: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            constraint: constraint.into(),
        }
    }

    /// Build a [`CoreError::ParseError`].
    pub fn parse_error(line: usize, reason: impl Into<String>) -> Self {
        Self::ParseError {
            line,
            reason: reason.into(),
        }
    }

    /// Build a [`CoreError::MissingFile`].
    pub fn missing_file(path: impl Into<String>) -> Self {
        Self::MissingFile { path: path.into() }
    }
}
