//! Error types for Matrix Market operations.

use thiserror::Error;

/// Result type alias for Matrix Market operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Matrix Market error types.
#[derive(Debug, Error)]
pub enum Error {
    /// Caller supplied inconsistent array sizes or an impossible shape.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Malformed body or header line. Carries the absolute 1-based line number.
    #[error("parse error on line {line}: {message}")]
    Parse { line: u64, message: String },

    /// A value is out of range for the declared field.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// I/O error from the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The header requests a combination this crate does not implement.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl Error {
    /// Create a parse error pinned to an absolute 1-based line number.
    pub fn parse(line: u64, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    /// Create an invalid value error.
    pub fn invalid_value(message: impl Into<String>) -> Self {
        Error::InvalidValue(message.into())
    }

    /// Create an unsupported-feature error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Error::Unsupported(message.into())
    }
}
