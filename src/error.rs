//! Error types shared by schema compilation, decoding, and encoding.
//!
//! Library code returns [`CodecError`]; the command-line layer wraps it in
//! `anyhow` context. The row count estimator never returns these: every
//! failure there collapses to [`crate::estimate::RowCountEstimate::Unknown`].

use std::io;

use thiserror::Error;

pub type Result<T, E = CodecError> = std::result::Result<T, E>;

/// A single cell that could not be converted into its declared type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("column '{column}': cannot parse '{value}': {reason}")]
pub struct ParseError {
    pub column: String,
    pub value: String,
    pub reason: String,
}

impl ParseError {
    pub fn new(
        column: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid format option '{option}': {reason}")]
    Configuration { option: String, reason: String },

    #[error("invalid projection: {0}")]
    Projection(String),

    #[error("line {line}: {source}")]
    Parse {
        line: u64,
        #[source]
        source: ParseError,
    },

    #[error("line {line}: malformed record: {message}")]
    MalformedRecord { line: u64, message: String },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("row does not match writer schema: {0}")]
    EncodingInvariant(String),
}

impl CodecError {
    pub(crate) fn configuration(option: &str, reason: impl Into<String>) -> Self {
        CodecError::Configuration {
            option: option.to_string(),
            reason: reason.into(),
        }
    }

    /// Line number of the offending record, when the error is tied to one.
    pub fn line(&self) -> Option<u64> {
        match self {
            CodecError::Parse { line, .. } | CodecError::MalformedRecord { line, .. } => {
                Some(*line)
            }
            _ => None,
        }
    }

    /// Splits a `csv` crate error into an I/O failure or a record-level one.
    pub(crate) fn from_csv(err: csv::Error) -> Self {
        let line = err.position().map(|pos| pos.line()).unwrap_or(0);
        let message = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(io_err) => CodecError::Io(io_err),
            _ => CodecError::MalformedRecord { line, message },
        }
    }
}
