//! Error types for registry parsing and rendering operations.
//!
//! Format errors always carry the one-based number of the offending source
//! line so callers can point at the exact spot in the file. Lookup misses
//! are not errors: query operations return `Option` instead.

use std::io;
use thiserror::Error;

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors that can occur while loading, parsing, or saving a registry file.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// I/O error occurred while reading or writing the registry file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A `[path] timestamp` key header line could not be parsed.
    #[error("malformed key header at line {line}: {text:?}")]
    MalformedKeyHeader {
        line: usize,
        text: String,
    },

    /// The timestamp after a key header is neither an integer nor a float.
    #[error("invalid timestamp at line {line}: {text:?}")]
    InvalidTimestamp {
        line: usize,
        text: String,
    },

    /// A quoted string (value name or payload) has no closing quote.
    #[error("unterminated quoted string at line {line}: {text:?}")]
    UnterminatedString {
        line: usize,
        text: String,
    },

    /// A backslash escape other than `\"` or `\\` inside a quoted string.
    #[error("invalid escape sequence at line {line}: {text:?}")]
    InvalidEscape {
        line: usize,
        text: String,
    },

    /// A `dword:` payload that is not exactly eight hex digits.
    #[error("invalid dword payload at line {line}: {text:?}")]
    InvalidDword {
        line: usize,
        text: String,
    },

    /// A value assignment line with no `=` or other structural damage.
    #[error("malformed value assignment at line {line}: {text:?}")]
    MalformedValue {
        line: usize,
        text: String,
    },

    /// A `#` comment inside a key section without a `name=value` body.
    #[error("malformed key meta at line {line}: {text:?}")]
    MalformedMeta {
        line: usize,
        text: String,
    },

    /// A value or meta line seen before any key header was opened.
    #[error("value outside of any key section at line {line}: {text:?}")]
    ValueOutsideKey {
        line: usize,
        text: String,
    },

    /// A second section with an already-seen key path.
    #[error("duplicate key {path:?} at line {line}")]
    DuplicateKey {
        line: usize,
        path: String,
    },

    /// The document prologue is missing a mandatory header field.
    #[error("missing {what} header")]
    MissingHeader {
        what: &'static str,
    },

    /// A non-blank line inside a key section matching no known form.
    #[error("unrecognized line {line}: {text:?}")]
    UnrecognizedLine {
        line: usize,
        text: String,
    },
}

impl RegistryError {
    /// Returns the one-based source line number for format errors.
    ///
    /// I/O and missing-header errors have no single offending line and
    /// return `None`.
    pub fn line_number(&self) -> Option<usize> {
        match self {
            Self::Io(_) | Self::MissingHeader { .. } => None,
            Self::MalformedKeyHeader { line, .. }
            | Self::InvalidTimestamp { line, .. }
            | Self::UnterminatedString { line, .. }
            | Self::InvalidEscape { line, .. }
            | Self::InvalidDword { line, .. }
            | Self::MalformedValue { line, .. }
            | Self::MalformedMeta { line, .. }
            | Self::ValueOutsideKey { line, .. }
            | Self::DuplicateKey { line, .. }
            | Self::UnrecognizedLine { line, .. } => Some(*line),
        }
    }

    /// Creates an unrecognized-line error with context.
    pub fn unrecognized(line: usize, text: &str) -> Self {
        Self::UnrecognizedLine {
            line,
            text: text.to_string(),
        }
    }

    /// Creates a malformed-value error with context.
    pub fn malformed_value(line: usize, text: &str) -> Self {
        Self::MalformedValue {
            line,
            text: text.to_string(),
        }
    }
}
