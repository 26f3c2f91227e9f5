//! Key header timestamps with exact textual fidelity.
//!
//! Wine writes the last-modified time of a key after its header, either as
//! whole Unix seconds (`1477412318`) or with a sub-second fraction
//! (`1475423303.7943190`). The fractional form keeps whatever digit count
//! the writer produced, so the parsed representation has to remember the
//! source text verbatim; `f64` formatting alone would drop trailing zeros.

use crate::error::{RegistryError, Result};
use std::fmt;

/// Timestamp of a registry key, as written after the key header.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Timestamp {
    /// Whole seconds since the Unix epoch.
    Seconds(u64),

    /// Sub-second timestamp. The source text is kept so rendering
    /// reproduces the exact fractional digits.
    Fraction {
        /// Parsed numeric value.
        value: f64,
        /// Original token text, e.g. `"1475423303.7943190"`.
        text: String,
    },
}

impl Timestamp {
    /// Parses a timestamp token from a key header line.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidTimestamp`] if the token is neither
    /// an unsigned integer nor a finite decimal number.
    pub fn parse(token: &str, line: usize) -> Result<Self> {
        let invalid = || RegistryError::InvalidTimestamp {
            line,
            text: token.to_string(),
        };

        if token.contains('.') {
            let value: f64 = token.parse().map_err(|_| invalid())?;
            if !value.is_finite() || value < 0.0 {
                return Err(invalid());
            }
            Ok(Timestamp::Fraction {
                value,
                text: token.to_string(),
            })
        } else {
            let secs: u64 = token.parse().map_err(|_| invalid())?;
            Ok(Timestamp::Seconds(secs))
        }
    }

    /// Returns the timestamp as seconds since the Unix epoch.
    pub fn as_secs_f64(&self) -> f64 {
        match self {
            Timestamp::Seconds(secs) => *secs as f64,
            Timestamp::Fraction { value, .. } => *value,
        }
    }

    /// Returns whole seconds when the source had no fractional part.
    pub fn whole_secs(&self) -> Option<u64> {
        match self {
            Timestamp::Seconds(secs) => Some(*secs),
            Timestamp::Fraction { .. } => None,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Seconds(secs) => write!(f, "{}", secs),
            Timestamp::Fraction { text, .. } => f.write_str(text),
        }
    }
}
