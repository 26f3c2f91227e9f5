//! Registry value payloads: parsing, escaping, and wire rendering.

use crate::error::{RegistryError, Result};

/// A single typed value attached to a registry key.
///
/// The text format distinguishes value kinds purely by how the payload is
/// written; modeling them as a tagged enum gives callers compile-time
/// exhaustiveness when handling both typed kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum RegValue {
    /// Double-quoted string, stored decoded (`\"` and `\\` unescaped).
    String(String),

    /// 32-bit unsigned integer, written as `dword:` + 8 lowercase hex digits.
    Dword(u32),

    /// Any other payload form (`hex:`, `hex(7):`, `str(2):`, symlinks, ...),
    /// kept byte-for-byte including `\`-continuation line breaks so that
    /// rendering reproduces it verbatim.
    Raw(String),
}

impl RegValue {
    /// Parses a value payload (the text after the `=` of an assignment).
    ///
    /// `line` and `raw_line` locate the assignment for error reporting; for
    /// a continued value they refer to its first physical line.
    ///
    /// # Errors
    ///
    /// A payload that opens like a quoted string or a dword but fails to
    /// decode is a format error; only payloads in neither form fall back to
    /// [`RegValue::Raw`].
    pub fn parse(payload: &str, line: usize, raw_line: &str) -> Result<Self> {
        if let Some(hex) = payload.strip_prefix("dword:") {
            if hex.len() != 8 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(RegistryError::InvalidDword {
                    line,
                    text: raw_line.to_string(),
                });
            }
            // Unwrap safe: eight hex digits always fit a u32.
            let value = u32::from_str_radix(hex, 16).expect("validated hex digits");
            return Ok(RegValue::Dword(value));
        }

        if payload.starts_with('"') {
            let (decoded, rest) = take_quoted(payload, line, raw_line)?;
            if !rest.is_empty() {
                return Err(RegistryError::malformed_value(line, raw_line));
            }
            return Ok(RegValue::String(decoded));
        }

        Ok(RegValue::Raw(payload.to_string()))
    }

    /// Renders the payload in wire form (the text after the `=`).
    pub fn render(&self) -> String {
        match self {
            RegValue::String(s) => format!("\"{}\"", escape(s)),
            RegValue::Dword(value) => format!("dword:{:08x}", value),
            RegValue::Raw(raw) => raw.clone(),
        }
    }

    /// Returns the decoded string for string values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RegValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer for dword values.
    pub fn as_dword(&self) -> Option<u32> {
        match self {
            RegValue::Dword(value) => Some(*value),
            _ => None,
        }
    }
}

/// Escapes a string for quoted output: `\` becomes `\\`, `"` becomes `\"`.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out
}

/// Consumes a leading double-quoted string from `s`.
///
/// Returns the decoded content and the remaining text after the closing
/// quote. `s` must start with `"`.
pub(crate) fn take_quoted<'a>(
    s: &'a str,
    line: usize,
    raw_line: &str,
) -> Result<(String, &'a str)> {
    debug_assert!(s.starts_with('"'));

    let mut decoded = String::new();
    let mut chars = s.char_indices().skip(1);
    while let Some((idx, c)) = chars.next() {
        match c {
            '"' => return Ok((decoded, &s[idx + 1..])),
            '\\' => match chars.next() {
                Some((_, '"')) => decoded.push('"'),
                Some((_, '\\')) => decoded.push('\\'),
                _ => {
                    return Err(RegistryError::InvalidEscape {
                        line,
                        text: raw_line.to_string(),
                    })
                }
            },
            _ => decoded.push(c),
        }
    }

    Err(RegistryError::UnterminatedString {
        line,
        text: raw_line.to_string(),
    })
}
