//! Line classification for the Wine registry text format.
//!
//! The classifier is the first layer of the parser: it walks the physical
//! lines of a document once and tags each as a key header, key meta,
//! value assignment, blank, or anything else. It is purely syntactic; the
//! tree builder in [`crate::registry`] decides what a tag means in context
//! (e.g. a `#arch=` line is document prologue before the first key header
//! and key meta after one).
//!
//! Physical lines ending in `\` continue a value payload onto the next
//! line; the classifier folds them into a single logical record, keeping
//! the embedded line breaks so raw payloads render back verbatim.

use crate::error::{RegistryError, Result};
use crate::timestamp::Timestamp;
use crate::value::{take_quoted, RegValue};

/// One classified logical line of a registry document.
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    /// `[path] timestamp` — opens a new key section. The path is
    /// normalized: the two-character `\\` separator becomes `/`.
    KeyHeader {
        /// Normalized key path.
        path: String,
        /// Timestamp token following the header.
        timestamp: Timestamp,
    },

    /// `#name=value` — key meta after a header, document header otherwise.
    Meta {
        /// Meta field name.
        name: String,
        /// Meta field value (text after the first `=`).
        value: String,
    },

    /// `"name"=payload` or `@=payload` — a value assignment. The default
    /// value (`@`) is carried under the name `"@"`.
    Value {
        /// Decoded value name.
        name: String,
        /// Parsed payload.
        value: RegValue,
    },

    /// An empty line.
    Blank,

    /// Any other line, verbatim (version header, `;;` comments, ...).
    Other(String),
}

/// Single-pass classifier over the physical lines of a document.
///
/// Yields `(line_number, Line)` pairs with one-based line numbers; not
/// restartable once consumed.
pub struct LineClassifier<'a> {
    lines: std::iter::Enumerate<std::str::Split<'a, char>>,
}

impl<'a> LineClassifier<'a> {
    /// Creates a classifier over `text`. A trailing newline yields a
    /// final blank record; the tree builder splits it off beforehand to
    /// track it separately.
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.split('\n').enumerate(),
        }
    }

    fn classify_key_header(&self, line: usize, raw: &str) -> Result<Line> {
        let malformed = || RegistryError::MalformedKeyHeader {
            line,
            text: raw.to_string(),
        };

        let close = raw.rfind(']').ok_or_else(malformed)?;
        let rest = &raw[close + 1..];
        let token = rest.strip_prefix(' ').ok_or_else(malformed)?;
        if token.is_empty() {
            return Err(malformed());
        }

        let path = raw[1..close].replace("\\\\", "/");
        let timestamp = Timestamp::parse(token, line)?;
        Ok(Line::KeyHeader { path, timestamp })
    }

    fn classify_value(&mut self, line: usize, first: &str) -> Result<Line> {
        // Fold continuation lines (trailing `\`) into one logical record.
        let mut raw = first.to_string();
        while raw.ends_with('\\') {
            match self.lines.next() {
                Some((_, next)) => {
                    raw.push('\n');
                    raw.push_str(next);
                }
                None => break,
            }
        }

        let (name, rest) = if let Some(rest) = raw.strip_prefix('@') {
            ("@".to_string(), rest)
        } else {
            take_quoted(&raw, line, &raw)?
        };

        let payload = rest
            .strip_prefix('=')
            .ok_or_else(|| RegistryError::malformed_value(line, &raw))?;

        let value = RegValue::parse(payload, line, &raw)?;
        Ok(Line::Value { name, value })
    }
}

impl<'a> Iterator for LineClassifier<'a> {
    type Item = Result<(usize, Line)>;

    fn next(&mut self) -> Option<Self::Item> {
        let (idx, raw) = self.lines.next()?;
        let line = idx + 1;

        let classified = if raw.is_empty() {
            Ok(Line::Blank)
        } else if raw.starts_with('[') {
            self.classify_key_header(line, raw)
        } else if raw.starts_with('"') || raw.starts_with('@') {
            self.classify_value(line, raw)
        } else if let Some(body) = raw.strip_prefix('#') {
            match body.split_once('=') {
                Some((name, value)) => Ok(Line::Meta {
                    name: name.to_string(),
                    value: value.to_string(),
                }),
                // A bare comment: prologue decoration or, inside a
                // section, malformed meta. The builder decides.
                None => Ok(Line::Other(raw.to_string())),
            }
        } else {
            Ok(Line::Other(raw.to_string()))
        };

        Some(classified.map(|c| (line, c)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_one(text: &str) -> Line {
        LineClassifier::new(text).next().unwrap().unwrap().1
    }

    #[test]
    fn test_classify_key_header() {
        let line = classify_one("[Software\\\\Wine\\\\Fonts] 1477412318");
        assert_eq!(
            line,
            Line::KeyHeader {
                path: "Software/Wine/Fonts".to_string(),
                timestamp: Timestamp::Seconds(1477412318),
            }
        );
    }

    #[test]
    fn test_classify_key_header_with_fraction() {
        let line = classify_one("[Control Panel\\\\Sound] 1475423303.7943190");
        match line {
            Line::KeyHeader { path, timestamp } => {
                assert_eq!(path, "Control Panel/Sound");
                assert_eq!(timestamp.to_string(), "1475423303.7943190");
            }
            other => panic!("expected key header, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_meta() {
        let line = classify_one("#time=1d21cc468677196");
        assert_eq!(
            line,
            Line::Meta {
                name: "time".to_string(),
                value: "1d21cc468677196".to_string(),
            }
        );
    }

    #[test]
    fn test_classify_string_value() {
        let line = classify_one("\"KeyboardSpeed\"=\"31\"");
        assert_eq!(
            line,
            Line::Value {
                name: "KeyboardSpeed".to_string(),
                value: RegValue::String("31".to_string()),
            }
        );
    }

    #[test]
    fn test_classify_default_value() {
        let line = classify_one("@=\"Default Beep\"");
        assert_eq!(
            line,
            Line::Value {
                name: "@".to_string(),
                value: RegValue::String("Default Beep".to_string()),
            }
        );
    }

    #[test]
    fn test_classify_escaped_value_name() {
        let line = classify_one(r#""C:\\Games"=dword:00000001"#);
        assert_eq!(
            line,
            Line::Value {
                name: r"C:\Games".to_string(),
                value: RegValue::Dword(1),
            }
        );
    }

    #[test]
    fn test_continuation_lines_fold_into_raw_payload() {
        let text = "\"CaptionFont\"=hex:f4,ff,\\\n  00,11";
        let mut classifier = LineClassifier::new(text);
        let (line, classified) = classifier.next().unwrap().unwrap();
        assert_eq!(line, 1);
        assert_eq!(
            classified,
            Line::Value {
                name: "CaptionFont".to_string(),
                value: RegValue::Raw("hex:f4,ff,\\\n  00,11".to_string()),
            }
        );
        assert!(classifier.next().is_none());
    }

    #[test]
    fn test_classify_blank_and_other() {
        let mut classifier = LineClassifier::new(";; comment\n");
        assert_eq!(
            classifier.next().unwrap().unwrap().1,
            Line::Other(";; comment".to_string())
        );
        assert_eq!(classifier.next().unwrap().unwrap().1, Line::Blank);
    }

    #[test]
    fn test_malformed_key_header() {
        let mut classifier = LineClassifier::new("[No Timestamp]");
        let err = classifier.next().unwrap().unwrap_err();
        assert!(matches!(err, RegistryError::MalformedKeyHeader { line: 1, .. }));
    }

    #[test]
    fn test_value_without_equals() {
        let mut classifier = LineClassifier::new("\"orphan name\"");
        let err = classifier.next().unwrap().unwrap_err();
        assert!(matches!(err, RegistryError::MalformedValue { line: 1, .. }));
    }

    #[test]
    fn test_line_numbers_advance() {
        let text = "first\n\n[Key] 12";
        let numbered: Vec<usize> = LineClassifier::new(text)
            .map(|item| item.unwrap().0)
            .collect();
        assert_eq!(numbered, vec![1, 2, 3]);
    }
}
