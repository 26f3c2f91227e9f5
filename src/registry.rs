//! Registry document: loading, tree building, query/update, rendering.

use crate::error::{RegistryError, Result};
use crate::key::RegKey;
use crate::line::{Line, LineClassifier};
use crate::value::{escape, RegValue};
use indexmap::IndexMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Prefix of the document version line.
const VERSION_HEADER: &str = "WINE REGISTRY Version ";

/// Prefix of the `relative to` prologue comment.
const RELATIVE_TO_HEADER: &str = ";; All keys relative to ";

/// An in-memory Wine registry document.
///
/// Owns every [`RegKey`] of the document, in the order they appeared in
/// the source text. Rendering an unmodified `Registry` reproduces the
/// loaded text byte for byte; that round-trip is the central contract of
/// this crate.
///
/// Parsing is fail-fast: malformed input never yields a partial tree.
/// Concurrent access is the caller's concern; there is no internal
/// locking.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Registry {
    version: u32,
    arch: String,
    relative_to: Option<String>,
    /// Prologue lines before the first key, verbatim (minus the blank
    /// separator preceding the first section).
    prologue: Vec<String>,
    keys: IndexMap<String, RegKey>,
    /// Whether the source text ended with a newline.
    trailing_newline: bool,
}

impl Registry {
    /// Creates an empty document with the standard Wine prologue.
    pub fn new(arch: &str) -> Self {
        Self {
            version: 2,
            arch: arch.to_string(),
            relative_to: None,
            prologue: vec![
                format!("{}{}", VERSION_HEADER, 2),
                format!("#arch={}", arch),
            ],
            keys: IndexMap::new(),
            trailing_newline: true,
        }
    }

    /// Reads and parses a registry file.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Io`] if the file cannot be read; any format error
    /// from [`parse`](Self::parse) otherwise.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        info!("loading registry file");
        let text = fs::read_to_string(&path)?;
        let registry = Self::parse(&text)?;
        debug!(keys = registry.keys.len(), "registry file loaded");
        Ok(registry)
    }

    /// Parses a registry document from text.
    ///
    /// # Errors
    ///
    /// Fails atomically on the first malformed line; the error names the
    /// line and carries its text.
    pub fn parse(text: &str) -> Result<Self> {
        let (body, trailing_newline) = match text.strip_suffix('\n') {
            Some(body) => (body, true),
            None => (text, false),
        };

        let mut version = None;
        let mut arch = None;
        let mut relative_to = None;
        let mut prologue: Vec<String> = Vec::new();
        let mut keys: IndexMap<String, RegKey> = IndexMap::new();

        for item in LineClassifier::new(body) {
            let (line, classified) = item?;
            match classified {
                Line::KeyHeader { path, timestamp } => {
                    if keys.is_empty() && prologue.last().is_some_and(|l| l.is_empty()) {
                        // Blank separator before the first section.
                        prologue.pop();
                    }
                    if keys.contains_key(&path) {
                        return Err(RegistryError::DuplicateKey { line, path });
                    }
                    keys.insert(path.clone(), RegKey::from_header(path, timestamp));
                }

                Line::Meta { name, value } => match keys.last_mut() {
                    Some((_, key)) => key.set_meta(name, value),
                    None => {
                        if name == "arch" {
                            arch = Some(value.clone());
                        }
                        prologue.push(format!("#{}={}", name, value));
                    }
                },

                Line::Value { name, value } => match keys.last_mut() {
                    Some((_, key)) => key.set_subkey(name, value),
                    None => {
                        return Err(RegistryError::ValueOutsideKey {
                            line,
                            text: render_assignment(&name, &value),
                        })
                    }
                },

                // Blank lines between sections are separators; prologue
                // blanks are part of the verbatim prologue.
                Line::Blank => {
                    if keys.is_empty() {
                        prologue.push(String::new());
                    }
                }

                Line::Other(raw) => {
                    if keys.is_empty() {
                        if let Some(v) = raw.strip_prefix(VERSION_HEADER) {
                            version = Some(
                                v.trim()
                                    .parse::<u32>()
                                    .map_err(|_| RegistryError::unrecognized(line, &raw))?,
                            );
                        } else if let Some(rel) = raw.strip_prefix(RELATIVE_TO_HEADER) {
                            relative_to = Some(rel.to_string());
                        }
                        prologue.push(raw);
                    } else if raw.starts_with('#') {
                        return Err(RegistryError::MalformedMeta { line, text: raw });
                    } else {
                        return Err(RegistryError::unrecognized(line, &raw));
                    }
                }
            }
        }

        let version = version.ok_or(RegistryError::MissingHeader { what: "version" })?;
        let arch = arch.ok_or(RegistryError::MissingHeader {
            what: "architecture",
        })?;

        debug!(keys = keys.len(), version, "parsed registry document");

        Ok(Self {
            version,
            arch,
            relative_to,
            prologue,
            keys,
            trailing_newline,
        })
    }

    /// Renders the whole document.
    ///
    /// For an unmodified registry this is byte-identical to the loaded
    /// text. Sections are separated by one blank line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.prologue {
            out.push_str(line);
            out.push('\n');
        }
        for key in self.keys.values() {
            out.push('\n');
            out.push_str(&key.render());
        }
        if !self.trailing_newline {
            out.pop();
        }
        out
    }

    /// Renders and writes the document to `path`.
    ///
    /// Writes to a temporary file next to the target and renames it into
    /// place, so a failed write never leaves a truncated registry behind.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let tmp_path = tmp_sibling(path);

        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(self.render().as_bytes())?;
            file.flush()?;
        }
        fs::rename(&tmp_path, path)?;

        info!(keys = self.keys.len(), "registry file saved");
        Ok(())
    }

    /// Document format version from the prologue (e.g. `2`).
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Architecture tag from the `#arch=` prologue line (e.g. `"win64"`).
    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// Body of the `;; All keys relative to` prologue comment, if present.
    pub fn relative_to(&self) -> Option<&str> {
        self.relative_to.as_deref()
    }

    /// Number of keys in the document.
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Iterates over keys in document order.
    pub fn keys(&self) -> impl Iterator<Item = &RegKey> {
        self.keys.values()
    }

    /// Looks up a key by normalized path (`/` separators).
    pub fn get_key(&self, path: &str) -> Option<&RegKey> {
        self.keys.get(path)
    }

    /// Mutable key lookup.
    pub fn get_key_mut(&mut self, path: &str) -> Option<&mut RegKey> {
        self.keys.get_mut(path)
    }

    /// Looks up a value under a key path. Absence of the key or the value
    /// is a normal outcome, not an error.
    pub fn query(&self, key_path: &str, name: &str) -> Option<&RegValue> {
        self.get_key(key_path)?.get_subkey(name)
    }

    /// Sets a value, creating the key (appended after the last section)
    /// when it does not exist yet.
    pub fn set_value(&mut self, key_path: &str, name: impl Into<String>, value: RegValue) {
        self.keys
            .entry(key_path.to_string())
            .or_insert_with(|| RegKey::new(key_path))
            .set_subkey(name, value);
    }

    /// Drops every value of the key at `path`. A missing key is a no-op.
    pub fn clear_key(&mut self, path: &str) {
        if let Some(key) = self.keys.get_mut(path) {
            key.clear_subkeys();
        }
    }

    /// Drops the named values of the key at `path`, keeping the rest in
    /// order.
    pub fn clear_subkeys<'n>(&mut self, path: &str, names: impl IntoIterator<Item = &'n str>) {
        if let Some(key) = self.keys.get_mut(path) {
            for name in names {
                key.remove_subkey(name);
            }
        }
    }
}

/// Reconstructs the wire form of an assignment for error messages.
fn render_assignment(name: &str, value: &RegValue) -> String {
    if name == "@" {
        format!("@={}", value.render())
    } else {
        format!("\"{}\"={}", escape(name), value.render())
    }
}

/// Sibling path used for atomic writes (`user.reg` -> `user.reg.tmp`).
fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::Timestamp;

    const MINIMAL: &str = "WINE REGISTRY Version 2\n\
                           ;; All keys relative to \\\\User\\\\S-1-5-21-0-0-0-1000\n\
                           \n\
                           #arch=win64\n\
                           \n\
                           [Control Panel\\\\Keyboard] 1477412318\n\
                           #time=1d22edb71813e3c\n\
                           \"KeyboardSpeed\"=\"31\"\n";

    #[test]
    fn test_parse_minimal_document() {
        let registry = Registry::parse(MINIMAL).unwrap();
        assert_eq!(registry.version(), 2);
        assert_eq!(registry.arch(), "win64");
        assert_eq!(
            registry.relative_to(),
            Some("\\\\User\\\\S-1-5-21-0-0-0-1000")
        );
        assert_eq!(registry.key_count(), 1);

        let key = registry.get_key("Control Panel/Keyboard").unwrap();
        assert_eq!(key.timestamp(), &Timestamp::Seconds(1477412318));
        assert_eq!(key.get_meta("time"), Some("1d22edb71813e3c"));
    }

    #[test]
    fn test_minimal_document_roundtrips() {
        let registry = Registry::parse(MINIMAL).unwrap();
        assert_eq!(registry.render(), MINIMAL);
    }

    #[test]
    fn test_roundtrip_without_trailing_newline() {
        let text = MINIMAL.strip_suffix('\n').unwrap();
        let registry = Registry::parse(text).unwrap();
        assert_eq!(registry.render(), text);
    }

    #[test]
    fn test_missing_version_header() {
        let err = Registry::parse("#arch=win64\n").unwrap_err();
        assert!(matches!(
            err,
            RegistryError::MissingHeader { what: "version" }
        ));
    }

    #[test]
    fn test_missing_arch_header() {
        let err = Registry::parse("WINE REGISTRY Version 2\n").unwrap_err();
        assert!(matches!(
            err,
            RegistryError::MissingHeader {
                what: "architecture"
            }
        ));
    }

    #[test]
    fn test_value_before_any_key() {
        let text = "WINE REGISTRY Version 2\n#arch=win64\n\"stray\"=\"1\"\n";
        let err = Registry::parse(text).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::ValueOutsideKey { line: 3, .. }
        ));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let text = "WINE REGISTRY Version 2\n#arch=win64\n\n[Dup] 1\n\n[Dup] 2\n";
        let err = Registry::parse(text).unwrap_err();
        match err {
            RegistryError::DuplicateKey { line, path } => {
                assert_eq!(line, 6);
                assert_eq!(path, "Dup");
            }
            other => panic!("expected DuplicateKey, got {:?}", other),
        }
    }

    #[test]
    fn test_set_value_creates_key_at_end() {
        let mut registry = Registry::parse(MINIMAL).unwrap();
        registry.set_value("Software/Wine", "Version", RegValue::String("9.0".to_string()));

        let paths: Vec<&str> = registry.keys().map(|k| k.path()).collect();
        assert_eq!(paths, vec!["Control Panel/Keyboard", "Software/Wine"]);
        assert_eq!(
            registry.query("Software/Wine", "Version"),
            Some(&RegValue::String("9.0".to_string()))
        );

        let rendered = registry.render();
        assert!(rendered.ends_with("\"Version\"=\"9.0\"\n"));
        // The new section is separated from the previous one.
        assert!(rendered.contains("\"31\"\n\n[Software\\\\Wine] "));
    }

    #[test]
    fn test_query_misses_are_none() {
        let registry = Registry::parse(MINIMAL).unwrap();
        assert!(registry.query("No/Such/Key", "x").is_none());
        assert!(registry.query("Control Panel/Keyboard", "x").is_none());
    }

    #[test]
    fn test_clear_key_and_subkeys() {
        let mut registry = Registry::parse(MINIMAL).unwrap();
        registry.set_value(
            "Control Panel/Keyboard",
            "KeyboardDelay",
            RegValue::String("1".to_string()),
        );
        registry.clear_subkeys("Control Panel/Keyboard", ["KeyboardSpeed"]);
        let key = registry.get_key("Control Panel/Keyboard").unwrap();
        assert_eq!(key.subkey_count(), 1);
        assert!(key.get_subkey("KeyboardDelay").is_some());

        registry.clear_key("Control Panel/Keyboard");
        assert_eq!(
            registry.get_key("Control Panel/Keyboard").unwrap().subkey_count(),
            0
        );
    }

    #[test]
    fn test_new_registry_renders_prologue() {
        let registry = Registry::new("win32");
        assert_eq!(
            registry.render(),
            "WINE REGISTRY Version 2\n#arch=win32\n"
        );
    }
}
