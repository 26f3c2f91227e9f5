//! Registry key sections: ordered metas and values, per-key rendering.

use crate::timestamp::Timestamp;
use crate::value::{escape, RegValue};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;

/// Seconds between the Windows FILETIME epoch (1601) and the Unix epoch.
const FILETIME_UNIX_DIFF: u64 = 11_644_473_600;

/// One `[path]` section of a registry document.
///
/// Holds the header timestamp, the `#name=value` metas that follow the
/// header, and the named values of the section. Both maps preserve
/// insertion order; that order is what the renderer emits, so it is part
/// of the round-trip contract.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RegKey {
    path: String,
    timestamp: Timestamp,
    metas: IndexMap<String, String>,
    subkeys: IndexMap<String, RegValue>,
}

impl RegKey {
    /// Creates a fresh key the way the Wine writer does: current time as
    /// the header timestamp and a Windows FILETIME `#time=` meta.
    ///
    /// `path` uses `/` separators (e.g. `"Software/Wine/Fonts"`).
    pub fn new(path: impl Into<String>) -> Self {
        Self::new_at(path, Utc::now())
    }

    fn new_at(path: impl Into<String>, now: DateTime<Utc>) -> Self {
        let mut metas = IndexMap::new();
        metas.insert("time".to_string(), windows_filetime_hex(&now));
        Self {
            path: path.into(),
            timestamp: Timestamp::Seconds(now.timestamp().max(0) as u64),
            metas,
            subkeys: IndexMap::new(),
        }
    }

    /// Creates a key from a parsed section header.
    pub(crate) fn from_header(path: String, timestamp: Timestamp) -> Self {
        Self {
            path,
            timestamp,
            metas: IndexMap::new(),
            subkeys: IndexMap::new(),
        }
    }

    /// Returns the normalized key path (`/` separators).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the path as written in the file (`\\` separators).
    pub fn raw_path(&self) -> String {
        self.path.replace('/', "\\\\")
    }

    /// Returns the header timestamp.
    pub fn timestamp(&self) -> &Timestamp {
        &self.timestamp
    }

    /// Looks up a value by name. The default value is named `"@"`.
    pub fn get_subkey(&self, name: &str) -> Option<&RegValue> {
        self.subkeys.get(name)
    }

    /// Updates or inserts a value.
    ///
    /// An update keeps the value's position in the section; an insert
    /// appends at the end. Downstream consumers diff rendered files, so
    /// this placement is deliberate.
    pub fn set_subkey(&mut self, name: impl Into<String>, value: RegValue) {
        self.subkeys.insert(name.into(), value);
    }

    /// Removes a value by name, keeping the order of the remaining ones.
    pub fn remove_subkey(&mut self, name: &str) -> Option<RegValue> {
        self.subkeys.shift_remove(name)
    }

    /// Drops every value of this key.
    pub fn clear_subkeys(&mut self) {
        self.subkeys.clear();
    }

    /// Looks up a meta field by name.
    pub fn get_meta(&self, name: &str) -> Option<&str> {
        self.metas.get(name).map(String::as_str)
    }

    /// Updates or inserts a meta field; same ordering rules as
    /// [`set_subkey`](Self::set_subkey).
    pub fn set_meta(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.metas.insert(name.into(), value.into());
    }

    /// Iterates over values in insertion order.
    pub fn subkeys(&self) -> impl Iterator<Item = (&str, &RegValue)> {
        self.subkeys.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Iterates over meta fields in insertion order.
    pub fn metas(&self) -> impl Iterator<Item = (&str, &str)> {
        self.metas
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of values in this section.
    pub fn subkey_count(&self) -> usize {
        self.subkeys.len()
    }

    /// Renders the section: header line, metas, then values, each
    /// newline-terminated.
    pub fn render(&self) -> String {
        let mut out = format!("[{}] {}\n", self.raw_path(), self.timestamp);
        for (name, value) in &self.metas {
            out.push_str(&format!("#{}={}\n", name, value));
        }
        for (name, value) in &self.subkeys {
            if name == "@" {
                out.push_str(&format!("@={}\n", value.render()));
            } else {
                out.push_str(&format!("\"{}\"={}\n", escape(name), value.render()));
            }
        }
        out
    }
}

/// Encodes a point in time as the lowercase hex FILETIME Wine writes into
/// `#time=` metas (100ns ticks since 1601-01-01).
fn windows_filetime_hex(time: &DateTime<Utc>) -> String {
    let secs = time.timestamp().max(0) as u64 + FILETIME_UNIX_DIFF;
    let ticks = secs * 10_000_000 + u64::from(time.timestamp_subsec_nanos() / 100);
    format!("{:x}", ticks)
}
