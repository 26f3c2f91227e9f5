//! # Wine Registry Text Format Parser
//!
//! A parser and writer for the line-oriented registry export files Wine
//! keeps in its prefixes (`user.reg`, `system.reg`), with a byte-for-byte
//! round-trip guarantee.
//!
//! ## Features
//!
//! - **Lossless round-trip**: rendering an unmodified document reproduces
//!   the loaded text exactly, including timestamp precision and blank-line
//!   placement
//! - **Type-safe values**: string and dword values are a tagged enum, not
//!   stringly-typed payloads
//! - **Fail-fast parsing**: malformed input yields an error naming the
//!   offending line, never a partial tree
//! - **Order preserving**: keys, metas, and values keep source order, so
//!   re-rendered diffs stay minimal after edits
//!
//! ## Architecture
//!
//! The crate is built on three layers, leaves first:
//!
//! 1. **Line classifier**: tags each physical line (key header, meta,
//!    value assignment, blank, other) and folds `\`-continued lines
//! 2. **Tree builder**: assembles classified lines into a [`Registry`] of
//!    ordered [`RegKey`] sections
//! 3. **Renderer**: walks the tree back to text, applying the exact
//!    per-type formatting rules
//!
//! ## Document Layout
//!
//! ```text
//! WINE REGISTRY Version 2
//! ;; All keys relative to \\User\\S-1-5-21-0-0-0-1000
//!
//! #arch=win64
//!
//! [Control Panel\\Keyboard] 1477412318     <- key path + Unix timestamp
//! #time=1d22edb71813e3c                    <- key meta
//! "KeyboardSpeed"="31"                     <- string value
//! "CaretWidth"=dword:00000001              <- dword value
//! ```
//!
//! ## Examples
//!
//! ```no_run
//! use winereg::{Registry, RegValue};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut registry = Registry::load("user.reg")?;
//!
//! // Query a value; absence is a normal outcome, not an error.
//! if let Some(value) = registry.query("Control Panel/Keyboard", "KeyboardSpeed") {
//!     println!("KeyboardSpeed = {:?}", value.as_str());
//! }
//!
//! // Update in place and write back.
//! registry.set_value("Software/Wine/Fonts", "LogPixels", RegValue::Dword(96));
//! registry.save("user.reg")?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Handling both value kinds
//!
//! ```
//! use winereg::RegValue;
//!
//! fn describe(value: &RegValue) -> String {
//!     match value {
//!         RegValue::String(s) => format!("string {:?}", s),
//!         RegValue::Dword(d) => format!("dword {:#010x}", d),
//!         RegValue::Raw(raw) => format!("raw payload ({} bytes)", raw.len()),
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod key;
pub mod line;
pub mod registry;
pub mod timestamp;
pub mod value;

// Python bindings (only compiled when the python feature is enabled)
#[cfg(feature = "python")]
pub mod python;

// Re-export main types for convenience
pub use error::{RegistryError, Result};
pub use key::RegKey;
pub use line::{Line, LineClassifier};
pub use registry::Registry;
pub use timestamp::Timestamp;
pub use value::RegValue;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
