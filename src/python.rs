//! Python bindings for the Wine registry parser using PyO3.
//!
//! This module provides Python-friendly wrappers around the core Rust
//! types for the Python hosting application.

use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;

use crate::{RegValue, Registry as RustRegistry, RegistryError};

/// Convert Rust RegistryError to Python exception
fn registry_error_to_py(err: RegistryError) -> PyErr {
    match err {
        RegistryError::Io(e) => PyIOError::new_err(e.to_string()),
        other => PyValueError::new_err(other.to_string()),
    }
}

/// Convert a registry value to the Python object the original API exposed:
/// strings stay strings, dwords become ints, raw payloads stay text.
fn value_to_py(py: Python, value: &RegValue) -> PyObject {
    match value {
        RegValue::String(s) => s.into_py(py),
        RegValue::Dword(d) => d.into_py(py),
        RegValue::Raw(raw) => raw.into_py(py),
    }
}

/// Python wrapper for Registry
#[pyclass(name = "Registry")]
pub struct PyRegistry {
    inner: RustRegistry,
}

#[pymethods]
impl PyRegistry {
    /// Create an empty registry for the given architecture
    #[new]
    fn new(arch: &str) -> PyRegistry {
        PyRegistry {
            inner: RustRegistry::new(arch),
        }
    }

    /// Load a registry file from disk
    #[staticmethod]
    fn load(path: &str, py: Python) -> PyResult<PyRegistry> {
        // Release GIL during file I/O and parsing
        let inner = py
            .allow_threads(|| RustRegistry::load(path))
            .map_err(registry_error_to_py)?;
        Ok(PyRegistry { inner })
    }

    /// Parse a registry document from text
    #[staticmethod]
    fn parse(text: &str, py: Python) -> PyResult<PyRegistry> {
        let inner = py
            .allow_threads(|| RustRegistry::parse(text))
            .map_err(registry_error_to_py)?;
        Ok(PyRegistry { inner })
    }

    /// Document format version
    #[getter]
    fn version(&self) -> u32 {
        self.inner.version()
    }

    /// Architecture tag from the prologue
    #[getter]
    fn arch(&self) -> String {
        self.inner.arch().to_string()
    }

    /// Normalized paths of all keys, in document order
    fn keys(&self) -> Vec<String> {
        self.inner.keys().map(|key| key.path().to_string()).collect()
    }

    /// Look up a value; returns None when the key or value is absent
    fn query(&self, key_path: &str, name: &str, py: Python) -> Option<PyObject> {
        self.inner
            .query(key_path, name)
            .map(|value| value_to_py(py, value))
    }

    /// Look up a key meta field
    fn get_meta(&self, key_path: &str, name: &str) -> Option<String> {
        self.inner
            .get_key(key_path)
            .and_then(|key| key.get_meta(name))
            .map(str::to_string)
    }

    /// Timestamp of a key as seconds since the Unix epoch
    fn timestamp(&self, key_path: &str) -> Option<f64> {
        self.inner
            .get_key(key_path)
            .map(|key| key.timestamp().as_secs_f64())
    }

    /// Set a value (str or int), creating the key when absent
    fn set_value(&mut self, key_path: &str, name: &str, value: &PyAny) -> PyResult<()> {
        let value = if let Ok(s) = value.extract::<String>() {
            RegValue::String(s)
        } else if let Ok(d) = value.extract::<u32>() {
            RegValue::Dword(d)
        } else {
            return Err(PyValueError::new_err("expected str or int value"));
        };
        self.inner.set_value(key_path, name, value);
        Ok(())
    }

    /// Drop every value of a key
    fn clear_key(&mut self, key_path: &str) {
        self.inner.clear_key(key_path);
    }

    /// Render the whole document as text
    fn render(&self) -> String {
        self.inner.render()
    }

    /// Render and write the document to disk
    fn save(&self, path: &str, py: Python) -> PyResult<()> {
        // Release GIL during file I/O
        py.allow_threads(|| self.inner.save(path))
            .map_err(registry_error_to_py)
    }

    fn __repr__(&self) -> String {
        format!(
            "Registry(version={}, arch='{}', keys={})",
            self.inner.version(),
            self.inner.arch(),
            self.inner.key_count()
        )
    }
}

/// Python module definition
#[pymodule]
fn winereg(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<PyRegistry>()?;

    // Add version constant
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
