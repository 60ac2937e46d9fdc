//! Raw spec document sources: a directory of `<name>.json` files or an in-memory map.

use crate::error::SpecError;
use serde_json::Value;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Supplies raw spec documents by logical name.
pub trait ResourceLoader: Send + Sync {
    fn load_resource(&self, name: &str) -> Result<Value, SpecError>;
}

/// Parse one document. A JSON `null` document counts as empty and is rejected.
pub fn parse_document(name: &str, text: &str) -> Result<Value, SpecError> {
    let value: Value = serde_json::from_str(text).map_err(|source| {
        tracing::error!(name = %name, error = %source, "error in spec JSON");
        SpecError::Parse {
            name: name.to_string(),
            source,
        }
    })?;
    if value.is_null() {
        return Err(SpecError::Invalid(format!("empty value for {}", name)));
    }
    Ok(value)
}

/// Reads `<root>/<name>.json`.
#[derive(Clone, Debug)]
pub struct DirLoader {
    root: PathBuf,
}

impl DirLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ResourceLoader for DirLoader {
    fn load_resource(&self, name: &str) -> Result<Value, SpecError> {
        let path = self.root.join(format!("{}.json", name));
        tracing::debug!(path = %path.display(), "loading spec resource");
        let text = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => SpecError::NotFound(name.to_string()),
            _ => SpecError::Load(format!("{}: {}", path.display(), e)),
        })?;
        parse_document(name, &text)
    }
}

/// Raw JSON text keyed by name; parsed on every load like a file would be.
#[derive(Clone, Debug, Default)]
pub struct MemoryLoader {
    docs: HashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, json: impl Into<String>) -> Self {
        self.insert(name, json);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, json: impl Into<String>) {
        self.docs.insert(name.into(), json.into());
    }
}

impl ResourceLoader for MemoryLoader {
    fn load_resource(&self, name: &str) -> Result<Value, SpecError> {
        let text = self
            .docs
            .get(name)
            .ok_or_else(|| SpecError::NotFound(name.to_string()))?;
        parse_document(name, text)
    }
}
