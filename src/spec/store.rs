//! Spec store: resolves spec names into cached, self-contained snapshots.

use crate::error::SpecError;
use crate::spec::loader::ResourceLoader;
use crate::spec::snapshot::{type_name, SpecDoc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

/// Maximum chain length of command references (`"commands": {"x": "other.spec"}`).
pub const MAX_REF_DEPTH: usize = 4;

/// Loads specs on first use and caches them for the life of the store.
pub struct SpecStore {
    loader: Box<dyn ResourceLoader>,
    cache: RwLock<HashMap<String, SpecDoc>>,
}

impl SpecStore {
    pub fn new(loader: impl ResourceLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Spec registered under `name`, with every command reference resolved.
    pub fn get(&self, name: &str) -> Result<SpecDoc, SpecError> {
        self.load(name, 0)
    }

    /// Copy of `spec` for introspection; with a command filter the `commands`
    /// map is narrowed to that single command.
    pub fn introspection_view(spec: &SpecDoc, command: Option<&str>) -> SpecDoc {
        match command {
            Some(name) => spec.narrowed_to(name),
            None => spec.clone(),
        }
    }

    pub fn is_cached(&self, name: &str) -> bool {
        self.cache
            .read()
            .map(|cache| cache.contains_key(name))
            .unwrap_or(false)
    }

    fn load(&self, name: &str, depth: usize) -> Result<SpecDoc, SpecError> {
        {
            let cache = self
                .cache
                .read()
                .map_err(|_| SpecError::Load("spec cache lock".into()))?;
            if let Some(spec) = cache.get(name) {
                return Ok(spec.clone());
            }
        }
        // Resolved without holding the lock; a concurrent first load of the
        // same name may resolve twice, and every caller gets the first snapshot cached.
        let spec = self.resolve(name, depth)?;
        let mut cache = self
            .cache
            .write()
            .map_err(|_| SpecError::Load("spec cache lock".into()))?;
        Ok(cache.entry(name.to_string()).or_insert(spec).clone())
    }

    fn resolve(&self, name: &str, depth: usize) -> Result<SpecDoc, SpecError> {
        if depth > MAX_REF_DEPTH {
            return Err(SpecError::Invalid(format!(
                "command reference chain too deep at {} (max {})",
                name, MAX_REF_DEPTH
            )));
        }
        let document = self.loader.load_resource(name)?;
        let Value::Object(mut document) = document else {
            return Err(SpecError::Invalid(format!("{} must be an object", name)));
        };
        let body = document
            .remove(name)
            .ok_or_else(|| SpecError::Invalid(format!("{}: missing top-level '{}' entry", name, name)))?;
        let mut body = match body {
            Value::Object(map) => map,
            other => {
                return Err(SpecError::Invalid(format!(
                    "{}: '{}' must be an object, found {}",
                    name,
                    name,
                    type_name(&other)
                )))
            }
        };

        if let Some(Value::Object(commands)) = body.get_mut("commands") {
            for (command, value) in commands.iter_mut() {
                if let Value::String(reference) = value {
                    tracing::debug!(spec = %name, command = %command, reference = %reference, "resolving command reference");
                    let resolved = self.load(reference, depth + 1)?;
                    *value = resolved.to_value();
                }
            }
        }
        Ok(SpecDoc::new(body))
    }
}
