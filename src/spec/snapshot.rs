//! Immutable endpoint spec snapshot.
//!
//! A `SpecDoc` is shared behind an `Arc` and never mutated in place; the
//! builder-style methods return a fresh snapshot instead.

use crate::error::SpecError;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
pub struct SpecDoc(Arc<Map<String, Value>>);

impl SpecDoc {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(Arc::new(map))
    }

    pub fn empty() -> Self {
        Self::new(Map::new())
    }

    /// Wrap a JSON value; only objects are valid spec documents.
    pub fn from_value(name: &str, value: Value) -> Result<Self, SpecError> {
        match value {
            Value::Object(map) => Ok(Self::new(map)),
            other => Err(SpecError::Invalid(format!(
                "{} must be an object, found {}",
                name,
                type_name(&other)
            ))),
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.as_ref().clone())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn methods(&self) -> Option<&Value> {
        self.get("methods")
    }

    pub fn url(&self) -> Option<&Map<String, Value>> {
        self.get("url").and_then(Value::as_object)
    }

    pub fn paths(&self) -> Option<&Value> {
        self.url().and_then(|u| u.get("paths"))
    }

    pub fn parts(&self) -> Option<&Map<String, Value>> {
        self.url().and_then(|u| u.get("parts")).and_then(Value::as_object)
    }

    pub fn params(&self) -> Option<&Map<String, Value>> {
        self.url().and_then(|u| u.get("params")).and_then(Value::as_object)
    }

    pub fn commands(&self) -> Option<&Map<String, Value>> {
        self.get("commands").and_then(Value::as_object)
    }

    pub fn command(&self, name: &str) -> Option<&Value> {
        self.commands().and_then(|c| c.get(name))
    }

    /// New snapshot with `commands` replaced.
    pub fn with_commands(&self, commands: Map<String, Value>) -> SpecDoc {
        let mut map = self.0.as_ref().clone();
        map.insert("commands".into(), Value::Object(commands));
        SpecDoc::new(map)
    }

    /// New snapshot whose `commands` map holds only `name`. A spec without
    /// commands is returned as is.
    pub fn narrowed_to(&self, name: &str) -> SpecDoc {
        if self.commands().is_none() {
            return self.clone();
        }
        let mut only = Map::new();
        only.insert(name.to_string(), self.command(name).cloned().unwrap_or(Value::Null));
        self.with_commands(only)
    }
}

impl Serialize for SpecDoc {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: Value) -> SpecDoc {
        SpecDoc::from_value("test", v).unwrap()
    }

    #[test]
    fn narrowing_keeps_only_the_named_command() {
        let spec = doc(json!({
            "methods": ["POST"],
            "commands": {"create": {"type": "object"}, "delete": {"type": "object"}}
        }));
        let narrowed = spec.narrowed_to("create");
        let commands = narrowed.commands().unwrap();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands["create"], json!({"type": "object"}));
        assert_eq!(spec.commands().unwrap().len(), 2);
    }

    #[test]
    fn narrowing_to_unknown_command_yields_null_entry() {
        let spec = doc(json!({"commands": {"create": {}}}));
        assert_eq!(spec.narrowed_to("nope").commands().unwrap()["nope"], Value::Null);
    }

    #[test]
    fn narrowing_without_commands_is_identity() {
        let spec = doc(json!({"methods": ["GET"]}));
        assert_eq!(spec.narrowed_to("x"), spec);
    }

    #[test]
    fn non_object_documents_are_rejected() {
        let err = SpecDoc::from_value("s", json!(["GET"])).unwrap_err();
        assert!(err.to_string().contains("found array"));
    }

    #[test]
    fn url_accessors_read_nested_sections() {
        let spec = doc(json!({
            "url": {
                "paths": ["/c/{collection}"],
                "parts": {"collection": {"type": "string"}},
                "params": {"wt": {"type": "string", "description": "writer"}}
            }
        }));
        assert_eq!(spec.paths(), Some(&json!(["/c/{collection}"])));
        assert!(spec.parts().unwrap().contains_key("collection"));
        assert!(spec.params().unwrap().contains_key("wt"));
    }
}
