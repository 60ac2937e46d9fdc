//! Response sink filled in by endpoints.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

/// Ordered key/value pairs; adding an existing key appends another entry
/// instead of replacing the first one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Response {
    values: Vec<(String, Value)>,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.push((key.into(), value.into()));
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_all(&self, key: &str) -> Vec<&Value> {
        self.values.iter().filter(|(k, _)| k == key).map(|(_, v)| v).collect()
    }

    /// Push `value` onto the list stored under `key`, creating the list on first use.
    pub fn append_to_list(&mut self, key: &str, value: impl Into<Value>) {
        let existing = self
            .values
            .iter_mut()
            .find_map(|(k, v)| if k == key { v.as_array_mut() } else { None });
        match existing {
            Some(list) => list.push(value.into()),
            None => self.add(key, Value::Array(vec![value.into()])),
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Serialize for Response {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (k, v) in &self.values {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
