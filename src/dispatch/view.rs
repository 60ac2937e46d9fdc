//! Parameter view installed for the duration of one command invocation.
//!
//! Lookup order for a name, after the command's substitution is applied:
//! body data (dotted names descend into nested objects), then path captures,
//! then the original request parameters when the view allows it.

use crate::dispatch::Command;
use crate::request::{CommandOperation, Params};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

pub struct ParamView {
    command: Arc<dyn Command>,
    data: Map<String, Value>,
    path_values: HashMap<String, String>,
    fallback: Option<Arc<dyn Params>>,
}

impl ParamView {
    /// `fallback` is the original request parameters; pass `None` for
    /// body-bearing requests, whose query string is not consulted.
    pub fn new(
        command: Arc<dyn Command>,
        op: Option<&CommandOperation>,
        path_values: HashMap<String, String>,
        fallback: Option<Arc<dyn Params>>,
    ) -> Self {
        let data = op.and_then(CommandOperation::data_map).cloned().unwrap_or_default();
        Self {
            command,
            data,
            path_values,
            fallback,
        }
    }

    /// Structured body value for `name`, without path or query fallback.
    pub fn value(&self, name: &str) -> Option<&Value> {
        let name = self.command.param_substitute(name).unwrap_or(name);
        body_value(&self.data, name)
    }

    fn resolve(&self, name: &str) -> Option<Vec<String>> {
        let name = self.command.param_substitute(name).unwrap_or(name);
        if let Some(value) = body_value(&self.data, name) {
            return Some(to_strings(value));
        }
        if let Some(value) = self.path_values.get(name) {
            return Some(vec![value.clone()]);
        }
        self.fallback.as_ref().and_then(|params| params.get_all(name))
    }
}

impl Params for ParamView {
    fn get_all(&self, name: &str) -> Option<Vec<String>> {
        self.resolve(name)
    }

    fn names(&self) -> Vec<String> {
        let mut names = Vec::new();
        collect_key_names(&self.data, &mut names, "");
        names
    }
}

fn body_value<'a>(data: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    let found = if name.contains('.') {
        let mut parts = name.split('.');
        let first = parts.next().and_then(|p| data.get(p));
        parts.try_fold(first?, |value, part| value.as_object()?.get(part))
    } else {
        data.get(name)
    };
    found.filter(|v| !v.is_null())
}

fn to_strings(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(scalar_string).collect(),
        other => vec![scalar_string(other)],
    }
}

fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Dotted names of every leaf under `map`, e.g. `{"a": {"b": 1}, "c": 2}` gives
/// `a.b` and `c`.
pub fn collect_key_names(map: &Map<String, Value>, out: &mut Vec<String>, prefix: &str) {
    for (key, value) in map {
        match value {
            Value::Object(inner) => collect_key_names(inner, out, &format!("{}{}.", prefix, key)),
            _ => out.push(format!("{}{}", prefix, key)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::FnCommand;
    use crate::request::{HttpMethod, QueryParams};
    use serde_json::json;

    fn command() -> Arc<dyn Command> {
        Arc::new(
            FnCommand::new(HttpMethod::Post, "collections", |_, _| Ok(()))
                .named("create")
                .substitute("collection", "name"),
        )
    }

    fn view(data: Value, path: &[(&str, &str)], query: Option<QueryParams>) -> ParamView {
        let op = CommandOperation::new("create", data);
        let path_values = path.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        let fallback = query.map(|q| Arc::new(q) as Arc<dyn Params>);
        ParamView::new(command(), Some(&op), path_values, fallback)
    }

    #[test]
    fn dotted_names_descend_into_nested_objects() {
        let v = view(json!({"a": {"b": 5}}), &[], None);
        assert_eq!(v.get("a.b").as_deref(), Some("5"));
        assert_eq!(v.get("a.c"), None);
        assert_eq!(v.get("a.b.c"), None);
        assert_eq!(v.value("a.b"), Some(&json!(5)));
    }

    #[test]
    fn body_wins_over_path_captures() {
        let v = view(json!({"shard": "from-body"}), &[("shard", "from-path")], None);
        assert_eq!(v.get("shard").as_deref(), Some("from-body"));
    }

    #[test]
    fn path_captures_fill_gaps_in_the_body() {
        let v = view(json!({}), &[("shard", "shard1")], None);
        assert_eq!(v.get("shard").as_deref(), Some("shard1"));
    }

    #[test]
    fn query_fallback_only_when_allowed() {
        let q: QueryParams = [("wt", "json")].into_iter().collect();
        assert_eq!(view(json!({}), &[], Some(q)).get("wt").as_deref(), Some("json"));
        assert_eq!(view(json!({}), &[], None).get("wt"), None);
    }

    #[test]
    fn substitution_renames_the_requested_parameter() {
        let v = view(json!({"name": "films"}), &[], None);
        assert_eq!(v.get("collection").as_deref(), Some("films"));
    }

    #[test]
    fn sequences_become_parallel_string_arrays() {
        let v = view(json!({"shards": ["s1", 2, true]}), &[], None);
        assert_eq!(
            v.get_all("shards"),
            Some(vec!["s1".to_string(), "2".to_string(), "true".to_string()])
        );
        assert_eq!(v.get("shards").as_deref(), Some("s1"));
    }

    #[test]
    fn null_body_values_fall_through() {
        let v = view(json!({"shard": null}), &[("shard", "shard2")], None);
        assert_eq!(v.get("shard").as_deref(), Some("shard2"));
    }

    #[test]
    fn names_are_flattened_leaf_paths() {
        let v = view(json!({"name": "films", "router": {"name": "compositeId", "field": "id"}}), &[], None);
        assert_eq!(v.names(), vec!["name", "router.name", "router.field"]);
    }
}
