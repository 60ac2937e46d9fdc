//! Spec validation: methods, url paths, parameter and part descriptors, commands.

use crate::error::SpecError;
use crate::request::HttpMethod;
use crate::spec::snapshot::SpecDoc;
use crate::trie::{path_segments, wildcard_name};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Type tags allowed for `url.params` descriptors.
pub const KNOWN_TYPES: &[&str] = &["string", "boolean", "list", "int", "double"];

/// Type tags allowed for `url.parts` descriptors.
pub const PART_TYPES: &[&str] = &["enum", "string", "int", "number"];

/// Routing facts extracted from a valid spec.
#[derive(Clone, Debug, PartialEq)]
pub struct EndpointRoutes {
    pub methods: Vec<HttpMethod>,
    pub paths: Vec<String>,
}

pub fn validate(spec: &SpecDoc) -> Result<EndpointRoutes, SpecError> {
    let methods = validate_methods(spec.methods())?;

    let url = spec
        .url()
        .ok_or_else(|| SpecError::Invalid("'url' is required".into()))?;
    let paths = string_list(url.get("paths"), "url.paths")?;
    if paths.is_empty() {
        return Err(SpecError::Invalid("'url.paths' must not be empty".into()));
    }

    if let Some(params) = optional_map(url.get("params"), "url.params")? {
        for (name, param) in params {
            let param = descriptor(param, &format!("url.params.{}", name))?;
            check_type(param, KNOWN_TYPES, &format!("url.params.{}", name))?;
            if param.get("description").map_or(true, Value::is_null) {
                return Err(SpecError::Invalid(format!("url.params.{}: 'description' is required", name)));
            }
        }
    }

    if let Some(parts) = optional_map(url.get("parts"), "url.parts")? {
        let wildcards = wildcard_names(&paths);
        for (name, part) in parts {
            if !wildcards.contains(name.as_str()) {
                return Err(SpecError::Invalid(format!("{} is not a valid part name", name)));
            }
            let part = descriptor(part, &format!("url.parts.{}", name))?;
            check_type(part, PART_TYPES, &format!("url.parts.{}", name))?;
        }
    }

    if let Some(commands) = optional_map(spec.get("commands"), "commands")? {
        for (name, command) in commands {
            descriptor(command, &format!("commands.{}", name))?;
        }
    }

    Ok(EndpointRoutes { methods, paths })
}

/// Every `{name}` occurring across `paths`.
pub fn wildcard_names(paths: &[String]) -> HashSet<&str> {
    paths
        .iter()
        .flat_map(|p| path_segments(p))
        .filter_map(wildcard_name)
        .collect()
}

fn validate_methods(value: Option<&Value>) -> Result<Vec<HttpMethod>, SpecError> {
    let names = string_list(value, "methods")?;
    if names.is_empty() {
        return Err(SpecError::Invalid("'methods' must not be empty".into()));
    }
    let mut methods = Vec::with_capacity(names.len());
    for name in names {
        let method = name.parse::<HttpMethod>().map_err(|_| {
            SpecError::Invalid(format!(
                "methods: '{}' is not one of {:?}",
                name,
                HttpMethod::ALL.map(|m| m.as_str())
            ))
        })?;
        if !methods.contains(&method) {
            methods.push(method);
        }
    }
    Ok(methods)
}

fn string_list(value: Option<&Value>, field: &str) -> Result<Vec<String>, SpecError> {
    let items = value
        .ok_or_else(|| SpecError::Invalid(format!("'{}' is required", field)))?
        .as_array()
        .ok_or_else(|| SpecError::Invalid(format!("'{}' must be a list", field)))?;
    items
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| SpecError::Invalid(format!("'{}' entries must be strings", field)))
        })
        .collect()
}

fn optional_map<'a>(value: Option<&'a Value>, field: &str) -> Result<Option<&'a Map<String, Value>>, SpecError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(SpecError::Invalid(format!("'{}' must be an object", field))),
    }
}

fn descriptor<'a>(value: &'a Value, field: &str) -> Result<&'a Map<String, Value>, SpecError> {
    value
        .as_object()
        .ok_or_else(|| SpecError::Invalid(format!("'{}' must be an object", field)))
}

fn check_type(desc: &Map<String, Value>, allowed: &[&str], field: &str) -> Result<(), SpecError> {
    match desc.get("type").and_then(Value::as_str) {
        Some(t) if allowed.contains(&t) => Ok(()),
        Some(t) => Err(SpecError::Invalid(format!("{}: type '{}' is not one of {:?}", field, t, allowed))),
        None => Err(SpecError::Invalid(format!("{}: 'type' is required", field))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(v: Value) -> SpecDoc {
        SpecDoc::from_value("test", v).unwrap()
    }

    fn invalid(v: Value) -> String {
        match validate(&spec(v)) {
            Err(SpecError::Invalid(msg)) => msg,
            other => panic!("expected invalid spec, got {:?}", other),
        }
    }

    #[test]
    fn valid_spec_yields_methods_and_paths() {
        let routes = validate(&spec(json!({
            "methods": ["GET", "POST", "GET"],
            "url": {
                "paths": ["/c/{collection}", "/collections/{collection}"],
                "parts": {"collection": {"type": "string"}},
                "params": {"wt": {"type": "string", "description": "response writer"}}
            },
            "commands": {"modify": {"type": "object"}}
        })))
        .unwrap();
        assert_eq!(routes.methods, vec![HttpMethod::Get, HttpMethod::Post]);
        assert_eq!(routes.paths.len(), 2);
    }

    #[test]
    fn unknown_part_name_is_rejected() {
        let msg = invalid(json!({
            "methods": ["GET"],
            "url": {"paths": ["/c/{collection}"], "parts": {"shard": {"type": "string"}}}
        }));
        assert_eq!(msg, "shard is not a valid part name");
    }

    #[test]
    fn methods_must_be_supported_and_present() {
        assert!(invalid(json!({"methods": ["PATCH"], "url": {"paths": ["/a"]}})).contains("PATCH"));
        assert!(invalid(json!({"methods": [], "url": {"paths": ["/a"]}})).contains("empty"));
        assert!(invalid(json!({"url": {"paths": ["/a"]}})).contains("required"));
    }

    #[test]
    fn url_paths_are_required() {
        assert!(invalid(json!({"methods": ["GET"]})).contains("'url'"));
        assert!(invalid(json!({"methods": ["GET"], "url": {"paths": []}})).contains("empty"));
        assert!(invalid(json!({"methods": ["GET"], "url": {}})).contains("url.paths"));
    }

    #[test]
    fn params_need_known_type_and_description() {
        let no_desc = invalid(json!({
            "methods": ["GET"],
            "url": {"paths": ["/a"], "params": {"wt": {"type": "string"}}}
        }));
        assert!(no_desc.contains("description"));
        let bad_type = invalid(json!({
            "methods": ["GET"],
            "url": {"paths": ["/a"], "params": {"wt": {"type": "float", "description": "x"}}}
        }));
        assert!(bad_type.contains("float"));
    }

    #[test]
    fn part_types_are_checked() {
        let msg = invalid(json!({
            "methods": ["GET"],
            "url": {"paths": ["/c/{collection}"], "parts": {"collection": {"type": "boolean"}}}
        }));
        assert!(msg.contains("boolean"));
    }

    #[test]
    fn commands_must_be_objects() {
        let msg = invalid(json!({
            "methods": ["POST"],
            "url": {"paths": ["/a"]},
            "commands": {"create": 3}
        }));
        assert!(msg.contains("commands.create"));
    }
}
