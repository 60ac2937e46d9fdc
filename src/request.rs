//! Per-request context handed to endpoints: method, path, captures, parameters,
//! parsed command operations and the response sink.

use crate::error::ApiError;
use crate::response::Response;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// HTTP verbs an endpoint spec may declare.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 4] = [HttpMethod::Get, HttpMethod::Post, HttpMethod::Put, HttpMethod::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Only POST carries command operations in its body.
    pub fn is_body_bearing(&self) -> bool {
        matches!(self, HttpMethod::Post)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unsupported method: {}", s))
    }
}

/// Read access to request parameters.
pub trait Params: Send + Sync {
    /// First value of `name`.
    fn get(&self, name: &str) -> Option<String> {
        self.get_all(name).and_then(|v| v.into_iter().next())
    }

    /// All values of `name`.
    fn get_all(&self, name: &str) -> Option<Vec<String>>;

    fn names(&self) -> Vec<String>;
}

/// Multi-valued query-string parameters, in request order.
#[derive(Clone, Debug, Default)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl Params for QueryParams {
    fn get_all(&self, name: &str) -> Option<Vec<String>> {
        let values: Vec<String> = self
            .pairs
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
            .collect();
        (!values.is_empty()).then_some(values)
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for (k, _) in &self.pairs {
            if !names.contains(k) {
                names.push(k.clone());
            }
        }
        names
    }
}

/// One named operation from a command body, e.g. `{"create": {"name": "films"}}`.
#[derive(Clone, Debug, PartialEq)]
pub struct CommandOperation {
    pub name: String,
    pub data: Value,
}

impl CommandOperation {
    pub fn new(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Data as a map; non-object payloads have no addressable fields.
    pub fn data_map(&self) -> Option<&Map<String, Value>> {
        self.data.as_object()
    }

    /// Parse a command body. Keys are command names in document order, and a
    /// repeated key yields one operation per occurrence; an array value repeats
    /// the command once per element.
    pub fn parse_body(body: &str) -> Result<Vec<CommandOperation>, ApiError> {
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        let entries: BodyEntries = serde_json::from_str(body).map_err(|e| {
            if e.is_data() {
                ApiError::BadRequest("command body must be a JSON object".into())
            } else {
                ApiError::BadRequest(format!("invalid command body: {}", e))
            }
        })?;
        let mut ops = Vec::new();
        for (name, data) in entries.0 {
            match data {
                Value::Array(items) => ops.extend(items.into_iter().map(|d| CommandOperation::new(name.clone(), d))),
                data => ops.push(CommandOperation::new(name, data)),
            }
        }
        Ok(ops)
    }
}

/// Top-level entries of a command body. A `serde_json::Map` would fold
/// duplicate keys into one, so the object is read entry by entry.
struct BodyEntries(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for BodyEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = BodyEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object keyed by command name")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<BodyEntries, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(1));
                while let Some((name, data)) = map.next_entry::<String, Value>()? {
                    entries.push((name, data));
                }
                Ok(BodyEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

impl fmt::Display for CommandOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = Map::new();
        map.insert(self.name.clone(), self.data.clone());
        write!(f, "{}", Value::Object(map))
    }
}

/// Everything an endpoint sees of one request.
pub struct RequestContext {
    method: HttpMethod,
    path: String,
    path_values: HashMap<String, String>,
    params: Arc<dyn Params>,
    commands: Vec<CommandOperation>,
    pub response: Response,
}

impl RequestContext {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            path_values: HashMap::new(),
            params: Arc::new(QueryParams::default()),
            commands: Vec::new(),
            response: Response::new(),
        }
    }

    pub fn with_params(mut self, params: impl Params + 'static) -> Self {
        self.params = Arc::new(params);
        self
    }

    pub fn with_commands(mut self, commands: Vec<CommandOperation>) -> Self {
        self.commands = commands;
        self
    }

    pub fn with_path_values(mut self, values: HashMap<String, String>) -> Self {
        self.path_values = values;
        self
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Named-wildcard captures from the matched path template.
    pub fn path_values(&self) -> &HashMap<String, String> {
        &self.path_values
    }

    pub fn path_values_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.path_values
    }

    /// Currently active parameter view.
    pub fn params(&self) -> &dyn Params {
        self.params.as_ref()
    }

    pub(crate) fn params_handle(&self) -> Arc<dyn Params> {
        Arc::clone(&self.params)
    }

    /// Install `params` as the active view and return the previous one.
    pub(crate) fn replace_params(&mut self, params: Arc<dyn Params>) -> Arc<dyn Params> {
        std::mem::replace(&mut self.params, params)
    }

    /// Command operations parsed from the request body.
    pub fn commands(&self) -> &[CommandOperation] {
        &self.commands
    }
}
