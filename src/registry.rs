//! Endpoint registry: one path trie per HTTP method.
//!
//! Registration validates the endpoint's spec and inserts it under every
//! declared method and path template, plus an introspection endpoint at
//! `<template>/_introspect`. Registrations are serialized; lookups only take a
//! read lock and may run concurrently with each other.

use crate::error::{ApiError, SpecError};
use crate::request::{HttpMethod, RequestContext};
use crate::spec::{validate, SpecDoc, SpecStore};
use crate::trie::PathTrie;
use percent_encoding::percent_decode_str;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Path suffix of the auto-generated introspection endpoint.
pub const INTROSPECT: &str = "/_introspect";

/// Substitution key for `$handlerName` path placeholders.
pub const HANDLER_NAME: &str = "handlerName";

/// A routable unit: a spec plus the behaviour behind it.
pub trait Endpoint: Send + Sync {
    /// Name used in logs, usually the spec name.
    fn name(&self) -> &str;

    fn spec(&self, specs: &SpecStore) -> Result<SpecDoc, SpecError>;

    fn call(&self, ctx: &mut RequestContext) -> Result<(), ApiError>;
}

/// Whole-request handler that predates command dispatch.
pub trait RequestHandler: Send + Sync {
    fn handle_request(&self, ctx: &mut RequestContext) -> Result<(), ApiError>;
}

struct HandlerEndpoint {
    handler: Arc<dyn RequestHandler>,
    spec_name: String,
}

impl Endpoint for HandlerEndpoint {
    fn name(&self) -> &str {
        &self.spec_name
    }

    fn spec(&self, specs: &SpecStore) -> Result<SpecDoc, SpecError> {
        specs.get(&self.spec_name)
    }

    fn call(&self, ctx: &mut RequestContext) -> Result<(), ApiError> {
        self.handler.handle_request(ctx)
    }
}

/// Expose a plain request handler as an endpoint described by `spec_name`.
pub fn wrap_handler(handler: Arc<dyn RequestHandler>, spec_name: impl Into<String>) -> Arc<dyn Endpoint> {
    Arc::new(HandlerEndpoint {
        handler,
        spec_name: spec_name.into(),
    })
}

/// Serves the spec of `base`, optionally narrowed by a `command` parameter.
struct Introspect {
    base: Arc<dyn Endpoint>,
    specs: Arc<SpecStore>,
}

impl Endpoint for Introspect {
    fn name(&self) -> &str {
        "introspect"
    }

    fn spec(&self, _specs: &SpecStore) -> Result<SpecDoc, SpecError> {
        Ok(SpecDoc::empty())
    }

    fn call(&self, ctx: &mut RequestContext) -> Result<(), ApiError> {
        let command = ctx.params().get("command");
        let spec = self.base.spec(&self.specs)?;
        let view = SpecStore::introspection_view(&spec, command.as_deref());
        ctx.response.append_to_list("spec", view.to_value());
        Ok(())
    }
}

type EndpointTrie = PathTrie<Arc<dyn Endpoint>>;

/// Process-wide routing table. Built at startup, appended to while handlers
/// register, then read for the life of the process.
pub struct ApiRegistry {
    specs: Arc<SpecStore>,
    apis: RwLock<HashMap<HttpMethod, EndpointTrie>>,
    registering: Mutex<()>,
}

impl ApiRegistry {
    pub fn new(specs: Arc<SpecStore>) -> Self {
        Self {
            specs,
            apis: RwLock::new(HashMap::new()),
            registering: Mutex::new(()),
        }
    }

    pub fn specs(&self) -> &Arc<SpecStore> {
        &self.specs
    }

    /// Validate and register `endpoint`. A failed registration leaves the
    /// table as it was.
    pub fn register(&self, endpoint: Arc<dyn Endpoint>, substitutes: &HashMap<String, String>) -> Result<(), SpecError> {
        let _serial = self
            .registering
            .lock()
            .map_err(|_| SpecError::Load("registry lock".into()))?;
        self.validate_and_register(&endpoint, substitutes).map_err(|e| {
            tracing::error!(endpoint = %endpoint.name(), error = %e, "unable to register endpoint");
            e
        })
    }

    pub fn register_all<I>(&self, endpoints: I, substitutes: &HashMap<String, String>) -> Result<(), SpecError>
    where
        I: IntoIterator<Item = Arc<dyn Endpoint>>,
    {
        for endpoint in endpoints {
            self.register(endpoint, substitutes)?;
        }
        Ok(())
    }

    fn validate_and_register(&self, endpoint: &Arc<dyn Endpoint>, substitutes: &HashMap<String, String>) -> Result<(), SpecError> {
        let spec = endpoint.spec(&self.specs)?;
        let routes = validate(&spec)?;

        // Reject bad templates before touching the shared tries.
        let mut scratch = PathTrie::new();
        for path in &routes.paths {
            scratch.insert(path, substitutes, ())?;
        }

        let introspect: Arc<dyn Endpoint> = Arc::new(Introspect {
            base: Arc::clone(endpoint),
            specs: Arc::clone(&self.specs),
        });
        let mut apis = self
            .apis
            .write()
            .map_err(|_| SpecError::Load("registry lock".into()))?;
        for method in &routes.methods {
            let trie = apis.entry(*method).or_default();
            for path in &routes.paths {
                trie.insert(path, substitutes, Arc::clone(endpoint))?;
                trie.insert(&format!("{}{}", path, INTROSPECT), substitutes, Arc::clone(&introspect))?;
            }
        }
        tracing::info!(
            endpoint = %endpoint.name(),
            methods = ?routes.methods,
            paths = ?routes.paths,
            "registered endpoint"
        );
        Ok(())
    }

    /// Endpoint for `path` under `method`. Without a method every method's
    /// trie is tried and the first hit wins; that form is for diagnostics only.
    pub fn lookup(
        &self,
        path: &str,
        method: Option<HttpMethod>,
        captures: &mut HashMap<String, String>,
    ) -> Option<Arc<dyn Endpoint>> {
        let apis = self.apis.read().unwrap_or_else(PoisonError::into_inner);
        match method {
            Some(method) => apis.get(&method)?.lookup(path, captures).cloned(),
            None => apis.values().find_map(|trie| trie.lookup(path, captures).cloned()),
        }
    }

    /// Resolve the request's endpoint, fill its path captures and call it.
    pub fn handle(&self, ctx: &mut RequestContext) -> Result<(), ApiError> {
        let mut captures = HashMap::new();
        let endpoint = self
            .lookup(ctx.path(), Some(ctx.method()), &mut captures)
            .ok_or_else(|| ApiError::NotFound(format!("{} {}", ctx.method(), ctx.path())))?;
        tracing::debug!(method = %ctx.method(), path = %ctx.path(), endpoint = %endpoint.name(), "resolved endpoint");
        // Decoded only after matching, so an encoded '/' stays inside its segment.
        for (name, raw) in captures {
            let value = percent_decode_str(&raw)
                .decode_utf8()
                .map_err(|_| ApiError::BadRequest(format!("path segment {} is not valid UTF-8", raw)))?;
            ctx.path_values_mut().insert(name, value.into_owned());
        }
        endpoint.call(ctx)
    }

    /// Methods that have at least one registered template.
    pub fn methods(&self) -> Vec<HttpMethod> {
        let apis = self.apis.read().unwrap_or_else(PoisonError::into_inner);
        let mut methods: Vec<HttpMethod> = apis.keys().copied().collect();
        methods.sort();
        methods
    }
}
