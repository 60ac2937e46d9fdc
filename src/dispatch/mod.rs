//! Command dispatch for spec-described endpoints.
//!
//! A handler declares its endpoints (by spec name) and its commands. Each
//! command is bound to one HTTP method and one endpoint. On a request the
//! dispatcher picks the single applicable command, installs a [`ParamView`]
//! over the request for the duration of the call and restores the original
//! parameters afterwards.

pub mod view;

pub use view::{collect_key_names, ParamView};

use crate::error::{ApiError, BoxError, SpecError};
use crate::registry::Endpoint;
use crate::request::{CommandOperation, HttpMethod, Params, RequestContext};
use crate::spec::{SpecDoc, SpecStore};
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// A named unit of work bound to one method and one endpoint.
pub trait Command: Send + Sync {
    /// `None` for the unnamed command (non-body methods, or an empty POST body).
    fn name(&self) -> Option<&str>;

    fn http_method(&self) -> HttpMethod;

    /// Spec name of the endpoint this command belongs to.
    fn endpoint(&self) -> &str;

    /// Name to look up in place of the requested parameter `name`, if any.
    fn param_substitute(&self, _name: &str) -> Option<&str> {
        None
    }

    fn invoke(&self, ctx: &mut RequestContext, op: Option<&CommandOperation>) -> Result<(), BoxError>;
}

/// Handles non-body requests with the resolved command instead of invoking it directly.
pub trait UrlHandler: Send + Sync {
    fn invoke_url(&self, command: &dyn Command, ctx: &mut RequestContext) -> Result<(), BoxError>;
}

type CommandFn = dyn Fn(&mut RequestContext, Option<&CommandOperation>) -> Result<(), BoxError> + Send + Sync;

/// Closure-backed [`Command`].
pub struct FnCommand {
    name: Option<String>,
    method: HttpMethod,
    endpoint: String,
    substitutes: HashMap<String, String>,
    handler: Box<CommandFn>,
}

impl FnCommand {
    pub fn new<F>(method: HttpMethod, endpoint: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut RequestContext, Option<&CommandOperation>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self {
            name: None,
            method,
            endpoint: endpoint.into(),
            substitutes: HashMap::new(),
            handler: Box::new(handler),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Answer requests for parameter `requested` with the value found under
    /// `lookup`, e.g. `substitute("collection", "name")` reads body key `name`.
    pub fn substitute(mut self, requested: impl Into<String>, lookup: impl Into<String>) -> Self {
        self.substitutes.insert(requested.into(), lookup.into());
        self
    }
}

impl Command for FnCommand {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn http_method(&self) -> HttpMethod {
        self.method
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn param_substitute(&self, name: &str) -> Option<&str> {
        self.substitutes.get(name).map(String::as_str)
    }

    fn invoke(&self, ctx: &mut RequestContext, op: Option<&CommandOperation>) -> Result<(), BoxError> {
        (self.handler)(ctx, op)
    }
}

/// Restores the request's original parameters when dropped.
struct ParamsGuard<'a> {
    ctx: &'a mut RequestContext,
    original: Option<Arc<dyn Params>>,
}

impl<'a> ParamsGuard<'a> {
    fn install(ctx: &'a mut RequestContext, view: ParamView) -> Self {
        let original = ctx.replace_params(Arc::new(view));
        Self {
            ctx,
            original: Some(original),
        }
    }
}

impl Deref for ParamsGuard<'_> {
    type Target = RequestContext;

    fn deref(&self) -> &RequestContext {
        self.ctx
    }
}

impl DerefMut for ParamsGuard<'_> {
    fn deref_mut(&mut self) -> &mut RequestContext {
        self.ctx
    }
}

impl Drop for ParamsGuard<'_> {
    fn drop(&mut self) {
        if let Some(original) = self.original.take() {
            self.ctx.replace_params(original);
        }
    }
}

/// Commands grouped by method, then endpoint, in declaration order.
pub struct CommandDispatcher {
    endpoints: Vec<String>,
    mapping: HashMap<HttpMethod, HashMap<String, Vec<Arc<dyn Command>>>>,
    url_handler: Option<Arc<dyn UrlHandler>>,
}

impl CommandDispatcher {
    pub fn new<I, S>(endpoints: I, commands: Vec<Arc<dyn Command>>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut mapping: HashMap<HttpMethod, HashMap<String, Vec<Arc<dyn Command>>>> = HashMap::new();
        for command in commands {
            mapping
                .entry(command.http_method())
                .or_default()
                .entry(command.endpoint().to_string())
                .or_default()
                .push(command);
        }
        Self {
            endpoints: endpoints.into_iter().map(Into::into).collect(),
            mapping,
            url_handler: None,
        }
    }

    pub fn with_url_handler(mut self, handler: Arc<dyn UrlHandler>) -> Self {
        self.url_handler = Some(handler);
        self
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Candidate commands for `method` on `endpoint`, highest priority first.
    pub fn commands_for(&self, method: HttpMethod, endpoint: &str) -> &[Arc<dyn Command>] {
        self.mapping
            .get(&method)
            .and_then(|m| m.get(endpoint))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// One registrable endpoint per declared endpoint name. Specs are loaded
    /// eagerly so a missing or malformed spec fails here.
    pub fn apis(self: &Arc<Self>, specs: &SpecStore) -> Result<Vec<Arc<dyn Endpoint>>, SpecError> {
        self.endpoints
            .iter()
            .map(|name| -> Result<Arc<dyn Endpoint>, SpecError> {
                specs.get(name)?;
                Ok(Arc::new(DispatchEndpoint {
                    dispatcher: Arc::clone(self),
                    endpoint: name.clone(),
                }) as Arc<dyn Endpoint>)
            })
            .collect()
    }

    pub fn dispatch(&self, ctx: &mut RequestContext, endpoint: &str) -> Result<(), ApiError> {
        let method = ctx.method();
        let commands = self.commands_for(method, endpoint);

        if method.is_body_bearing() {
            let ops = ctx.commands();
            if ops.len() > 1 {
                return Err(ApiError::TooManyCommands);
            }
            let op = ops.first().cloned();
            let name = op.as_ref().map(|o| o.name.as_str());
            let command = commands.iter().find(|c| c.name() == name).ok_or_else(|| {
                ApiError::UnknownCommand(op.as_ref().map_or_else(|| "(unnamed)".to_string(), ToString::to_string))
            })?;
            tracing::debug!(%method, endpoint = %endpoint, command = ?command.name(), "dispatching command");

            let view = ParamView::new(Arc::clone(command), op.as_ref(), ctx.path_values().clone(), None);
            let mut guard = ParamsGuard::install(ctx, view);
            let result = command.invoke(&mut guard, op.as_ref());
            result.map_err(ApiError::from_command)
        } else {
            let Some(command) = commands.first() else {
                tracing::debug!(%method, endpoint = %endpoint, "no command for method");
                let message = format!("No support for : {} at :{}", method, ctx.path());
                ctx.response.add("error", message);
                return Ok(());
            };
            tracing::debug!(%method, endpoint = %endpoint, command = ?command.name(), "dispatching url request");

            let view = ParamView::new(
                Arc::clone(command),
                None,
                ctx.path_values().clone(),
                Some(ctx.params_handle()),
            );
            let mut guard = ParamsGuard::install(ctx, view);
            let result = match &self.url_handler {
                Some(handler) => handler.invoke_url(command.as_ref(), &mut guard),
                None => command.invoke(&mut guard, None),
            };
            result.map_err(ApiError::from_command)
        }
    }
}

/// Registry-facing endpoint backed by a dispatcher.
pub struct DispatchEndpoint {
    dispatcher: Arc<CommandDispatcher>,
    endpoint: String,
}

impl Endpoint for DispatchEndpoint {
    fn name(&self) -> &str {
        &self.endpoint
    }

    fn spec(&self, specs: &SpecStore) -> Result<SpecDoc, SpecError> {
        specs.get(&self.endpoint)
    }

    fn call(&self, ctx: &mut RequestContext) -> Result<(), ApiError> {
        self.dispatcher.dispatch(ctx, &self.endpoint)
    }
}
