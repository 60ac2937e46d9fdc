//! Example consumer: serves a small in-memory collections admin API through v2api.
//!
//! Run from repo root: `V2API_SPEC_DIR=example_consumer/specs cargo run -p example-consumer`
//!
//! ```text
//! curl -XPOST localhost:8983/c -d '{"create": {"name": "films", "router": {"name": "compositeId"}}}'
//! curl localhost:8983/c/films
//! curl 'localhost:8983/c/films/_introspect?command=modify'
//! ```

use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::TcpListener;
use v2api::{
    common_routes, v2_routes, wrap_handler, ApiError, ApiRegistry, AppState, Command, CommandDispatcher, DirLoader,
    FnCommand, HttpMethod, RequestContext, RequestHandler, Settings, SpecStore, HANDLER_NAME,
};

#[derive(Default)]
struct Cluster {
    collections: Mutex<BTreeMap<String, Value>>,
}

impl Cluster {
    fn collections(&self) -> Result<MutexGuard<'_, BTreeMap<String, Value>>, ApiError> {
        self.collections
            .lock()
            .map_err(|_| ApiError::Server("cluster state lock".into()))
    }
}

fn required(ctx: &RequestContext, name: &str) -> Result<String, ApiError> {
    ctx.params()
        .get(name)
        .ok_or_else(|| ApiError::BadRequest(format!("missing required parameter: {}", name)))
}

fn collection_commands(cluster: &Arc<Cluster>) -> Vec<Arc<dyn Command>> {
    let list = Arc::clone(cluster);
    let create = Arc::clone(cluster);
    let read = Arc::clone(cluster);
    let modify = Arc::clone(cluster);
    let delete = Arc::clone(cluster);

    vec![
        Arc::new(FnCommand::new(HttpMethod::Get, "collections", move |ctx, _| {
            let names: Vec<String> = list.collections()?.keys().cloned().collect();
            ctx.response.add("collections", names);
            Ok(())
        })),
        Arc::new(
            FnCommand::new(HttpMethod::Post, "collections", move |ctx, _| {
                let name = required(ctx, "name")?;
                let shards: u32 = match ctx.params().get("numShards") {
                    Some(raw) => raw
                        .parse()
                        .map_err(|_| ApiError::BadRequest(format!("numShards is not a number: {}", raw)))?,
                    None => 1,
                };
                let router = ctx.params().get("router.name").unwrap_or_else(|| "compositeId".into());
                let mut collections = create.collections()?;
                if collections.contains_key(&name) {
                    return Err(ApiError::BadRequest(format!("collection already exists: {}", name)).into());
                }
                let props = json!({"numShards": shards, "router": router, "replicationFactor": 1});
                collections.insert(name.clone(), props.clone());
                tracing::info!(collection = %name, "created collection");
                ctx.response.add("created", name);
                ctx.response.add("properties", props);
                Ok(())
            })
            .named("create"),
        ),
        Arc::new(FnCommand::new(HttpMethod::Get, "collection", move |ctx, _| {
            let name = required(ctx, "collection")?;
            let props = read
                .collections()?
                .get(&name)
                .cloned()
                .ok_or_else(|| ApiError::NotFound(format!("collection {}", name)))?;
            ctx.response.add("name", name);
            ctx.response.add("properties", props);
            Ok(())
        })),
        Arc::new(
            FnCommand::new(HttpMethod::Post, "collection", move |ctx, _| {
                let name = required(ctx, "collection")?;
                let factor: u32 = required(ctx, "replicationFactor")?
                    .parse()
                    .map_err(|_| ApiError::BadRequest("replicationFactor must be a number".into()))?;
                let mut collections = modify.collections()?;
                let props = collections
                    .get_mut(&name)
                    .ok_or_else(|| ApiError::NotFound(format!("collection {}", name)))?;
                props["replicationFactor"] = json!(factor);
                ctx.response.add("modified", name);
                Ok(())
            })
            .named("modify"),
        ),
        Arc::new(
            FnCommand::new(HttpMethod::Post, "collection", |ctx, _| {
                let name = required(ctx, "collection")?;
                ctx.response.add("reloaded", name);
                Ok(())
            })
            .named("reload"),
        ),
        Arc::new(FnCommand::new(HttpMethod::Delete, "collection", move |ctx, _| {
            let name = required(ctx, "collection")?;
            if delete.collections()?.remove(&name).is_none() {
                return Err(ApiError::NotFound(format!("collection {}", name)).into());
            }
            tracing::info!(collection = %name, "deleted collection");
            ctx.response.add("deleted", name);
            Ok(())
        })),
    ]
}

struct SystemInfo;

impl RequestHandler for SystemInfo {
    fn handle_request(&self, ctx: &mut RequestContext) -> Result<(), ApiError> {
        ctx.response.add("name", env!("CARGO_PKG_NAME"));
        ctx.response.add("version", env!("CARGO_PKG_VERSION"));
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    v2api::settings::init_tracing("v2api=info,example_consumer=info");
    let settings = Settings::from_env();

    let specs = Arc::new(SpecStore::new(DirLoader::new(&settings.spec_dir)));
    let registry = ApiRegistry::new(Arc::clone(&specs));

    let cluster = Arc::new(Cluster::default());
    let dispatcher = Arc::new(CommandDispatcher::new(
        ["collections", "collection"],
        collection_commands(&cluster),
    ));
    registry.register_all(dispatcher.apis(&specs)?, &HashMap::new())?;

    let substitutes = HashMap::from([(HANDLER_NAME.to_string(), "system".to_string())]);
    registry.register(wrap_handler(Arc::new(SystemInfo), "node.handler"), &substitutes)?;

    let state = AppState {
        registry: Arc::new(registry),
        body_limit: settings.body_limit,
    };
    let app = v2_routes(state.clone()).merge(common_routes(state));

    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
