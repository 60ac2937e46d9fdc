//! v2 admin API plumbing: path-template routing, spec registry and command dispatch.

pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod request;
pub mod response;
pub mod routes;
pub mod settings;
pub mod spec;
pub mod state;
pub mod trie;

pub use dispatch::{Command, CommandDispatcher, FnCommand, ParamView, UrlHandler};
pub use error::{ApiError, BoxError, SpecError};
pub use registry::{wrap_handler, ApiRegistry, Endpoint, RequestHandler, HANDLER_NAME, INTROSPECT};
pub use request::{CommandOperation, HttpMethod, Params, QueryParams, RequestContext};
pub use response::Response;
pub use routes::{common_routes, v2_routes};
pub use settings::Settings;
pub use spec::{DirLoader, MemoryLoader, ResourceLoader, SpecDoc, SpecStore};
pub use state::AppState;
pub use trie::PathTrie;
