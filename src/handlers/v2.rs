//! Fallback handler that routes any method and path through the registry.

use crate::error::ApiError;
use crate::request::{CommandOperation, HttpMethod, QueryParams, RequestContext};
use crate::response::Response;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::{Method, Uri};
use axum::Json;

pub async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    Query(query): Query<Vec<(String, String)>>,
    body: String,
) -> Result<Json<Response>, ApiError> {
    let method: HttpMethod = method.as_str().parse().map_err(|e: String| {
        tracing::warn!(method = %method, path = %uri.path(), "unsupported method");
        ApiError::BadRequest(e)
    })?;
    let commands = if method.is_body_bearing() {
        CommandOperation::parse_body(&body)?
    } else {
        Vec::new()
    };
    let mut ctx = RequestContext::new(method, uri.path())
        .with_params(QueryParams::new(query))
        .with_commands(commands);
    state.registry.handle(&mut ctx)?;
    Ok(Json(ctx.response))
}
