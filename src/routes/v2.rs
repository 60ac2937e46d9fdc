//! v2 API routes: every path is resolved by the registry, so the router is a
//! single fallback behind a request body limit.

use crate::handlers::v2::dispatch;
use crate::state::AppState;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

pub fn v2_routes(state: AppState) -> Router {
    let limit = state.body_limit;
    Router::new()
        .fallback(dispatch)
        .layer(RequestBodyLimitLayer::new(limit))
        .with_state(state)
}
