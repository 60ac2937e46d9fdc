//! Liveness route reporting which methods have registered endpoints.

use crate::state::AppState;
use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    methods: Vec<&'static str>,
}

async fn health(State(state): State<AppState>) -> Json<HealthBody> {
    let methods: Vec<&'static str> = state.registry.methods().into_iter().map(|m| m.as_str()).collect();
    let status = if methods.is_empty() { "empty" } else { "ok" };
    Json(HealthBody { status, methods })
}

/// GET /health.
pub fn common_routes(state: AppState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}
