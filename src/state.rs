//! Shared application state for the v2 routes.

use crate::registry::ApiRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ApiRegistry>,
    /// Request body limit in bytes applied to the v2 routes.
    pub body_limit: usize,
}
