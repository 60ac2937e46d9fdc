//! HTTP handlers bridging axum requests to the endpoint registry.

pub mod v2;
pub use v2::*;
