pub mod common;
pub mod v2;

pub use common::common_routes;
pub use v2::v2_routes;
