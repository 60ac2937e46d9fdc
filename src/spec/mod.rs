pub mod snapshot;
pub mod loader;
pub mod store;
pub mod validator;

pub use snapshot::*;
pub use loader::*;
pub use store::*;
pub use validator::*;
