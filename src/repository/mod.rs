//! Database repository layer

pub mod identity_repo;
pub mod resource_repo;

pub use identity_repo::*;
pub use resource_repo::*;
