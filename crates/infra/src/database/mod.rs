//! Database implementations

pub mod credential_repository;
pub mod manager;

pub use credential_repository::*;
pub use manager::*;
