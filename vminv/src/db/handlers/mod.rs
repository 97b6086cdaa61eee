//! Repository implementations for database access.
//!
//! Each repository wraps a SQLx connection, provides strongly-typed CRUD
//! operations, and returns domain models from [`crate::db::models`].
//!
//! # Available Repositories
//!
//! - [`Users`]: User account management and authentication
//! - [`Vms`]: Virtual machine inventory records

pub mod repository;
pub mod users;
pub mod vms;

pub use repository::Repository;
pub use users::Users;
pub use vms::Vms;
