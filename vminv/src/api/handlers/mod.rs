//! HTTP request handlers.
//!
//! Handlers are thin: they validate form input, call into the repository
//! layer, and translate the outcome into a JSON body or a 303 redirect.

pub mod auth;
pub mod system;
pub mod users;
pub mod vms;
