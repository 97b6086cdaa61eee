//! HTTP API surface: request handlers and their wire models.

pub mod handlers;
pub mod models;
