//! API request and response data models.
//!
//! These structures define the public API contract. They are distinct from the
//! database models in [`crate::db::models`], allowing the API and storage
//! representations to evolve independently. All models are annotated with
//! `utoipa` for automatic API docs.
//!
//! - [`auth`]: Login and registration payloads, cookie-setting responses
//! - [`users`]: User profiles and update requests
//! - [`vms`]: VM record forms and responses

pub mod auth;
pub mod users;
pub mod vms;
