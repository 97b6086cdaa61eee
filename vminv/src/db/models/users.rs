//! Database models for users.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub firstname: String,
    pub lastname: String,
    pub birthday: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Database request for updating a user
///
/// The username is immutable after registration, so it is absent here. All
/// other profile fields are overwritten with the submitted values.
#[derive(Debug, Clone)]
pub struct UserUpdateDBRequest {
    pub firstname: String,
    pub lastname: String,
    pub birthday: String,
    pub email: String,
}

/// Database response for a user
#[derive(Debug, Clone, FromRow)]
pub struct UserDBResponse {
    pub id: i64,
    pub firstname: String,
    pub lastname: String,
    pub birthday: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
