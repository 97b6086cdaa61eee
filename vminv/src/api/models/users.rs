//! API request/response models for users.

use crate::db::models::users::{UserDBResponse, UserUpdateDBRequest};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Form payload for editing a user's profile.
///
/// The username is shown in the edit form but never accepted back: it is
/// immutable after registration.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserUpdateForm {
    pub firstname: String,
    pub lastname: String,
    pub birthday: String,
    pub email: String,
}

impl From<UserUpdateForm> for UserUpdateDBRequest {
    fn from(form: UserUpdateForm) -> Self {
        Self {
            firstname: form.firstname,
            lastname: form.lastname,
            birthday: form.birthday,
            email: form.email,
        }
    }
}

/// User representation returned by the read API. The password hash never
/// leaves the database layer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub firstname: String,
    pub lastname: String,
    pub birthday: String,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            firstname: db.firstname,
            lastname: db.lastname,
            birthday: db.birthday,
            username: db.username,
            email: db.email,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// The authenticated user, extracted from the session cookie.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl From<UserDBResponse> for CurrentUser {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username,
            email: db.email,
        }
    }
}
