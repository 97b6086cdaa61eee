//! Database models for virtual machine records.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for creating a new VM record
#[derive(Debug, Clone)]
pub struct VmCreateDBRequest {
    pub name: String,
    pub description: String,
    pub cpu: i64,
    pub ram: i64,
    pub hdd: i64,
    pub ipv4: String,
    pub mac: String,
    pub user_id: i64,
}

/// Database request for updating a VM record
///
/// Ownership is fixed at creation time, so `user_id` is absent here.
#[derive(Debug, Clone)]
pub struct VmUpdateDBRequest {
    pub name: String,
    pub description: String,
    pub cpu: i64,
    pub ram: i64,
    pub hdd: i64,
    pub ipv4: String,
    pub mac: String,
}

/// Database response for a VM record
#[derive(Debug, Clone, FromRow)]
pub struct VmDBResponse {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub cpu: i64,
    pub ram: i64,
    pub hdd: i64,
    pub ipv4: String,
    pub mac: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// VM record joined with its owner's username, for the read API
#[derive(Debug, Clone, FromRow)]
pub struct VmWithOwnerDBResponse {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub cpu: i64,
    pub ram: i64,
    pub hdd: i64,
    pub ipv4: String,
    pub mac: String,
    pub user_id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
