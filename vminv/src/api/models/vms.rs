//! API request/response models for virtual machine records.

use crate::db::models::vms::{VmCreateDBRequest, VmDBResponse, VmUpdateDBRequest, VmWithOwnerDBResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Form payload for creating or editing a VM record.
///
/// Resource figures are free-form integers: the inventory records what an
/// operator typed, it does not police capacity.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VmForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub cpu: i64,
    pub ram: i64,
    pub hdd: i64,
    pub ipv4: String,
    pub mac: String,
}

impl VmForm {
    pub fn into_create_request(self, user_id: i64) -> VmCreateDBRequest {
        VmCreateDBRequest {
            name: self.name,
            description: self.description,
            cpu: self.cpu,
            ram: self.ram,
            hdd: self.hdd,
            ipv4: self.ipv4,
            mac: self.mac,
            user_id,
        }
    }
}

impl From<VmForm> for VmUpdateDBRequest {
    fn from(form: VmForm) -> Self {
        Self {
            name: form.name,
            description: form.description,
            cpu: form.cpu,
            ram: form.ram,
            hdd: form.hdd,
            ipv4: form.ipv4,
            mac: form.mac,
        }
    }
}

/// VM record returned by detail endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VmResponse {
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

impl From<VmDBResponse> for VmResponse {
    fn from(db: VmDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            description: db.description,
            cpu: db.cpu,
            ram: db.ram,
            hdd: db.hdd,
            ipv4: db.ipv4,
            mac: db.mac,
            user_id: db.user_id,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// VM record with its owner's username, returned by the read API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VmWithOwnerResponse {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub cpu: i64,
    pub ram: i64,
    pub hdd: i64,
    pub ipv4: String,
    pub mac: String,
    pub user_id: i64,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<VmWithOwnerDBResponse> for VmWithOwnerResponse {
    fn from(db: VmWithOwnerDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            description: db.description,
            cpu: db.cpu,
            ram: db.ram,
            hdd: db.hdd,
            ipv4: db.ipv4,
            mac: db.mac,
            user_id: db.user_id,
            owner: db.username,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
