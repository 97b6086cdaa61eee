//! Database repository for virtual machine records.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::vms::{VmCreateDBRequest, VmDBResponse, VmUpdateDBRequest, VmWithOwnerDBResponse},
};
use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::instrument;

pub struct Vms<'c> {
    db: &'c mut SqliteConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Vms<'c> {
    type CreateRequest = VmCreateDBRequest;
    type UpdateRequest = VmUpdateDBRequest;
    type Response = VmDBResponse;
    type Id = i64;

    #[instrument(skip(self, request), fields(name = %request.name, user_id = request.user_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let now = Utc::now();
        let vm = sqlx::query_as::<_, VmDBResponse>(
            r#"
            INSERT INTO vms (name, description, cpu, ram, hdd, ipv4, mac, user_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.cpu)
        .bind(request.ram)
        .bind(request.hdd)
        .bind(&request.ipv4)
        .bind(&request.mac)
        .bind(request.user_id)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(vm)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let vm = sqlx::query_as::<_, VmDBResponse>("SELECT * FROM vms WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(vm)
    }

    #[instrument(skip(self), err)]
    async fn list(&mut self) -> Result<Vec<Self::Response>> {
        let vms = sqlx::query_as::<_, VmDBResponse>("SELECT * FROM vms ORDER BY id")
            .fetch_all(&mut *self.db)
            .await?;

        Ok(vms)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM vms WHERE id = ?").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let vm = sqlx::query_as::<_, VmDBResponse>(
            r#"
            UPDATE vms SET
                name = ?,
                description = ?,
                cpu = ?,
                ram = ?,
                hdd = ?,
                ipv4 = ?,
                mac = ?,
                updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.cpu)
        .bind(request.ram)
        .bind(request.hdd)
        .bind(&request.ipv4)
        .bind(&request.mac)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(vm)
    }
}

impl<'c> Vms<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// List all VM records joined with their owner's username.
    #[instrument(skip(self), err)]
    pub async fn list_with_owner(&mut self) -> Result<Vec<VmWithOwnerDBResponse>> {
        let vms = sqlx::query_as::<_, VmWithOwnerDBResponse>(
            r#"
            SELECT vms.*, users.username
            FROM vms
            JOIN users ON users.id = vms.user_id
            ORDER BY vms.id
            "#,
        )
        .fetch_all(&mut *self.db)
        .await?;

        Ok(vms)
    }
}
