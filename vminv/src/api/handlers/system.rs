use axum::{Json, extract::State};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use utoipa::OpenApi;

use crate::{
    AppState,
    api::models::{users::UserResponse, vms::VmWithOwnerResponse},
    db::handlers::{Repository, Users, Vms},
    email::EmailService,
    errors::Error,
    openapi::ApiDoc,
};

/// Service info
#[utoipa::path(
    get,
    path = "/",
    tag = "system",
    responses(
        (status = 200, description = "Service name and version"),
    )
)]
pub async fn index() -> Json<Value> {
    Json(json!({
        "service": "vminv",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// List VM records joined with their owner's username
#[utoipa::path(
    get,
    path = "/api/vms",
    tag = "system",
    responses(
        (status = 200, description = "All VM records with owner usernames", body = Vec<VmWithOwnerResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn api_vms(State(state): State<AppState>) -> Result<Json<Vec<VmWithOwnerResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut vm_repo = Vms::new(&mut conn);

    let vms = vm_repo.list_with_owner().await?;
    Ok(Json(vms.into_iter().map(VmWithOwnerResponse::from).collect()))
}

/// List user accounts without credential material
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "system",
    responses(
        (status = 200, description = "All user accounts", body = Vec<UserResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn api_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    let users = user_repo.list().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Published route table
///
/// Generated from the OpenAPI document, keyed by path with the HTTP methods
/// served at each one.
#[utoipa::path(
    get,
    path = "/api/url_map",
    tag = "system",
    responses(
        (status = 200, description = "Route table keyed by path"),
    )
)]
pub async fn url_map() -> Result<Json<Value>, Error> {
    // Paths serializes as the path map itself, keyed by route
    let paths = serde_json::to_value(ApiDoc::openapi().paths)
        .map_err(|e| anyhow::anyhow!("failed to serialize route table: {e}"))?;

    let mut map = BTreeMap::new();
    if let Some(paths) = paths.as_object() {
        for (path, item) in paths {
            let methods: Vec<String> = item
                .as_object()
                .map(|ops| ops.keys().map(|m| m.to_uppercase()).collect())
                .unwrap_or_default();
            map.insert(path.clone(), methods);
        }
    }

    Ok(Json(json!({ "url_map": map })))
}

/// Send a test email
///
/// Delivers a fixed message through the configured transport so operators
/// can verify mail settings without registering an account.
#[utoipa::path(
    get,
    path = "/sendmail",
    tag = "system",
    responses(
        (status = 200, description = "Test email sent"),
        (status = 500, description = "Mail delivery failed"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn sendmail(State(state): State<AppState>) -> Result<Json<Value>, Error> {
    let email_service = EmailService::new(&state.config)?;

    let recipient = state.config.email.from_email.clone();
    email_service.send_test_email(&recipient).await?;

    Ok(Json(json!({ "message": format!("Test email sent to {recipient}") })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_app, create_test_app_with_config, create_test_config, create_test_user, create_test_vm};
    use sqlx::SqlitePool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_index_reports_service_name(pool: SqlitePool) {
        let server = create_test_app(pool).await;

        let response = server.get("/").await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["service"], "vminv");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_api_vms_includes_owner_username(pool: SqlitePool) {
        let server = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, "alice", "alice@example.com", "password123").await;
        create_test_vm(&pool, user.id, "10.0.0.1", "aa:bb:cc:dd:ee:01").await;

        let response = server.get("/api/vms").await;
        response.assert_status_ok();

        let vms: Vec<VmWithOwnerResponse> = response.json();
        assert_eq!(vms.len(), 1);
        assert_eq!(vms[0].owner, "alice");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_api_users_hides_password_hash(pool: SqlitePool) {
        let server = create_test_app(pool.clone()).await;
        create_test_user(&pool, "bob", "bob@example.com", "password123").await;

        let response = server.get("/api/users").await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body[0]["username"], "bob");
        assert!(body[0].get("password_hash").is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_url_map_lists_routes(pool: SqlitePool) {
        let server = create_test_app(pool).await;

        let response = server.get("/api/url_map").await;
        response.assert_status_ok();

        let body: Value = response.json();
        let map = body["url_map"].as_object().unwrap();
        assert!(map.contains_key("/view_vms"));
        assert!(map.contains_key("/register"));
        assert!(map["/register"].as_array().unwrap().contains(&json!("POST")));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_sendmail_writes_file(pool: SqlitePool) {
        let config = create_test_config();
        let server = create_test_app_with_config(pool, config.clone()).await;

        let response = server.get("/sendmail").await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert!(body["message"].as_str().unwrap().starts_with("Test email sent to"));

        let crate::config::EmailTransportConfig::File { path } = &config.email.transport else {
            panic!("test config should use the file transport");
        };
        let sent = std::fs::read_dir(path).unwrap().count();
        assert_eq!(sent, 1);
    }
}
