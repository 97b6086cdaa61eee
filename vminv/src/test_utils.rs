//! Shared helpers for handler tests.

use axum_test::TestServer;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{
    AppState,
    api::models::{auth::RegisterForm, vms::VmForm},
    auth::password,
    config::{Config, EmailTransportConfig},
    db::{
        handlers::{Repository, Users, Vms},
        models::{
            users::{UserCreateDBRequest, UserDBResponse},
            vms::{VmCreateDBRequest, VmDBResponse},
        },
    },
};

static EMAIL_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

pub fn create_test_config() -> Config {
    // Each config gets its own email directory so tests can count deliveries
    let seq = EMAIL_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
    let email_dir = std::env::temp_dir().join(format!("vminv-test-emails-{}-{}", std::process::id(), seq));

    let mut config = Config::default();
    config.secret_key = Some("test-secret-key-for-sessions".to_string());
    config.auth.native.session.cookie_secure = false;
    config.email.transport = EmailTransportConfig::File {
        path: email_dir.to_string_lossy().into_owned(),
    };
    config.email.from_email = "noreply@vminv.test".to_string();
    config
}

pub async fn create_test_app(pool: SqlitePool) -> TestServer {
    create_test_app_with_config(pool, create_test_config()).await
}

pub async fn create_test_app_with_config(pool: SqlitePool, config: Config) -> TestServer {
    let state = AppState::builder().db(pool).config(config).build();
    let router = crate::build_router(state).expect("Failed to build router");

    TestServer::builder()
        .save_cookies()
        .build(router)
        .expect("Failed to create test server")
}

pub async fn create_test_user(pool: &SqlitePool, username: &str, email: &str, password: &str) -> UserDBResponse {
    let password_hash = password::hash_string(password).expect("Failed to hash password");

    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut repo = Users::new(&mut conn);
    // Every profile column is unique in the schema, so derive them from the
    // username rather than sharing constants between users
    repo.create(&UserCreateDBRequest {
        firstname: format!("{username}-first"),
        lastname: format!("{username}-last"),
        birthday: format!("1990-01-01 ({username})"),
        username: username.to_string(),
        email: email.to_string(),
        password_hash,
    })
    .await
    .expect("Failed to create test user")
}

pub async fn create_test_vm(pool: &SqlitePool, user_id: i64, ipv4: &str, mac: &str) -> VmDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut repo = Vms::new(&mut conn);
    repo.create(&VmCreateDBRequest {
        name: format!("vm-{ipv4}"),
        description: "test vm".to_string(),
        cpu: 2,
        ram: 4096,
        hdd: 40,
        ipv4: ipv4.to_string(),
        mac: mac.to_string(),
        user_id,
    })
    .await
    .expect("Failed to create test VM")
}

/// Log in through the real endpoint so the server's cookie jar carries a
/// session for subsequent requests.
pub async fn login_as(server: &TestServer, email: &str, password: &str) {
    let response = server
        .post("/login")
        .form(&crate::api::models::auth::LoginForm {
            email: email.to_string(),
            password: password.to_string(),
        })
        .await;
    response.assert_status(axum::http::StatusCode::SEE_OTHER);
}

pub fn register_form(username: &str, email: &str) -> RegisterForm {
    RegisterForm {
        firstname: format!("{username}-first"),
        lastname: format!("{username}-last"),
        birthday: format!("1990-01-01 ({username})"),
        username: username.to_string(),
        email: email.to_string(),
        password: "password123".to_string(),
        confirm_password: "password123".to_string(),
    }
}

pub fn vm_form(name: &str, ipv4: &str, mac: &str) -> VmForm {
    VmForm {
        name: name.to_string(),
        description: String::new(),
        cpu: 2,
        ram: 4096,
        hdd: 40,
        ipv4: ipv4.to_string(),
        mac: mac.to_string(),
    }
}
