//! VM inventory service.
//!
//! A small account and VM record inventory with a form-driven write surface
//! and an unauthenticated JSON read API, backed by SQLite.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod email;
pub mod errors;
pub mod openapi;
pub mod telemetry;
pub mod validation;

#[cfg(test)]
pub mod test_utils;

use axum::{
    Json, Router,
    http::{self, HeaderValue},
    routing::{get, post},
};
use bon::Builder;
pub use config::Config;
use config::CorsOrigin;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info, instrument};
use utoipa::OpenApi;

use crate::openapi::ApiDoc;

/// Application state shared across all request handlers.
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
}

/// Get the database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.auth.security.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.as_str().parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut exposed = vec![http::header::LOCATION];
    for header in &config.auth.security.cors.exposed_headers {
        exposed.push(header.parse::<http::HeaderName>()?);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.auth.security.cors.allow_credentials)
        .expose_headers(exposed);

    if let Some(max_age) = config.auth.security.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
///
/// The write surface (`/register`, `/login`, the form POSTs) mirrors what a
/// browser submits; the `/api/*` routes serve JSON to scripts without
/// authentication.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let cors_layer = create_cors_layer(&state.config)?;

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/", get(api::handlers::system::index))
        .route("/register", get(api::handlers::auth::get_registration_info).post(api::handlers::auth::register))
        .route("/login", get(api::handlers::auth::get_login_info).post(api::handlers::auth::login))
        .route("/logout", get(api::handlers::auth::logout))
        .route("/user", get(api::handlers::users::list_users))
        .route("/showUser/{id}", get(api::handlers::users::show_user))
        .route(
            "/edit_user/{id}",
            get(api::handlers::users::get_edit_user).post(api::handlers::users::edit_user),
        )
        .route("/delete_user/{id}", post(api::handlers::users::delete_user))
        .route("/vm/new", get(api::handlers::vms::get_new_vm).post(api::handlers::vms::create_vm))
        .route("/view_vms", get(api::handlers::vms::list_vms))
        .route("/showVM/{id}", get(api::handlers::vms::show_vm))
        .route("/edit_vm/{id}", get(api::handlers::vms::get_edit_vm).post(api::handlers::vms::edit_vm))
        .route("/delete_vm/{id}", post(api::handlers::vms::delete_vm))
        .route("/api/vms", get(api::handlers::system::api_vms))
        .route("/api/users", get(api::handlers::system::api_users))
        .route("/api/url_map", get(api::handlers::system::url_map))
        .route("/sendmail", get(api::handlers::system::sendmail))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .with_state(state)
        .layer(cors_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// Setup the connection pool and run migrations
async fn setup_database(config: &Config) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(&config.database.path)
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect_with(options)
        .await?;

    migrator().run(&pool).await?;
    Ok(pool)
}

/// The running application: router, state, and database pool.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] opens the database, runs migrations,
///    and builds the router
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and handles
///    requests until the shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
    pool: SqlitePool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let pool = setup_database(&config).await?;

        let state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(state)?;

        Ok(Self { router, config, pool })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("VM inventory listening on http://{bind_addr}");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}
