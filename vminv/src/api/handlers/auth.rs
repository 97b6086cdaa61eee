use axum::{
    Form, Json,
    extract::State,
    response::Redirect,
};
use std::collections::BTreeMap;
use tracing::warn;

use crate::{
    AppState,
    api::models::{
        auth::{LoginForm, LoginInfo, LoginResponse, LogoutResponse, RegisterForm, RegistrationInfo},
        users::CurrentUser,
    },
    auth::{
        password::{self, Argon2Params},
        session,
    },
    db::{
        handlers::{Repository, Users},
        models::users::UserCreateDBRequest,
    },
    email::EmailService,
    errors::Error,
    validation::{FormSchema, Rule},
};

/// Get registration information
#[utoipa::path(
    get,
    path = "/register",
    tag = "authentication",
    responses(
        (status = 200, description = "Registration info", body = RegistrationInfo),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_registration_info(State(state): State<AppState>) -> Result<Json<RegistrationInfo>, Error> {
    Ok(Json(RegistrationInfo {
        enabled: state.config.auth.native.enabled && state.config.auth.native.allow_registration,
        message: if state.config.auth.native.enabled && state.config.auth.native.allow_registration {
            "Registration is enabled".to_string()
        } else {
            "Registration is disabled".to_string()
        },
    }))
}

/// Validation schema for the registration form.
fn registration_schema(config: &crate::config::Config) -> FormSchema {
    let password = &config.auth.native.password;
    FormSchema::new()
        .field("firstname", vec![Rule::Required])
        .field("lastname", vec![Rule::Required])
        .field("birthday", vec![Rule::Required])
        .field("username", vec![Rule::Required, Rule::Length { min: 2, max: 30 }])
        .field("email", vec![Rule::Required, Rule::Email])
        .field(
            "password",
            vec![
                Rule::Required,
                Rule::Length {
                    min: password.min_length,
                    max: password.max_length,
                },
            ],
        )
        .field(
            "confirm_password",
            vec![Rule::Matches {
                other: "password",
                message: "Field must be equal to password.",
            }],
        )
}

/// Register a new user account
///
/// On success the browser is redirected to the login page. Validation
/// failures, including a taken username or email, return a 400 with the full
/// per-field error map.
#[utoipa::path(
    post,
    path = "/register",
    request_body(content = RegisterForm, content_type = "application/x-www-form-urlencoded"),
    tag = "authentication",
    responses(
        (status = 303, description = "User registered, redirect to login"),
        (status = 400, description = "Validation failed"),
    )
)]
#[tracing::instrument(skip_all, fields(username = %form.username))]
pub async fn register(State(state): State<AppState>, Form(form): Form<RegisterForm>) -> Result<Redirect, Error> {
    // Check if native auth is enabled
    if !state.config.auth.native.enabled {
        return Err(Error::BadRequest {
            message: "Native authentication is disabled".to_string(),
        });
    }

    // Check if registration is allowed
    if !state.config.auth.native.allow_registration {
        return Err(Error::BadRequest {
            message: "User registration is disabled".to_string(),
        });
    }

    let values = BTreeMap::from([
        ("firstname", form.firstname.as_str()),
        ("lastname", form.lastname.as_str()),
        ("birthday", form.birthday.as_str()),
        ("username", form.username.as_str()),
        ("email", form.email.as_str()),
        ("password", form.password.as_str()),
        ("confirm_password", form.confirm_password.as_str()),
    ]);
    let mut errors = registration_schema(&state.config).validate(&values);

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    // Uniqueness pre-checks report through the same error map as the schema
    // rules. The database constraints remain the source of truth; a racing
    // insert still surfaces as a conflict.
    if user_repo.get_user_by_username(&form.username).await?.is_some() {
        errors.add("username", "That username is taken. Please choose a different one.");
    }
    if user_repo.get_user_by_email(&form.email).await?.is_some() {
        errors.add("email", "That email is taken. Please choose a different one.");
    }

    errors.into_result()?;

    // Hash the password on a blocking thread to avoid blocking async runtime
    let password = form.password.clone();
    let params = Argon2Params {
        memory_kib: state.config.auth.native.password.argon2_memory_kib,
        iterations: state.config.auth.native.password.argon2_iterations,
        parallelism: state.config.auth.native.password.argon2_parallelism,
    };
    let password_hash = tokio::task::spawn_blocking(move || password::hash_string_with_params(&password, Some(params)))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    let create_request = UserCreateDBRequest {
        firstname: form.firstname,
        lastname: form.lastname,
        birthday: form.birthday,
        username: form.username,
        email: form.email,
        password_hash,
    };

    let created_user = user_repo.create(&create_request).await?;

    // Welcome email is best-effort: a broken mail transport must not fail
    // registration.
    match EmailService::new(&state.config) {
        Ok(email_service) => {
            if let Err(e) = email_service.send_welcome_email(&created_user.email, &created_user.username).await {
                warn!("Failed to send welcome email to {}: {e}", created_user.email);
            }
        }
        Err(e) => warn!("Email service unavailable, skipping welcome email: {e}"),
    }

    Ok(Redirect::to("/login"))
}

/// Get login information
#[utoipa::path(
    get,
    path = "/login",
    tag = "authentication",
    responses(
        (status = 200, description = "Login info", body = LoginInfo),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_login_info(State(state): State<AppState>) -> Result<Json<LoginInfo>, Error> {
    Ok(Json(LoginInfo {
        enabled: state.config.auth.native.enabled,
        message: if state.config.auth.native.enabled {
            "Native login is enabled".to_string()
        } else {
            "Native login is disabled".to_string()
        },
    }))
}

/// Login with email and password
///
/// Success sets two cookies: the HttpOnly JWT session cookie, and a plain
/// `username` cookie the frontend can read for display. An already
/// authenticated browser is redirected home without touching its session.
#[utoipa::path(
    post,
    path = "/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    tag = "authentication",
    responses(
        (status = 303, description = "Login successful, redirect home"),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    current_user: Option<CurrentUser>,
    Form(form): Form<LoginForm>,
) -> Result<LoginResponse, Error> {
    // Check if native auth is enabled
    if !state.config.auth.native.enabled {
        return Err(Error::BadRequest {
            message: "Native authentication is disabled".to_string(),
        });
    }

    // Already logged in: go home without reissuing the session
    if current_user.is_some() {
        return Ok(LoginResponse {
            cookies: vec![],
            location: "/",
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    // Find user by email. The failure message never reveals which half of the
    // credentials was wrong.
    let user = user_repo
        .get_user_by_email(&form.email)
        .await?
        .ok_or_else(|| Error::Unauthenticated {
            message: Some("Login Unsuccessful. Please check email and password".to_string()),
        })?;

    // Verify password on a blocking thread to avoid blocking async runtime
    let password = form.password.clone();
    let hash = user.password_hash.clone();
    let is_valid = tokio::task::spawn_blocking(move || password::verify_string(&password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    if !is_valid {
        return Err(Error::Unauthenticated {
            message: Some("Login Unsuccessful. Please check email and password".to_string()),
        });
    }

    let current_user = CurrentUser::from(user);
    let token = session::create_session_token(&current_user, &state.config)?;

    Ok(LoginResponse {
        cookies: vec![
            create_session_cookie(&token, &state.config),
            create_username_cookie(&current_user.username, &state.config),
        ],
        location: "/",
    })
}

/// Logout (clear session)
#[utoipa::path(
    get,
    path = "/logout",
    tag = "authentication",
    responses(
        (status = 303, description = "Logout successful, redirect home"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> Result<LogoutResponse, Error> {
    let session_config = &state.config.auth.native.session;

    // Expired cookies clear both the session and the display username
    Ok(LogoutResponse {
        cookies: vec![
            format!(
                "{}=; Path=/; HttpOnly; Secure={}; SameSite={}; Max-Age=0",
                session_config.cookie_name, session_config.cookie_secure, session_config.cookie_same_site
            ),
            format!(
                "username=; Path=/; Secure={}; SameSite={}; Max-Age=0",
                session_config.cookie_secure, session_config.cookie_same_site
            ),
        ],
    })
}

/// Helper function to create a session cookie
fn create_session_cookie(token: &str, config: &crate::config::Config) -> String {
    let session_config = &config.auth.native.session;
    let max_age = session_config.timeout.as_secs();

    format!(
        "{}={}; Path=/; HttpOnly; Secure={}; SameSite={}; Max-Age={}",
        session_config.cookie_name, token, session_config.cookie_secure, session_config.cookie_same_site, max_age
    )
}

/// The username cookie is readable by frontend scripts, so no HttpOnly.
fn create_username_cookie(username: &str, config: &crate::config::Config) -> String {
    let session_config = &config.auth.native.session;
    let max_age = session_config.timeout.as_secs();

    format!(
        "username={}; Path=/; Secure={}; SameSite={}; Max-Age={}",
        username, session_config.cookie_secure, session_config.cookie_same_site, max_age
    )
}
