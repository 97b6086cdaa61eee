use axum::{
    Form, Json,
    extract::{Path, State},
    response::Redirect,
};
use std::collections::BTreeMap;

use crate::{
    AppState,
    api::models::users::{CurrentUser, UserResponse, UserUpdateForm},
    db::handlers::{Repository, Users},
    errors::Error,
    validation::{FormSchema, Rule},
};

/// List all users
#[utoipa::path(
    get,
    path = "/user",
    tag = "users",
    responses(
        (status = 200, description = "All users", body = Vec<UserResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    let users = user_repo.list().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Show a single user
#[utoipa::path(
    get,
    path = "/showUser/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = UserResponse),
        (status = 404, description = "User not found"),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = id))]
pub async fn show_user(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<UserResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    let user = user_repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(UserResponse::from(user)))
}

/// Current field values for the user edit form
#[utoipa::path(
    get,
    path = "/edit_user/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Current user fields", body = UserResponse),
        (status = 404, description = "User not found"),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = id))]
pub async fn get_edit_user(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<UserResponse>, Error> {
    show_user(State(state), Path(id)).await
}

fn edit_user_schema() -> FormSchema {
    FormSchema::new()
        .field("firstname", vec![Rule::Required])
        .field("lastname", vec![Rule::Required])
        .field("birthday", vec![Rule::Required])
        .field("email", vec![Rule::Required, Rule::Email])
}

/// Update a user's profile
///
/// The username is immutable; all other profile fields are overwritten from
/// the form. A conflicting email surfaces as a 409 with a safe message.
#[utoipa::path(
    post,
    path = "/edit_user/{id}",
    request_body(content = UserUpdateForm, content_type = "application/x-www-form-urlencoded"),
    tag = "users",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 303, description = "User updated, redirect to user list"),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already in use"),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = id))]
pub async fn edit_user(State(state): State<AppState>, Path(id): Path<i64>, Form(form): Form<UserUpdateForm>) -> Result<Redirect, Error> {
    let values = BTreeMap::from([
        ("firstname", form.firstname.as_str()),
        ("lastname", form.lastname.as_str()),
        ("birthday", form.birthday.as_str()),
        ("email", form.email.as_str()),
    ]);
    edit_user_schema().validate(&values).into_result()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    match user_repo.update(id, &form.into()).await {
        Ok(_) => Ok(Redirect::to("/user")),
        Err(crate::db::errors::DbError::NotFound) => Err(Error::NotFound {
            resource: "User".to_string(),
            id: id.to_string(),
        }),
        Err(e) => Err(Error::Database(e)),
    }
}

/// Delete a user
///
/// Any authenticated user may delete any account; this is an operator tool,
/// not a self-service portal. A user who still owns VM records cannot be
/// deleted.
#[utoipa::path(
    post,
    path = "/delete_user/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 303, description = "User deleted, redirect to user list"),
        (status = 400, description = "User still owns VM records"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "User not found"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = id, deleted_by = %current_user.username))]
pub async fn delete_user(State(state): State<AppState>, current_user: CurrentUser, Path(id): Path<i64>) -> Result<Redirect, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    let deleted = user_repo.delete(id).await?;
    if !deleted {
        return Err(Error::NotFound {
            resource: "User".to_string(),
            id: id.to_string(),
        });
    }

    Ok(Redirect::to("/user"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_app, create_test_user, create_test_vm, login_as};
    use serde_json::Value;
    use sqlx::SqlitePool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_users(pool: SqlitePool) {
        let server = create_test_app(pool.clone()).await;
        create_test_user(&pool, "alice", "alice@example.com", "password123").await;
        create_test_user(&pool, "bob", "bob@example.com", "password123").await;

        let response = server.get("/user").await;
        response.assert_status_ok();

        let users: Vec<UserResponse> = response.json();
        assert_eq!(users.len(), 2);

        // Password hashes never appear in the payload
        let raw: Value = response.json();
        assert!(raw[0].get("password_hash").is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_show_user_not_found(pool: SqlitePool) {
        let server = create_test_app(pool).await;

        let response = server.get("/showUser/9999").await;
        response.assert_status(axum::http::StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_edit_user_updates_profile(pool: SqlitePool) {
        let server = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, "carol", "carol@example.com", "password123").await;

        let response = server
            .post(&format!("/edit_user/{}", user.id))
            .form(&UserUpdateForm {
                firstname: "Caroline".to_string(),
                lastname: "Jones".to_string(),
                birthday: "1992-03-03".to_string(),
                email: "caroline@example.com".to_string(),
            })
            .await;

        response.assert_status(axum::http::StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get("location").unwrap(), "/user");

        let detail = server.get(&format!("/showUser/{}", user.id)).await;
        let updated: UserResponse = detail.json();
        assert_eq!(updated.firstname, "Caroline");
        assert_eq!(updated.email, "caroline@example.com");
        assert_eq!(updated.username, "carol");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_edit_user_email_conflict(pool: SqlitePool) {
        let server = create_test_app(pool.clone()).await;
        create_test_user(&pool, "dave", "dave@example.com", "password123").await;
        let other = create_test_user(&pool, "erin", "erin@example.com", "password123").await;

        let response = server
            .post(&format!("/edit_user/{}", other.id))
            .form(&UserUpdateForm {
                firstname: "Erin".to_string(),
                lastname: "Smith".to_string(),
                birthday: "1993-04-04".to_string(),
                email: "dave@example.com".to_string(),
            })
            .await;

        response.assert_status(axum::http::StatusCode::CONFLICT);
        let body: Value = response.json();
        assert_eq!(body["message"], "That email is taken. Please choose a different one.");
        assert_eq!(body["field"], "email");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_user_requires_auth(pool: SqlitePool) {
        let server = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, "frank", "frank@example.com", "password123").await;

        let response = server.post(&format!("/delete_user/{}", user.id)).await;
        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_user_with_vms_is_rejected(pool: SqlitePool) {
        let server = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, "grace", "grace@example.com", "password123").await;
        create_test_vm(&pool, user.id, "10.0.0.1", "aa:bb:cc:dd:ee:01").await;
        login_as(&server, "grace@example.com", "password123").await;

        let response = server.post(&format!("/delete_user/{}", user.id)).await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_unknown_user_is_not_found(pool: SqlitePool) {
        let server = create_test_app(pool.clone()).await;
        create_test_user(&pool, "ivy", "ivy@example.com", "password123").await;
        login_as(&server, "ivy@example.com", "password123").await;

        let response = server.post("/delete_user/424242").await;
        response.assert_status(axum::http::StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_user_success(pool: SqlitePool) {
        let server = create_test_app(pool.clone()).await;
        create_test_user(&pool, "admin", "admin@example.com", "password123").await;
        let victim = create_test_user(&pool, "henry", "henry@example.com", "password123").await;
        login_as(&server, "admin@example.com", "password123").await;

        let response = server.post(&format!("/delete_user/{}", victim.id)).await;
        response.assert_status(axum::http::StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get("location").unwrap(), "/user");

        let detail = server.get(&format!("/showUser/{}", victim.id)).await;
        detail.assert_status(axum::http::StatusCode::NOT_FOUND);
    }
}
