use axum::{
    Form, Json,
    extract::{Path, State},
    response::Redirect,
};
use std::collections::BTreeMap;

use crate::{
    AppState,
    api::models::{
        users::CurrentUser,
        vms::{VmForm, VmResponse},
    },
    db::handlers::{Repository, Vms},
    errors::Error,
    validation::{FormSchema, Rule},
};

fn vm_schema() -> FormSchema {
    FormSchema::new()
        .field("name", vec![Rule::Required, Rule::Length { min: 2, max: 64 }])
        .field("cpu", vec![Rule::Required])
        .field("ram", vec![Rule::Required])
        .field("hdd", vec![Rule::Required])
        .field("ipv4", vec![Rule::Required])
        .field("mac", vec![Rule::Required])
}

fn validate_vm_form(form: &VmForm) -> Result<(), Error> {
    let cpu = form.cpu.to_string();
    let ram = form.ram.to_string();
    let hdd = form.hdd.to_string();
    let values = BTreeMap::from([
        ("name", form.name.as_str()),
        ("cpu", cpu.as_str()),
        ("ram", ram.as_str()),
        ("hdd", hdd.as_str()),
        ("ipv4", form.ipv4.as_str()),
        ("mac", form.mac.as_str()),
    ]);
    vm_schema().validate(&values).into_result()
}

/// VM creation info
///
/// Returns the identity the new record will be owned by. Exists so clients
/// can probe whether the caller is allowed to create records before posting.
#[utoipa::path(
    get,
    path = "/vm/new",
    tag = "vms",
    responses(
        (status = 200, description = "Owner for a newly created VM", body = CurrentUser),
        (status = 401, description = "Not authenticated"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(username = %current_user.username))]
pub async fn get_new_vm(current_user: CurrentUser) -> Json<CurrentUser> {
    Json(current_user)
}

/// Create a VM record
///
/// The record is always owned by the authenticated caller.
#[utoipa::path(
    post,
    path = "/vm/new",
    request_body(content = VmForm, content_type = "application/x-www-form-urlencoded"),
    tag = "vms",
    responses(
        (status = 303, description = "VM created, redirect to VM list"),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Not authenticated"),
        (status = 409, description = "IPv4 or MAC address already in use"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(username = %current_user.username))]
pub async fn create_vm(State(state): State<AppState>, current_user: CurrentUser, Form(form): Form<VmForm>) -> Result<Redirect, Error> {
    validate_vm_form(&form)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut vm_repo = Vms::new(&mut conn);

    vm_repo.create(&form.into_create_request(current_user.id)).await?;
    Ok(Redirect::to("/view_vms"))
}

/// List all VM records
#[utoipa::path(
    get,
    path = "/view_vms",
    tag = "vms",
    responses(
        (status = 200, description = "All VM records", body = Vec<VmResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_vms(State(state): State<AppState>) -> Result<Json<Vec<VmResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut vm_repo = Vms::new(&mut conn);

    let vms = vm_repo.list().await?;
    Ok(Json(vms.into_iter().map(VmResponse::from).collect()))
}

/// Show a single VM record
#[utoipa::path(
    get,
    path = "/showVM/{id}",
    tag = "vms",
    params(("id" = i64, Path, description = "VM ID")),
    responses(
        (status = 200, description = "VM details", body = VmResponse),
        (status = 404, description = "VM not found"),
    )
)]
#[tracing::instrument(skip_all, fields(vm_id = id))]
pub async fn show_vm(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<VmResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut vm_repo = Vms::new(&mut conn);

    let vm = vm_repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "VM".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(VmResponse::from(vm)))
}

/// Current field values for the VM edit form
#[utoipa::path(
    get,
    path = "/edit_vm/{id}",
    tag = "vms",
    params(("id" = i64, Path, description = "VM ID")),
    responses(
        (status = 200, description = "Current VM fields", body = VmResponse),
        (status = 404, description = "VM not found"),
    )
)]
#[tracing::instrument(skip_all, fields(vm_id = id))]
pub async fn get_edit_vm(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<VmResponse>, Error> {
    show_vm(State(state), Path(id)).await
}

/// Update a VM record
///
/// Ownership never changes on edit; the record keeps the user it was
/// created under.
#[utoipa::path(
    post,
    path = "/edit_vm/{id}",
    request_body(content = VmForm, content_type = "application/x-www-form-urlencoded"),
    tag = "vms",
    params(("id" = i64, Path, description = "VM ID")),
    responses(
        (status = 303, description = "VM updated, redirect to VM list"),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "VM not found"),
        (status = 409, description = "IPv4 or MAC address already in use"),
    )
)]
#[tracing::instrument(skip_all, fields(vm_id = id))]
pub async fn edit_vm(State(state): State<AppState>, Path(id): Path<i64>, Form(form): Form<VmForm>) -> Result<Redirect, Error> {
    validate_vm_form(&form)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut vm_repo = Vms::new(&mut conn);

    match vm_repo.update(id, &form.into()).await {
        Ok(_) => Ok(Redirect::to("/view_vms")),
        Err(crate::db::errors::DbError::NotFound) => Err(Error::NotFound {
            resource: "VM".to_string(),
            id: id.to_string(),
        }),
        Err(e) => Err(Error::Database(e)),
    }
}

/// Delete a VM record
#[utoipa::path(
    post,
    path = "/delete_vm/{id}",
    tag = "vms",
    params(("id" = i64, Path, description = "VM ID")),
    responses(
        (status = 303, description = "VM deleted, redirect to VM list"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "VM not found"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(vm_id = id, deleted_by = %current_user.username))]
pub async fn delete_vm(State(state): State<AppState>, current_user: CurrentUser, Path(id): Path<i64>) -> Result<Redirect, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut vm_repo = Vms::new(&mut conn);

    let deleted = vm_repo.delete(id).await?;
    if !deleted {
        return Err(Error::NotFound {
            resource: "VM".to_string(),
            id: id.to_string(),
        });
    }

    Ok(Redirect::to("/view_vms"))
}
