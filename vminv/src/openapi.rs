//! OpenAPI documentation for the inventory API.
//!
//! [`ApiDoc`] aggregates every route in the service; the `/api/url_map`
//! endpoint is generated from it so the published route table never drifts
//! from the handlers.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

use crate::api::{handlers, models};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "session_token".to_string(),
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "vminv_session",
                    "Session cookie set by POST /login.",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "VM Inventory API",
        description = "Account management and VM record inventory."
    ),
    modifiers(&SecurityAddon),
    paths(
        handlers::system::index,
        handlers::auth::get_registration_info,
        handlers::auth::register,
        handlers::auth::get_login_info,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::users::list_users,
        handlers::users::show_user,
        handlers::users::get_edit_user,
        handlers::users::edit_user,
        handlers::users::delete_user,
        handlers::vms::get_new_vm,
        handlers::vms::create_vm,
        handlers::vms::list_vms,
        handlers::vms::show_vm,
        handlers::vms::get_edit_vm,
        handlers::vms::edit_vm,
        handlers::vms::delete_vm,
        handlers::system::api_vms,
        handlers::system::api_users,
        handlers::system::url_map,
        handlers::system::sendmail,
    ),
    components(schemas(
        models::auth::RegisterForm,
        models::auth::LoginForm,
        models::auth::RegistrationInfo,
        models::auth::LoginInfo,
        models::users::UserResponse,
        models::users::UserUpdateForm,
        models::users::CurrentUser,
        models::vms::VmForm,
        models::vms::VmResponse,
        models::vms::VmWithOwnerResponse,
    )),
    tags(
        (name = "system", description = "Service info and diagnostics"),
        (name = "authentication", description = "Registration, login, and logout"),
        (name = "users", description = "User account management"),
        (name = "vms", description = "VM record inventory"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_doc_includes_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/", "/register", "/login", "/logout", "/user", "/showUser/{id}", "/edit_user/{id}", "/delete_user/{id}", "/vm/new",
            "/view_vms", "/showVM/{id}", "/edit_vm/{id}", "/delete_vm/{id}", "/api/vms", "/api/users", "/api/url_map", "/sendmail",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing path {path}");
        }
    }
}
