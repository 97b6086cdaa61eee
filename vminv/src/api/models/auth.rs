//! API request/response models for authentication.

use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Registration form payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterForm {
    pub firstname: String,
    pub lastname: String,
    pub birthday: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Login form payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration availability, returned by `GET /register`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegistrationInfo {
    pub enabled: bool,
    pub message: String,
}

/// Login availability, returned by `GET /login`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginInfo {
    pub enabled: bool,
    pub message: String,
}

/// A 303 redirect that also sets cookies.
///
/// Axum's `Redirect` cannot carry `Set-Cookie` headers, so login and logout
/// build their responses by hand: one header per cookie, then the redirect.
#[derive(Debug)]
pub struct LoginResponse {
    pub cookies: Vec<String>,
    pub location: &'static str,
}

impl IntoResponse for LoginResponse {
    fn into_response(self) -> Response {
        let mut response = StatusCode::SEE_OTHER.into_response();
        response
            .headers_mut()
            .insert(header::LOCATION, HeaderValue::from_static(self.location));
        for cookie in &self.cookies {
            if let Ok(value) = HeaderValue::from_str(cookie) {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
        }
        response
    }
}

/// Logout clears the session and username cookies and redirects home.
#[derive(Debug)]
pub struct LogoutResponse {
    pub cookies: Vec<String>,
}

impl IntoResponse for LogoutResponse {
    fn into_response(self) -> Response {
        LoginResponse {
            cookies: self.cookies,
            location: "/",
        }
        .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_sets_cookies_and_redirects() {
        let response = LoginResponse {
            cookies: vec!["a=1; Path=/".to_string(), "b=2; Path=/".to_string()],
            location: "/",
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");

        let cookies: Vec<_> = response.headers().get_all(header::SET_COOKIE).iter().collect();
        assert_eq!(cookies.len(), 2);
    }
}
