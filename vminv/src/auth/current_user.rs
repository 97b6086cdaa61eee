use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::session,
    errors::{Error, Result},
};
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};
use tracing::{debug, instrument, trace};

/// Extract user from JWT session cookie if present and valid
/// Returns:
/// - None: No JWT cookie present
/// - Some(Ok(user)): Valid JWT found and verified
/// - Some(Err(error)): JWT cookie present but invalid/malformed
#[instrument(skip(parts, config))]
fn try_jwt_session_auth(parts: &Parts, config: &crate::config::Config) -> Option<Result<CurrentUser>> {
    let cookie_name = &config.auth.native.session.cookie_name;

    // Clients may split cookies across multiple Cookie headers, and this
    // service sets two cookies, so every header must be scanned.
    for cookie_header in parts.headers.get_all(axum::http::header::COOKIE) {
        let cookie_str = match cookie_header.to_str() {
            Ok(s) => s,
            Err(e) => {
                return Some(Err(Error::BadRequest {
                    message: format!("Invalid cookie header: {e}"),
                }));
            }
        };

        for cookie in cookie_str.split(';') {
            let cookie = cookie.trim();
            if let Some((name, value)) = cookie.split_once('=') {
                if name == cookie_name {
                    // Try to verify the JWT session token
                    match session::verify_session_token(value, config) {
                        Ok(user) => return Some(Ok(user)),
                        Err(_) => {
                            // Invalid/expired token, continue checking other cookies.
                            // JWT verification errors are expected for expired tokens.
                            continue;
                        }
                    }
                }
            }
        }
    }

    None
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        if state.config.auth.native.enabled {
            match try_jwt_session_auth(parts, &state.config) {
                Some(Ok(user)) => {
                    debug!("Found JWT session authenticated user: {}", user.id);
                    return Ok(user);
                }
                Some(Err(e)) => {
                    trace!("JWT session authentication failed: {:?}", e);
                }
                None => {
                    trace!("No JWT session authentication attempted");
                }
            }
        }

        Err(Error::Unauthenticated { message: None })
    }
}

/// Optional extraction: handlers that merely change behavior for logged-in
/// users (e.g. the login page redirecting when a session already exists) take
/// `Option<CurrentUser>` and never reject.
impl OptionalFromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Option<Self>> {
        match <CurrentUser as FromRequestParts<AppState>>::from_request_parts(parts, state).await {
            Ok(user) => Ok(Some(user)),
            Err(_) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_config;

    fn parts_with_cookie(cookie: &str) -> Parts {
        let request = axum::http::Request::builder()
            .uri("http://localhost/test")
            .header(axum::http::header::COOKIE, cookie)
            .body(())
            .unwrap();

        let (parts, _body) = request.into_parts();
        parts
    }

    #[test]
    fn test_valid_session_cookie() {
        let config = create_test_config();
        let user = CurrentUser {
            id: 7,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
        };

        let token = session::create_session_token(&user, &config).unwrap();
        let cookie_name = &config.auth.native.session.cookie_name;
        let parts = parts_with_cookie(&format!("{cookie_name}={token}"));

        let result = try_jwt_session_auth(&parts, &config);
        let extracted = result.expect("cookie present").expect("token valid");
        assert_eq!(extracted.id, 7);
        assert_eq!(extracted.username, "alice");
    }

    #[test]
    fn test_invalid_session_cookie_is_ignored() {
        let config = create_test_config();
        let cookie_name = &config.auth.native.session.cookie_name;
        let parts = parts_with_cookie(&format!("{cookie_name}=garbage.token.value"));

        let result = try_jwt_session_auth(&parts, &config);
        assert!(result.is_none());
    }

    #[test]
    fn test_missing_cookie_header() {
        let config = create_test_config();
        let request = axum::http::Request::builder().uri("http://localhost/test").body(()).unwrap();
        let (parts, _body) = request.into_parts();

        let result = try_jwt_session_auth(&parts, &config);
        assert!(result.is_none());
    }

    #[test]
    fn test_session_cookie_in_second_cookie_header() {
        let config = create_test_config();
        let user = CurrentUser {
            id: 11,
            username: "carol".to_string(),
            email: "carol@example.com".to_string(),
        };

        let token = session::create_session_token(&user, &config).unwrap();
        let cookie_name = &config.auth.native.session.cookie_name;

        // Cookies split across separate Cookie headers, session token last
        let request = axum::http::Request::builder()
            .uri("http://localhost/test")
            .header(axum::http::header::COOKIE, "username=carol")
            .header(axum::http::header::COOKIE, format!("{cookie_name}={token}"))
            .body(())
            .unwrap();
        let (parts, _body) = request.into_parts();

        let result = try_jwt_session_auth(&parts, &config);
        let extracted = result.expect("cookie present").expect("token valid");
        assert_eq!(extracted.id, 11);
        assert_eq!(extracted.username, "carol");
    }

    #[test]
    fn test_session_cookie_among_other_cookies() {
        let config = create_test_config();
        let user = CurrentUser {
            id: 9,
            username: "bob".to_string(),
            email: "bob@example.com".to_string(),
        };

        let token = session::create_session_token(&user, &config).unwrap();
        let cookie_name = &config.auth.native.session.cookie_name;
        let parts = parts_with_cookie(&format!("username=bob; {cookie_name}={token}; theme=dark"));

        let result = try_jwt_session_auth(&parts, &config);
        let extracted = result.expect("cookie present").expect("token valid");
        assert_eq!(extracted.id, 9);
    }
}
