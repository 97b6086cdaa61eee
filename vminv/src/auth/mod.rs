//! Authentication system.
//!
//! Browser-based authentication using JWT session cookies:
//! - Users log in via `POST /login` with email/password
//! - A signed JWT is stored in the session cookie
//! - A second, non-HttpOnly cookie carries the username for display purposes
//!
//! # Modules
//!
//! - [`current_user`]: Extractors for getting the authenticated user in handlers
//! - [`password`]: Password hashing and verification using Argon2
//! - [`session`]: JWT session token creation and verification
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use vminv::api::models::users::CurrentUser;
//!
//! async fn protected_handler(user: CurrentUser) -> String {
//!     format!("Hello, {}!", user.username)
//! }
//! ```

pub mod current_user;
pub mod password;
pub mod session;
