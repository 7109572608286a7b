//! Access to the resolved user from HTTP request parts.

use crate::model::User;

/// Extract the resolved `User` from HTTP request `Parts`, if present.
///
/// The auth middleware stores it in request extensions on success.
pub fn user_from_parts(parts: &http::request::Parts) -> Option<&User> {
    parts.extensions.get::<User>()
}

/// Extract the user's email from HTTP request `Parts`.
///
/// Returns `"anonymous"` if no user is present (dev mode).
pub fn email_from_parts(parts: &http::request::Parts) -> &str {
    parts
        .extensions
        .get::<User>()
        .map(|u| u.email.as_str())
        .unwrap_or("anonymous")
}
