use axum::http::{header, HeaderMap};

use crate::users::{dto::UserPayload, repo_types::NewUser};

pub(crate) const INVALID_CONTENT_TYPE: &str =
    "Invalid content type. Only application/json is accepted";
pub(crate) const INVALID_BODY: &str = "Invalid request body";
pub(crate) const FIELDS_REQUIRED: &str = "All fields are required";
pub(crate) const CREATE_FAILED: &str = "Failed to create user";

/// True only when the header is exactly `application/json`, no parameters.
pub(crate) fn is_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .map(|v| v.as_bytes() == b"application/json")
        .unwrap_or(false)
}

/// Presence check only: every field must be non-empty. Values are kept verbatim.
pub(crate) fn validate_new_user(payload: UserPayload) -> Result<NewUser, &'static str> {
    if payload.name.is_empty() || payload.email.is_empty() || payload.password.is_empty() {
        return Err(FIELDS_REQUIRED);
    }
    Ok(NewUser {
        name: payload.name,
        email: payload.email,
        password: payload.password,
    })
}
