pub mod magic_link;
pub mod session;

use axum::http::HeaderMap;

use crate::error::AuthServiceError;

/// Extract the bearer access token from the `Authorization` header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthServiceError> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|v| !v.is_empty())
        .ok_or(AuthServiceError::InvalidToken)
}
