//! Typed input validation.
//!
//! Plain functions returning structured field-level errors; malformed input
//! is rejected before any repository call.

use crate::domain::types::{TOKEN_MAX_LEN, TOKEN_MIN_LEN};
use crate::error::AuthServiceError;

/// Maximum email length accepted (RFC 5321 path limit).
const EMAIL_MAX_LEN: usize = 254;

/// Check that `email` is a plausibly well-formed address: one `@`, non-empty
/// local part, domain with at least one interior dot, no whitespace.
pub fn validate_email(email: &str) -> Result<(), AuthServiceError> {
    if email.is_empty() || email.len() > EMAIL_MAX_LEN {
        return Err(AuthServiceError::validation(
            "email",
            "email must be between 1 and 254 characters",
        ));
    }
    if email.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(AuthServiceError::validation(
            "email",
            "email must not contain whitespace",
        ));
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(AuthServiceError::validation(
            "email",
            "malformed email address",
        ));
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(AuthServiceError::validation(
            "email",
            "malformed email address",
        ));
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(AuthServiceError::validation(
            "email",
            "malformed email domain",
        ));
    }
    Ok(())
}

/// Check the presented token's shape (length bounds) before any lookup.
pub fn validate_token_shape(token: &str) -> Result<(), AuthServiceError> {
    if token.len() < TOKEN_MIN_LEN || token.len() > TOKEN_MAX_LEN {
        return Err(AuthServiceError::validation(
            "token",
            format!("token must be between {TOKEN_MIN_LEN} and {TOKEN_MAX_LEN} characters"),
        ));
    }
    Ok(())
}
