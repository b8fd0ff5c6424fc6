//! JWT access-token validation.

use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::Deserialize;
#[cfg(any(feature = "USE_ONLY_IN_AUTH_SERVICE", test))]
use serde::Serialize;
use uuid::Uuid;

/// Access-token JWT lifetime in seconds (4 hours).
pub const ACCESS_TOKEN_EXP: u64 = 14400;

/// User identity extracted from a validated access token.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub user_role: u8,
    pub user_status: u8,
    pub access_token_exp: u64,
}

/// Errors returned by [`validate_access_token`].
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
}

/// JWT claims payload shared by token creation (auth service) and validation
/// (gateway, dashboards).
///
/// # Fields
///
/// | Field | JWT claim | Rust type | Meaning |
/// |-------|-----------|-----------|---------|
/// | `sub` | `sub` | UUID string | user ID |
/// | `email` | custom | string | user email |
/// | `name` | custom | string | display name |
/// | `role` | custom | `u8` wire value | see [`meridian_domain::user::UserRole`] |
/// | `status` | custom | `u8` wire value | see [`meridian_domain::user::UserStatus`] |
/// | `exp` | `exp` | seconds since epoch | token expiration |
///
/// # Feature gate
///
/// [`Deserialize`] is always available; all consumers validate tokens.
/// [`Serialize`] requires the **`USE_ONLY_IN_AUTH_SERVICE`** cargo feature.
/// Only the auth service enables it because it is the sole token issuer.
#[derive(Debug, Deserialize)]
#[cfg_attr(any(feature = "USE_ONLY_IN_AUTH_SERVICE", test), derive(Serialize))]
pub struct JwtClaims {
    /// User ID (UUID string).
    pub sub: String,
    /// User email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// User role as `u8` wire value.
    pub role: u8,
    /// Account status as `u8` wire value.
    pub status: u8,
    /// Expiration timestamp (seconds since UNIX epoch).
    pub exp: u64,
}

// ── Core decode (private) ────────────────────────────────────────────────

/// Decode and validate a JWT, returning raw claims.
///
/// Validation: HS256, exp checked, required claims: `exp` + `sub`.
/// Default leeway = 60s tolerates clock skew between services.
fn decode_jwt(token: &str, secret: &str) -> Result<JwtClaims, AuthError> {
    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_exp = true;
    validation.required_spec_claims.clear();
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature
        | jsonwebtoken::errors::ErrorKind::InvalidEcdsaKey
        | jsonwebtoken::errors::ErrorKind::InvalidRsaKey(_) => AuthError::InvalidSignature,
        _ => AuthError::Malformed,
    })?;

    Ok(data.claims)
}

// ── Public: all consumers ────────────────────────────────────────────────

/// Validate an access-token value, returning parsed identity.
///
/// This is the primary public API for token validation. Gateway calls this
/// on every request to extract user identity from the bearer JWT.
pub fn validate_access_token(token: &str, secret: &str) -> Result<TokenInfo, AuthError> {
    let claims = decode_jwt(token, secret)?;
    let user_id = claims
        .sub
        .parse::<Uuid>()
        .map_err(|_| AuthError::Malformed)?;
    Ok(TokenInfo {
        user_id,
        email: claims.email,
        name: claims.name,
        user_role: claims.role,
        user_status: claims.status,
        access_token_exp: claims.exp,
    })
}

// ── Feature-gated: auth service only ─────────────────────────────────────

/// Validate a token and return raw JWT claims.
///
/// Requires the `USE_ONLY_IN_AUTH_SERVICE` feature. Only the auth service
/// should call this directly; all other consumers use
/// [`validate_access_token`].
#[cfg(any(feature = "USE_ONLY_IN_AUTH_SERVICE", test))]
pub fn validate_token(token: &str, secret: &str) -> Result<JwtClaims, AuthError> {
    decode_jwt(token, secret)
}
