use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
};
use serde::Deserialize;

use meridian_auth_types::token::validate_access_token;

use crate::domain::types::{DeviceCategory, RequestDevice};
use crate::error::AuthServiceError;
use crate::handlers::bearer_token;
use crate::state::AppState;
use crate::usecase::magic_link::{
    IssueMagicLinkInput, IssueMagicLinkUseCase, RevokeMagicLinksUseCase,
};

/// Build request-device metadata from standard headers. The gateway sets
/// `x-forwarded-for`; the first entry is the client address.
fn request_device(headers: &HeaderMap) -> RequestDevice {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .unwrap_or_default()
        .trim()
        .to_owned();
    let category = DeviceCategory::from_user_agent(&user_agent);
    RequestDevice {
        user_agent,
        ip_address,
        category,
    }
}

// ── POST /auth/magic-link ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateMagicLinkRequest {
    pub email: String,
}

pub async fn create_magic_link(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateMagicLinkRequest>,
) -> Result<StatusCode, AuthServiceError> {
    let usecase = IssueMagicLinkUseCase {
        users: state.user_repo(),
        magic_links: state.magic_link_repo(),
    };
    usecase
        .execute(IssueMagicLinkInput {
            email: body.email,
            device: request_device(&headers),
        })
        .await?;
    Ok(StatusCode::CREATED)
}

// ── DELETE /auth/magic-link ──────────────────────────────────────────────────

pub async fn revoke_magic_links(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, AuthServiceError> {
    let token = bearer_token(&headers)?;
    let info = validate_access_token(token, &state.jwt_secret)
        .map_err(|_| AuthServiceError::InvalidToken)?;

    let usecase = RevokeMagicLinksUseCase {
        magic_links: state.magic_link_repo(),
    };
    usecase.execute(info.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
