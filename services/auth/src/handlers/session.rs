use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use meridian_auth_types::token::validate_access_token;

use crate::error::AuthServiceError;
use crate::handlers::bearer_token;
use crate::state::AppState;
use crate::usecase::session::{CreateSessionInput, CreateSessionUseCase};

/// Minimal user identity echoed in session responses. The envelope is
/// camelCase for the frontend.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: u8,
    pub status: u8,
}

// ── POST /auth/session ───────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateSessionRequest {
    pub token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub access_token: String,
    pub access_token_exp: u64,
    pub user: SessionUser,
}

pub async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = CreateSessionUseCase {
        users: state.user_repo(),
        magic_links: state.magic_link_repo(),
        jwt_secret: state.jwt_secret.clone(),
    };

    let out = usecase
        .execute(CreateSessionInput { token: body.token })
        .await?;

    let body = CreateSessionResponse {
        access_token: out.access_token,
        access_token_exp: out.access_token_exp,
        user: SessionUser {
            id: out.user.id,
            email: out.user.email,
            name: out.user.name,
            role: out.user.role.as_u8(),
            status: out.user.status.as_u8(),
        },
    };

    Ok((StatusCode::CREATED, Json(body)))
}

// ── GET /auth/session ────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckSessionResponse {
    pub user: SessionUser,
    pub access_token_exp: u64,
}

pub async fn check_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AuthServiceError> {
    let token = bearer_token(&headers)?;
    let info = validate_access_token(token, &state.jwt_secret)
        .map_err(|_| AuthServiceError::InvalidToken)?;

    let body = CheckSessionResponse {
        user: SessionUser {
            id: info.user_id,
            email: info.email,
            name: info.name,
            role: info.user_role,
            status: info.user_status,
        },
        access_token_exp: info.access_token_exp,
    };

    Ok((StatusCode::OK, Json(body)))
}
