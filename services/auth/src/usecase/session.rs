use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use std::time::{SystemTime, UNIX_EPOCH};

use meridian_auth_types::token::{ACCESS_TOKEN_EXP, JwtClaims};

use crate::domain::repository::{MagicLinkRepository, UserRepository};
use crate::domain::types::{AuthUser, InvalidationReason};
use crate::error::AuthServiceError;
use crate::validation::validate_token_shape;

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before UNIX epoch")
        .as_secs()
}

/// Sign an access token embedding the user's identity. Returns the encoded
/// JWT and its expiry timestamp.
pub fn issue_access_token(
    user: &AuthUser,
    secret: &str,
) -> Result<(String, u64), AuthServiceError> {
    let exp = now_secs() + ACCESS_TOKEN_EXP;
    let claims = JwtClaims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        name: user.name.clone(),
        role: user.role.as_u8(),
        status: user.status.as_u8(),
        exp,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthServiceError::Internal(e.into()))?;
    Ok((token, exp))
}

// ── CreateSession (redeem a magic link) ──────────────────────────────────────

pub struct CreateSessionInput {
    pub token: String,
}

#[derive(Debug)]
pub struct CreateSessionOutput {
    pub user: AuthUser,
    pub access_token: String,
    pub access_token_exp: u64,
}

pub struct CreateSessionUseCase<U: UserRepository, M: MagicLinkRepository> {
    pub users: U,
    pub magic_links: M,
    pub jwt_secret: String,
}

impl<U: UserRepository, M: MagicLinkRepository> CreateSessionUseCase<U, M> {
    pub async fn execute(
        &self,
        input: CreateSessionInput,
    ) -> Result<CreateSessionOutput, AuthServiceError> {
        validate_token_shape(&input.token)?;

        let now = Utc::now();

        // Conditional update: only one concurrent redeemer can win. Losers
        // fall through to classification below.
        let Some(redeemed) = self.magic_links.redeem(&input.token, now).await? else {
            return Err(self.classify_failure(&input.token).await?);
        };

        let user = self
            .users
            .find_by_id(redeemed.user_id)
            .await?
            .ok_or(AuthServiceError::LinkNotFound)?;

        let (access_token, access_token_exp) = issue_access_token(&user, &self.jwt_secret)?;

        Ok(CreateSessionOutput {
            user,
            access_token,
            access_token_exp,
        })
    }

    /// Decide why redemption failed. Expiry is checked before the used flag:
    /// a token both used and past expiry reports expired. Tokens invalidated
    /// by new-request/manual surface as not-found; the HTTP body is uniform
    /// either way.
    async fn classify_failure(
        &self,
        token: &str,
    ) -> Result<AuthServiceError, AuthServiceError> {
        let Some(record) = self.magic_links.find_by_token(token).await? else {
            return Ok(AuthServiceError::LinkNotFound);
        };

        if Utc::now() > record.expires_at {
            // Lazy expiry marking; the record may already be terminal.
            if record.used_at.is_none() && record.invalidated_by.is_none() {
                self.magic_links
                    .mark_invalidated(record.id, InvalidationReason::Expired)
                    .await?;
            }
            return Ok(AuthServiceError::LinkExpired);
        }

        if record.used_at.is_some() {
            return Ok(AuthServiceError::LinkAlreadyUsed);
        }

        Ok(AuthServiceError::LinkNotFound)
    }
}
