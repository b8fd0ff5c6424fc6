use chrono::{Duration, Utc};
use rand::RngExt;
use serde_json::json;
use uuid::Uuid;

use crate::domain::repository::{MagicLinkRepository, UserRepository};
use crate::domain::types::{
    InvalidationReason, MAGIC_LINK_TOKEN_LEN, MAGIC_LINK_TTL_SECS, MagicLinkToken, OutboxEvent,
    RequestDevice,
};
use crate::error::AuthServiceError;
use crate::validation::validate_email;

/// Charset for generated link tokens (URL-safe alphanumeric).
const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

fn generate_token() -> String {
    let mut rng = rand::rng();
    (0..MAGIC_LINK_TOKEN_LEN)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}

// ── IssueMagicLink ───────────────────────────────────────────────────────────

pub struct IssueMagicLinkInput {
    pub email: String,
    pub device: RequestDevice,
}

pub struct IssueMagicLinkUseCase<U, M>
where
    U: UserRepository,
    M: MagicLinkRepository,
{
    pub users: U,
    pub magic_links: M,
}

impl<U, M> IssueMagicLinkUseCase<U, M>
where
    U: UserRepository,
    M: MagicLinkRepository,
{
    pub async fn execute(&self, input: IssueMagicLinkInput) -> Result<(), AuthServiceError> {
        // 1. Reject malformed addresses before touching storage
        validate_email(&input.email)?;

        // 2. Find user by email → 404 if not found
        let user = self
            .users
            .find_by_email(&input.email)
            .await?
            .ok_or(AuthServiceError::UserNotFound)?;

        // 3. Build the token record
        let token_str = generate_token();
        let now = Utc::now();
        let token = MagicLinkToken {
            id: Uuid::new_v4(),
            user_id: user.id,
            token: token_str.clone(),
            device: input.device,
            expires_at: now + Duration::seconds(MAGIC_LINK_TTL_SECS),
            used_at: None,
            invalidated_by: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };

        // 4. Supersede prior valid tokens + insert token + outbox event in
        //    one transaction. The raw token only travels via the outbox.
        let event = OutboxEvent {
            id: Uuid::new_v4(),
            kind: "magic_link_issued".to_owned(),
            payload: json!({ "email": input.email, "token": token_str }),
            idempotency_key: format!("magic_link_issued:{}", token.id),
        };

        self.magic_links.issue(&token, &event).await?;
        Ok(())
    }
}

// ── RevokeMagicLinks ─────────────────────────────────────────────────────────

pub struct RevokeMagicLinksUseCase<M: MagicLinkRepository> {
    pub magic_links: M,
}

impl<M: MagicLinkRepository> RevokeMagicLinksUseCase<M> {
    /// Invalidate every outstanding link of a user (reason = manual).
    /// Returns the number of links revoked.
    pub async fn execute(&self, user_id: Uuid) -> Result<u64, AuthServiceError> {
        self.magic_links
            .invalidate_active(user_id, InvalidationReason::Manual)
            .await
    }
}
