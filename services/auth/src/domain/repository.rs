#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::types::{AuthUser, InvalidationReason, MagicLinkToken, OutboxEvent};
use crate::error::AuthServiceError;

/// Repository for user lookups.
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthServiceError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthServiceError>;
}

/// Repository for single-use magic-link tokens.
pub trait MagicLinkRepository: Send + Sync {
    /// Issue a new token: invalidate the user's currently-valid tokens
    /// (reason = new-request), insert the new token row, and insert its
    /// outbox event, all in one transaction, so two valid tokens never
    /// coexist for a user.
    async fn issue(
        &self,
        token: &MagicLinkToken,
        event: &OutboxEvent,
    ) -> Result<(), AuthServiceError>;

    /// Atomically consume a token that is still valid at `now` (single
    /// conditional update). Returns the redeemed record, or `None` when no
    /// valid row matched; the caller classifies why via [`find_by_token`].
    ///
    /// [`find_by_token`]: MagicLinkRepository::find_by_token
    async fn redeem(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<MagicLinkToken>, AuthServiceError>;

    /// Find by exact token value, in any lifecycle state (soft-deleted rows
    /// excluded).
    async fn find_by_token(&self, token: &str)
    -> Result<Option<MagicLinkToken>, AuthServiceError>;

    /// Invalidate every currently-valid token of a user. Returns the number
    /// of tokens invalidated.
    async fn invalidate_active(
        &self,
        user_id: Uuid,
        reason: InvalidationReason,
    ) -> Result<u64, AuthServiceError>;

    /// Mark one token invalidated (lazy expiry marking at redemption time).
    async fn mark_invalidated(
        &self,
        id: Uuid,
        reason: InvalidationReason,
    ) -> Result<(), AuthServiceError>;
}
