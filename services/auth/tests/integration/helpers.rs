use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use meridian_auth::domain::repository::{MagicLinkRepository, UserRepository};
use meridian_auth::domain::types::{
    AuthUser, DeviceCategory, InvalidationReason, MAGIC_LINK_TOKEN_LEN, MAGIC_LINK_TTL_SECS,
    MagicLinkToken, OutboxEvent, RequestDevice,
};
use meridian_auth::error::AuthServiceError;
use meridian_domain::user::{UserRole, UserStatus};

// ── MockUserRepo ─────────────────────────────────────────────────────────────

pub struct MockUserRepo {
    pub users: Vec<AuthUser>,
}

impl MockUserRepo {
    pub fn new(users: Vec<AuthUser>) -> Self {
        Self { users }
    }

    pub fn empty() -> Self {
        Self { users: vec![] }
    }
}

impl UserRepository for MockUserRepo {
    async fn find_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthServiceError> {
        Ok(self.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthServiceError> {
        Ok(self.users.iter().find(|u| u.id == id).cloned())
    }
}

// ── MockMagicLinkRepo ────────────────────────────────────────────────────────

/// In-memory token store. A single mutex guards the token list, so the
/// check-and-mark in `redeem` is atomic exactly like the SQL conditional
/// update it stands in for. Clones share the same underlying store.
#[derive(Clone)]
pub struct MockMagicLinkRepo {
    pub tokens: Arc<Mutex<Vec<MagicLinkToken>>>,
    pub events: Arc<Mutex<Vec<OutboxEvent>>>,
}

impl MockMagicLinkRepo {
    pub fn new(tokens: Vec<MagicLinkToken>) -> Self {
        Self {
            tokens: Arc::new(Mutex::new(tokens)),
            events: Arc::new(Mutex::new(vec![])),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    /// Shared handle to the token list for post-execution inspection.
    pub fn tokens_handle(&self) -> Arc<Mutex<Vec<MagicLinkToken>>> {
        Arc::clone(&self.tokens)
    }

    /// Shared handle to the recorded outbox events.
    pub fn events_handle(&self) -> Arc<Mutex<Vec<OutboxEvent>>> {
        Arc::clone(&self.events)
    }
}

impl MagicLinkRepository for MockMagicLinkRepo {
    async fn issue(
        &self,
        token: &MagicLinkToken,
        event: &OutboxEvent,
    ) -> Result<(), AuthServiceError> {
        let mut tokens = self.tokens.lock().unwrap();
        let now = token.created_at;
        for t in tokens.iter_mut() {
            if t.user_id == token.user_id && t.is_valid_at(now) {
                t.invalidated_by = Some(InvalidationReason::NewRequest);
                t.updated_at = now;
            }
        }
        tokens.push(token.clone());
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn redeem(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<MagicLinkToken>, AuthServiceError> {
        let mut tokens = self.tokens.lock().unwrap();
        match tokens
            .iter_mut()
            .find(|t| t.token == token && t.is_valid_at(now))
        {
            Some(t) => {
                t.used_at = Some(now);
                t.updated_at = now;
                Ok(Some(t.clone()))
            }
            None => Ok(None),
        }
    }

    async fn find_by_token(
        &self,
        token: &str,
    ) -> Result<Option<MagicLinkToken>, AuthServiceError> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.token == token && t.deleted_at.is_none())
            .cloned())
    }

    async fn invalidate_active(
        &self,
        user_id: Uuid,
        reason: InvalidationReason,
    ) -> Result<u64, AuthServiceError> {
        let now = Utc::now();
        let mut tokens = self.tokens.lock().unwrap();
        let mut count = 0;
        for t in tokens.iter_mut() {
            if t.user_id == user_id && t.is_valid_at(now) {
                t.invalidated_by = Some(reason);
                t.updated_at = now;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn mark_invalidated(
        &self,
        id: Uuid,
        reason: InvalidationReason,
    ) -> Result<(), AuthServiceError> {
        let mut tokens = self.tokens.lock().unwrap();
        if let Some(t) = tokens.iter_mut().find(|t| t.id == id) {
            t.invalidated_by = Some(reason);
            t.updated_at = Utc::now();
        }
        Ok(())
    }
}

// ── Test fixture helpers ─────────────────────────────────────────────────────

pub fn test_user() -> AuthUser {
    AuthUser {
        id: Uuid::parse_str("00000000-0000-0000-0000-000000000001").unwrap(),
        email: "user@example.com".to_owned(),
        name: "Test User".to_owned(),
        role: UserRole::Customer,
        status: UserStatus::Active,
    }
}

pub fn test_device() -> RequestDevice {
    RequestDevice {
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/120.0".to_owned(),
        ip_address: "203.0.113.9".to_owned(),
        category: DeviceCategory::Desktop,
    }
}

pub fn test_magic_link(user_id: Uuid) -> MagicLinkToken {
    let now = Utc::now();
    MagicLinkToken {
        id: Uuid::new_v4(),
        user_id,
        token: "B".repeat(MAGIC_LINK_TOKEN_LEN),
        device: test_device(),
        expires_at: now + chrono::Duration::seconds(MAGIC_LINK_TTL_SECS),
        used_at: None,
        invalidated_by: None,
        deleted_at: None,
        created_at: now,
        updated_at: now,
    }
}

/// A magic link whose TTL elapsed one minute ago.
pub fn expired_magic_link(user_id: Uuid) -> MagicLinkToken {
    let now = Utc::now();
    let mut token = test_magic_link(user_id);
    token.token = "C".repeat(MAGIC_LINK_TOKEN_LEN);
    token.expires_at = now - chrono::Duration::seconds(60);
    token.created_at = now - chrono::Duration::seconds(MAGIC_LINK_TTL_SECS + 60);
    token
}

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-for-unit-tests-only";
