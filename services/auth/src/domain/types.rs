use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use meridian_domain::user::{UserRole, UserStatus};

/// Auth-relevant user data (email + name for the session, role/status for
/// downstream gates).
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub status: UserStatus,
}

/// Broad device class of the browser that requested a magic link.
///
/// Wire format: `i16` (0 = mobile, 1 = desktop, 2 = tablet).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCategory {
    Mobile = 0,
    Desktop = 1,
    Tablet = 2,
}

impl DeviceCategory {
    pub fn from_i16(v: i16) -> Option<Self> {
        match v {
            0 => Some(Self::Mobile),
            1 => Some(Self::Desktop),
            2 => Some(Self::Tablet),
            _ => None,
        }
    }

    pub fn as_i16(self) -> i16 {
        self as i16
    }

    /// Classify a User-Agent string. Tablets are matched before the generic
    /// "Mobi" marker because tablet UAs often carry both.
    pub fn from_user_agent(user_agent: &str) -> Self {
        let ua = user_agent.to_ascii_lowercase();
        if ua.contains("ipad") || ua.contains("tablet") {
            Self::Tablet
        } else if ua.contains("mobi") {
            Self::Mobile
        } else {
            Self::Desktop
        }
    }
}

/// Why a token stopped being redeemable before use.
///
/// Wire format: `i16` (0 = new-request, 1 = manual, 2 = expired).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationReason {
    NewRequest = 0,
    Manual = 1,
    Expired = 2,
}

impl InvalidationReason {
    pub fn from_i16(v: i16) -> Option<Self> {
        match v {
            0 => Some(Self::NewRequest),
            1 => Some(Self::Manual),
            2 => Some(Self::Expired),
            _ => None,
        }
    }

    pub fn as_i16(self) -> i16 {
        self as i16
    }
}

/// Metadata of the device that requested the link.
#[derive(Debug, Clone)]
pub struct RequestDevice {
    pub user_agent: String,
    pub ip_address: String,
    pub category: DeviceCategory,
}

/// Single-use magic-link token.
///
/// Lifecycle: unused → used (redeemed exactly once), or unused →
/// invalidated(new-request | manual | expired). All non-unused states are
/// terminal.
#[derive(Debug, Clone)]
pub struct MagicLinkToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub device: RequestDevice,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub invalidated_by: Option<InvalidationReason>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MagicLinkToken {
    /// Still redeemable at `now`: unused, unexpired, not invalidated, not
    /// soft-deleted.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none()
            && self.invalidated_by.is_none()
            && self.deleted_at.is_none()
            && self.expires_at > now
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }
}

/// Outbox event for async delivery (the magic-link email).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEvent {
    pub id: Uuid,
    pub kind: String,
    pub payload: serde_json::Value,
    pub idempotency_key: String,
}

/// Generated token length in characters.
pub const MAGIC_LINK_TOKEN_LEN: usize = 48;

/// Magic-link time-to-live in seconds (15 minutes).
pub const MAGIC_LINK_TTL_SECS: i64 = 900;

/// Accepted token length bounds at redemption.
pub const TOKEN_MIN_LEN: usize = 32;
pub const TOKEN_MAX_LEN: usize = 128;
