//! User domain types.

use serde::{Deserialize, Serialize};

/// User permission level.
///
/// Wire format: `u8` (0 = Customer, 1 = Manager, 2 = Admin).
/// Drives dashboard routing and role gates downstream of authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Customer = 0,
    Manager = 1,
    Admin = 2,
}

impl UserRole {
    /// Convert from `u8` wire value. Returns `None` for unknown values.
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Customer),
            1 => Some(Self::Manager),
            2 => Some(Self::Admin),
            _ => None,
        }
    }

    /// Convert to `u8` wire value.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl PartialOrd for UserRole {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for UserRole {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_u8().cmp(&other.as_u8())
    }
}

/// Account standing of a user.
///
/// Wire format: `u8` (0 = Active, 1 = Suspended, 2 = Closed).
/// The session embeds the status so downstream services can apply their own
/// gates without a user lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active = 0,
    Suspended = 1,
    Closed = 2,
}

impl UserStatus {
    /// Convert from `u8` wire value. Returns `None` for unknown values.
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Active),
            1 => Some(Self::Suspended),
            2 => Some(Self::Closed),
            _ => None,
        }
    }

    /// Convert to `u8` wire value.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}
