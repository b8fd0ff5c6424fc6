//! Shared domain types for Meridian services.

pub mod user;
