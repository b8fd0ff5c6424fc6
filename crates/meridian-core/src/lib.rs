//! Service plumbing shared across Meridian services.

pub mod health;
pub mod middleware;
pub mod tracing;
