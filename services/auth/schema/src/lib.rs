//! sea-orm entities for the auth service database.

pub mod magic_link_tokens;
pub mod outbox_events;
pub mod users;
