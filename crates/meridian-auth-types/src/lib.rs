//! Session-token types shared by the auth service (issuer) and every
//! service that validates sessions.

pub mod token;
