use sea_orm::DatabaseConnection;

use crate::infra::db::{DbMagicLinkRepository, DbUserRepository};

/// Shared application state passed to every handler via axum `State`.
/// Repositories are constructed per request from the pooled connection; no
/// process-wide mutable singletons.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub jwt_secret: String,
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn magic_link_repo(&self) -> DbMagicLinkRepository {
        DbMagicLinkRepository {
            db: self.db.clone(),
        }
    }
}
