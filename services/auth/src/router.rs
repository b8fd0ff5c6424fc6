use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

use meridian_core::health::{healthz, readyz};
use meridian_core::middleware::request_id_layer;

use crate::handlers::{
    magic_link::{create_magic_link, revoke_magic_links},
    session::{check_session, create_session},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Magic link
        .route("/auth/magic-link", post(create_magic_link))
        .route("/auth/magic-link", delete(revoke_magic_links))
        // Session
        .route("/auth/session", post(create_session))
        .route("/auth/session", get(check_session))
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(state)
}
