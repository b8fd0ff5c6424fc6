use sea_orm::Database;
use tracing::info;

use meridian_auth::config::AuthConfig;
use meridian_auth::router::build_router;
use meridian_auth::state::AppState;
use meridian_core::tracing::init_tracing;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = AuthConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let state = AppState {
        db,
        jwt_secret: config.jwt_secret,
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.auth_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("auth service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
