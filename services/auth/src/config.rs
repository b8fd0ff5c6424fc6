/// Auth service configuration loaded from environment variables.
#[derive(Debug)]
pub struct AuthConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// HMAC secret for signing JWT access tokens.
    pub jwt_secret: String,
    /// TCP port to listen on (default 3112). Env var: `AUTH_PORT`.
    pub auth_port: u16,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL"),
            jwt_secret: std::env::var("JWT_SECRET").expect("JWT_SECRET"),
            auth_port: std::env::var("AUTH_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3112),
        }
    }
}
