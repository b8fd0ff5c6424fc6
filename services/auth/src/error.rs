use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Auth service domain error variants.
///
/// The three redemption failures stay distinct in Rust so tests and logs can
/// tell them apart, but share one HTTP surface (`INVALID_LINK`, 401) so the
/// response never reveals which condition applied.
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error("user not found")]
    UserNotFound,
    #[error("invalid or expired link")]
    LinkNotFound,
    #[error("invalid or expired link")]
    LinkExpired,
    #[error("invalid or expired link")]
    LinkAlreadyUsed,
    #[error("invalid token")]
    InvalidToken,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AuthServiceError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::LinkNotFound | Self::LinkExpired | Self::LinkAlreadyUsed => "INVALID_LINK",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl IntoResponse for AuthServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::LinkNotFound | Self::LinkExpired | Self::LinkAlreadyUsed | Self::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // Log 500s only. tower-http TraceLayer already records method/uri/status for all
        // requests. 4xx are expected client errors; logging them here would be noise.
        // Internal errors need the anyhow chain logged so the root cause is traceable.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %e, kind = "INTERNAL", "internal error");
        }
        let body = match &self {
            Self::Validation { field, .. } => serde_json::json!({
                "kind": self.kind(),
                "message": self.to_string(),
                "field": field,
            }),
            _ => serde_json::json!({
                "kind": self.kind(),
                "message": self.to_string(),
            }),
        };
        (status, axum::Json(body)).into_response()
    }
}
