use axum::{
    http::{header::RETRY_AFTER, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Known kinds map to fixed status/code pairs. Database and unclassified
/// internal errors are logged with full detail server-side and returned to the
/// client as opaque messages.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication required")]
    Authentication,

    #[error("Access denied")]
    Authorization,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded")]
    RateLimited { limit: u32, retry_after_secs: u64 },

    #[error("AI provider error: {0}")]
    AiProvider(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration missing: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Builds a `Validation` error listing every missing request field.
    pub fn missing_fields(fields: &[&str]) -> Self {
        Self::Validation(format!("Missing required fields: {}", fields.join(", ")))
    }

    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Authentication => "AUTHENTICATION_ERROR",
            Self::Authorization => "AUTHORIZATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::AiProvider(_) => "AI_PROVIDER_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            Self::Network(_) => "NETWORK_ERROR",
            Self::Config(_) => "CONFIG_MISSING",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::Authorization => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::AiProvider(_) | Self::ExternalService(_) => StatusCode::BAD_GATEWAY,
            Self::Network(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let (message, details) = match &self {
            AppError::Validation(msg) => (msg.clone(), None),
            AppError::Authentication => ("Authentication required".to_string(), None),
            AppError::Authorization => ("Access denied".to_string(), None),
            AppError::NotFound(msg) => (msg.clone(), None),
            AppError::RateLimited {
                limit,
                retry_after_secs,
            } => (
                "Too many requests. Please slow down.".to_string(),
                Some(json!({ "limit": limit, "retry_after_secs": retry_after_secs })),
            ),
            AppError::AiProvider(msg) => {
                tracing::error!("AI provider error: {msg}");
                (msg.clone(), None)
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                ("A database error occurred".to_string(), None)
            }
            AppError::ExternalService(msg) => {
                tracing::error!("External service error: {msg}");
                (msg.clone(), None)
            }
            AppError::Network(msg) => {
                tracing::warn!("Network error: {msg}");
                (msg.clone(), None)
            }
            AppError::Config(msg) => {
                tracing::warn!("Configuration missing: {msg}");
                (msg.clone(), None)
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                ("An internal server error occurred".to_string(), None)
            }
        };

        let mut body = json!({ "error": message, "code": code });
        if let Some(details) = details {
            body["details"] = details;
        }

        let mut response = (status, Json(body)).into_response();

        if let AppError::RateLimited {
            retry_after_secs, ..
        } = &self
        {
            if let Ok(value) = retry_after_secs.to_string().parse() {
                response.headers_mut().insert(RETRY_AFTER, value);
            }
        }

        response
    }
}
