use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// A failure reported by a token repository backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A Redis error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Any other backend failure.
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Errors produced by the CSRF token engine.
///
/// `Expired` is kept apart from `MalformedToken` because the delivery layer
/// logs the two differently, even though both end up as "not valid".
#[derive(Error, Debug)]
pub enum CsrfError {
    /// The secret cannot key AES-GCM (must be 16, 24 or 32 bytes).
    #[error("Invalid CSRF secret length: {0} bytes")]
    InvalidKey(usize),

    /// Entropy or cipher failure while sealing a token.
    #[error("Crypto failure: {0}")]
    CryptoFailure(String),

    /// Undecodable, truncated, forged or corrupted token.
    #[error("Malformed CSRF token")]
    MalformedToken,

    /// The token is older than the configured expiry window.
    #[error("CSRF token expired")]
    Expired,

    /// The replay store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A token repository error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// An authentication error.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// An authorization error.
    #[error("Authorization failed")]
    Unauthorized,

    /// A validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An encryption error.
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Store(ref e) => {
                tracing::error!("Store error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Store error".to_string())
            }

            AppError::Authentication(ref msg) => {
                tracing::warn!("Authentication failed: {}", msg);
                (StatusCode::UNAUTHORIZED, msg.clone())
            }

            AppError::Unauthorized => {
                tracing::warn!("Authorization failed");
                (StatusCode::FORBIDDEN, "Forbidden".to_string())
            }

            AppError::Validation(ref msg) => {
                tracing::debug!("Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }

            AppError::Encryption(ref msg) => {
                tracing::error!("Encryption error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Encryption error".to_string())
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = sonic_rs::to_string(&sonic_rs::json!({
            "error": message
        }))
        .unwrap_or_else(|_| r#"{"error":"Internal server error"}"#.to_string());

        (status, [(http::header::CONTENT_TYPE, "application/json")], body).into_response()
    }
}
