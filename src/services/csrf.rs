use crate::crypto::csrf::CsrfEngine;
use crate::error::{AppError, CsrfError, Result};
use crate::repositories::token::TokenRepository;

fn prefix(token: &str) -> &str {
    token.get(..20).unwrap_or(token)
}

/// Mints a CSRF token for a session.
///
/// # Arguments
///
/// * `engine` - The CSRF engine.
/// * `session_id` - The caller's session.
/// * `timestamp` - Issue time in unix seconds.
///
/// # Returns
///
/// The token, or `AppError::Encryption` on an internal crypto failure.
pub fn create_token<R: TokenRepository>(
    engine: &CsrfEngine<R>,
    session_id: &str,
    timestamp: i64,
) -> Result<String> {
    let token = engine
        .create(session_id, timestamp)
        .map_err(|e| AppError::Encryption(e.to_string()))?;

    tracing::debug!("🔐 Generated CSRF token: {}...", prefix(&token));
    Ok(token)
}

/// Checks a client-supplied CSRF token.
///
/// Expired and malformed tokens are reported as `Ok(false)`; only backing
/// store failures surface as errors.
pub async fn check_token<R: TokenRepository>(
    engine: &CsrfEngine<R>,
    session_id: &str,
    token: &str,
) -> Result<bool> {
    match engine.check(session_id, token).await {
        Ok(true) => {
            tracing::debug!("✅ CSRF token accepted: {}...", prefix(token));
            Ok(true)
        }
        Ok(false) => {
            tracing::warn!("❌ CSRF token rejected (wrong session or already used)");
            Ok(false)
        }
        Err(CsrfError::Expired) => {
            tracing::warn!("❌ CSRF token expired");
            Ok(false)
        }
        Err(CsrfError::MalformedToken) => {
            tracing::warn!("❌ CSRF token malformed or forged");
            Ok(false)
        }
        Err(CsrfError::Store(e)) => Err(AppError::Store(e)),
        Err(e) => Err(AppError::Encryption(e.to_string())),
    }
}
