use crate::error::{AppError, Result};

/// Longest session id accepted at the HTTP boundary.
const MAX_SESSION_ID_LEN: usize = 255;

/// Longest token accepted at the HTTP boundary.
const MAX_TOKEN_LEN: usize = 4096;

/// Validates a session identifier supplied to the CSRF endpoints.
///
/// # Arguments
///
/// * `session_id` - The session identifier to validate.
///
/// # Returns
///
/// A `Result<()>` indicating whether the session identifier is valid.
pub fn validate_session_id(session_id: &str) -> Result<()> {
    if session_id.trim().is_empty() {
        return Err(AppError::Validation(
            "Session id cannot be empty".to_string(),
        ));
    }

    if session_id.len() > MAX_SESSION_ID_LEN {
        return Err(AppError::Validation(
            "Session id must be at most 255 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validates the size of a client-supplied token.
///
/// Content is not inspected here; the engine rejects malformed tokens.
pub fn validate_token(token: &str) -> Result<()> {
    if token.is_empty() {
        return Err(AppError::Validation("Token cannot be empty".to_string()));
    }

    if token.len() > MAX_TOKEN_LEN {
        return Err(AppError::Validation("Token is too long".to_string()));
    }

    Ok(())
}
