use crate::error::Result;
use crate::models::session::SessionId;
use crate::repositories::token::{Lookup, TokenRepository};

/// Issues a new session and records it for `ttl_seconds`.
pub async fn start_session<R: TokenRepository>(repository: &R, ttl_seconds: u64) -> Result<SessionId> {
    let session_id = SessionId::generate();
    repository.add(&session_id.storage_key(), ttl_seconds).await?;

    tracing::info!("✅ Session saved: session:{}", session_id);
    Ok(session_id)
}

/// Returns whether `session_id` is still recorded.
pub async fn session_exists<R: TokenRepository>(repository: &R, session_id: &SessionId) -> Result<bool> {
    let lookup = repository.validate(&session_id.storage_key()).await?;
    Ok(lookup == Lookup::Exists)
}

/// Removes a session record.
pub async fn end_session<R: TokenRepository>(repository: &R, session_id: &SessionId) -> Result<()> {
    repository.remove(&session_id.storage_key()).await?;

    tracing::info!("✅ Session deleted: session:{}", session_id);
    Ok(())
}
