use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    models::session::SessionId,
    repositories::token::TokenRepository,
    services::session as session_service,
    state::AppState,
};

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "session_id";

/// Extracts the session token from the request cookies.
///
/// # Arguments
///
/// * `cookies` - The request cookies.
///
/// # Returns
///
/// An `Option` containing the session ID if found.
fn extract_session_token(cookies: &Cookies) -> Option<SessionId> {
    cookies
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
        .map(SessionId)
}

/// A middleware that requires a valid session to be present.
///
/// On success the `SessionId` is inserted into the request extensions.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `cookies` - The request cookies.
/// * `request` - The incoming request.
/// * `next` - The next middleware in the chain.
///
/// # Returns
///
/// A `Response` or an error `StatusCode`.
pub async fn require_session<R: TokenRepository>(
    State(state): State<AppState<R>>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    tracing::debug!("🔐 Checking session...");

    let session_id = extract_session_token(&cookies).ok_or_else(|| {
        tracing::warn!("❌ No session_id cookie found");
        StatusCode::FORBIDDEN
    })?;

    let exists = session_service::session_exists(&state.repository, &session_id)
        .await
        .map_err(|e| {
            tracing::error!("❌ Session lookup failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    if !exists {
        tracing::warn!("❌ Session expired or unknown: {}", session_id);
        return Err(StatusCode::FORBIDDEN);
    }

    tracing::debug!("✅ Session valid: {}", session_id);

    request.extensions_mut().insert(session_id);

    Ok(next.run(request).await)
}
