use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use tower_cookies::{Cookies, Cookie};
use tower_cookies::cookie::time::Duration;

use crate::{
    error::Result,
    handlers::csrf::StatusResponse,
    middleware_layer::auth::SESSION_COOKIE,
    models::session::SessionId,
    repositories::token::TokenRepository,
    services::session as session_service,
    state::AppState,
};

/// Creates a secure cookie with the given name, value, and max age.
fn create_secure_cookie(name: &'static str, value: String, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);

    cookie.set_http_only(true);
    if secure {
        cookie.set_secure(true);
    }

    cookie.set_same_site(tower_cookies::cookie::SameSite::Lax);
    cookie.set_max_age(Duration::seconds(max_age_secs));
    cookie.set_path("/");

    cookie
}

/// Starts a new session and sets the `session_id` cookie.
pub async fn start<R: TokenRepository>(
    State(state): State<AppState<R>>,
    cookies: Cookies,
) -> Result<Response> {
    let ttl = state.session.ttl_seconds();
    let session_id = session_service::start_session(&state.repository, ttl).await?;

    cookies.add(create_secure_cookie(
        SESSION_COOKIE,
        session_id.to_string(),
        i64::try_from(ttl).unwrap_or(i64::MAX),
        state.session.secure_cookies,
    ));
    tracing::info!("✅ Session cookie added: session_id={}", session_id);

    let response = StatusResponse {
        success: true,
        message: "Session started".to_string(),
    };

    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// Ends the current session and clears its cookie.
pub async fn end<R: TokenRepository>(
    State(state): State<AppState<R>>,
    Extension(session_id): Extension<SessionId>,
    cookies: Cookies,
) -> Result<Response> {
    session_service::end_session(&state.repository, &session_id).await?;

    let mut session_cookie = Cookie::new(SESSION_COOKIE, "");
    session_cookie.set_max_age(Duration::seconds(0));
    session_cookie.set_path("/");
    cookies.remove(session_cookie);

    let response = StatusResponse {
        success: true,
        message: "Session ended".to_string(),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}
