use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderValue, Method},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension,
};
use chrono::Utc;

use crate::{
    error::AppError,
    models::session::SessionId,
    repositories::token::TokenRepository,
    services::csrf as csrf_service,
    state::AppState,
    validation::csrf::validate_token,
};

/// Header carrying CSRF tokens in both directions.
pub const CSRF_HEADER: &str = "x-csrf-token";

fn is_safe(method: &Method) -> bool {
    method == Method::GET || method == Method::HEAD || method == Method::OPTIONS
}

/// A middleware that issues and verifies CSRF tokens.
///
/// Safe methods get a fresh token for the current session in the
/// `x-csrf-token` response header. Every other method must present a token
/// in the same request header; it is consumed on success. Must run after
/// `require_session`.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `session_id` - The session resolved by `require_session`.
/// * `req` - The incoming request.
/// * `next` - The next middleware in the chain.
///
/// # Returns
///
/// A `Response`.
pub async fn verify_csrf<R: TokenRepository>(
    State(state): State<AppState<R>>,
    Extension(session_id): Extension<SessionId>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let session = session_id.to_string();

    if is_safe(req.method()) {
        let mut response = next.run(req).await;

        let token = match csrf_service::create_token(state.csrf.as_ref(), &session, Utc::now().timestamp()) {
            Ok(token) => token,
            Err(e) => return e.into_response(),
        };
        match HeaderValue::from_str(&token) {
            Ok(value) => {
                response.headers_mut().insert(CSRF_HEADER, value);
            }
            Err(e) => {
                return AppError::Internal(format!("CSRF header encoding failed: {}", e))
                    .into_response();
            }
        }
        return response;
    }

    let token = match req.headers().get(CSRF_HEADER).map(|v| v.to_str()) {
        Some(Ok(t)) => t.to_string(),
        Some(Err(_)) => {
            tracing::warn!("❌ CSRF: Header com formato inválido");
            return AppError::Authentication("Invalid CSRF token format".to_string())
                .into_response();
        }
        None => {
            tracing::warn!("❌ CSRF: Header x-csrf-token não encontrado");
            return AppError::Authentication("Missing CSRF token header".to_string())
                .into_response();
        }
    };

    if validate_token(&token).is_err() {
        tracing::warn!("❌ CSRF: token vazio ou grande demais");
        return AppError::Unauthorized.into_response();
    }

    match csrf_service::check_token(state.csrf.as_ref(), &session, &token).await {
        Ok(true) => next.run(req).await,
        Ok(false) => AppError::Unauthorized.into_response(),
        Err(e) => e.into_response(),
    }
}
