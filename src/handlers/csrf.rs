use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    repositories::token::TokenRepository,
    services::csrf as csrf_service,
    state::AppState,
    validation::csrf::{validate_session_id, validate_token},
};

/// The request payload for minting a token.
#[derive(Deserialize, Debug)]
pub struct CreateTokenRequest {
    pub session_id: String,
    /// Issue time in unix seconds; defaults to now.
    pub timestamp: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CreateTokenResponse {
    pub token: String,
}

/// The request payload for checking a token.
#[derive(Deserialize)]
pub struct CheckTokenRequest {
    pub session_id: String,
    pub token: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CheckTokenResponse {
    pub valid: bool,
}

/// The response payload for endpoints with nothing else to say.
#[derive(Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub message: String,
}

/// Mints a CSRF token for an arbitrary session id.
pub async fn create<R: TokenRepository>(
    State(state): State<AppState<R>>,
    Json(payload): Json<CreateTokenRequest>,
) -> Result<Response> {
    validate_session_id(&payload.session_id)?;

    let timestamp = payload.timestamp.unwrap_or_else(|| Utc::now().timestamp());
    let token = csrf_service::create_token(state.csrf.as_ref(), &payload.session_id, timestamp)?;

    Ok((StatusCode::OK, Json(CreateTokenResponse { token })).into_response())
}

/// Checks and consumes a CSRF token.
///
/// Expired, forged and oversized tokens, and blank or oversized session ids,
/// all come back as `valid: false`.
pub async fn check<R: TokenRepository>(
    State(state): State<AppState<R>>,
    Json(payload): Json<CheckTokenRequest>,
) -> Result<Response> {
    let well_formed = validate_session_id(&payload.session_id).is_ok()
        && validate_token(&payload.token).is_ok();

    let valid = if well_formed {
        csrf_service::check_token(state.csrf.as_ref(), &payload.session_id, &payload.token).await?
    } else {
        tracing::debug!("CSRF check rejected at the boundary (bad session id or token size)");
        false
    };

    Ok((StatusCode::OK, Json(CheckTokenResponse { valid })).into_response())
}

/// Protected no-op; `verify_csrf` attaches a fresh token to its response.
pub async fn issue() -> Json<StatusResponse> {
    Json(StatusResponse {
        success: true,
        message: "CSRF token issued".to_string(),
    })
}
