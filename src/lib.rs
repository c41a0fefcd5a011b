use axum::{
    Router,
    routing::{get, post},
    middleware::from_fn_with_state,
};
use tower_cookies::CookieManagerLayer;
use tower_http::trace::{TraceLayer, DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, DefaultOnFailure};
use tracing::Level;

pub mod config;
pub mod error;
pub mod state;

pub mod crypto {
    pub mod aes;
    pub mod csrf;
}

pub mod models {
    pub mod session;
}

pub mod repositories {
    pub mod token;
    pub mod memory;
    pub mod redis;
}

pub mod services {
    pub mod csrf;
    pub mod session;
}

pub mod handlers {
    pub mod csrf;
    pub mod session;
}

pub mod middleware_layer {
    pub mod auth;
    pub mod csrf;
}

pub mod validation {
    pub mod csrf;
}

use repositories::token::TokenRepository;
use state::AppState;

/// Builds the application router.
///
/// `/api/csrf/create` and `/api/csrf/check` expose the token engine to other
/// services. The session routes are the in-process consumer: `GET /api/csrf`
/// hands out tokens and `POST /api/session/logout` requires one.
pub fn router<R: TokenRepository>(state: AppState<R>) -> Router {
    let token_routes = Router::new()
        .route("/api/csrf/create", post(handlers::csrf::create::<R>))
        .route("/api/csrf/check", post(handlers::csrf::check::<R>))
        .with_state(state.clone());

    let session_routes = Router::new()
        .route("/api/session", post(handlers::session::start::<R>))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/csrf", get(handlers::csrf::issue))
        .route("/api/session/logout", post(handlers::session::end::<R>))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::csrf::verify_csrf::<R>,
        ))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::auth::require_session::<R>,
        ))
        .with_state(state);

    Router::new()
        .merge(token_routes)
        .merge(session_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default())
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(CookieManagerLayer::new())
}
