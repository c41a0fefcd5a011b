use http::{Method, HeaderValue, header};
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use meetup_csrf::{
    config::{Config, StoreBackend},
    middleware_layer::csrf::CSRF_HEADER,
    repositories::{memory::MemoryTokenRepository, redis::RedisTokenRepository, token::TokenRepository},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    tracing::info!("✅ Configuration loaded successfully");

    match config.store_backend {
        StoreBackend::Redis => {
            let repository = RedisTokenRepository::connect(&config.redis_url).await?;
            tracing::info!("✅ Redis Connection Manager initialized (pooled)");
            serve(config, repository).await
        }
        StoreBackend::Memory => {
            tracing::warn!("⚠️ Using in-memory token repository; state is lost on restart");
            serve(config, MemoryTokenRepository::new()).await
        }
    }
}

async fn serve<R: TokenRepository>(config: Config, repository: R) -> anyhow::Result<()> {
    let state = AppState::new(&config, repository)?;
    tracing::info!("✅ AppState initialized");

    let origins = config
        .allowed_origins
        .iter()
        .map(|o| o.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()?;

    let csrf_header = header::HeaderName::from_static(CSRF_HEADER);

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::COOKIE,
            csrf_header.clone(),
        ])
        .allow_credentials(true)
        .expose_headers([csrf_header])
        .max_age(Duration::from_secs(86400));

    let app = meetup_csrf::router(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("🚀 Server listening on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
