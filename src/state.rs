use std::sync::Arc;
use crate::config::Config;
use crate::crypto::csrf::CsrfEngine;
use crate::error::CsrfError;
use crate::repositories::token::TokenRepository;

/// Settings the handlers need at request time.
#[derive(Clone, Debug)]
pub struct SessionSettings {
    /// The duration of a session in days.
    pub duration_days: i64,
    /// Whether cookies get the `Secure` flag.
    pub secure_cookies: bool,
}

impl SessionSettings {
    /// Session lifetime in seconds, used as the repository TTL.
    pub fn ttl_seconds(&self) -> u64 {
        u64::try_from(self.duration_days.saturating_mul(86400)).unwrap_or(0).max(1)
    }
}

/// The application's state.
///
/// Generic over the token repository so the same router runs against Redis
/// in production and the in-memory repository in tests.
#[derive(Clone)]
pub struct AppState<R> {
    /// The token repository shared by sessions and the CSRF engine.
    pub repository: R,
    /// The CSRF token engine.
    pub csrf: Arc<CsrfEngine<R>>,
    /// Session cookie settings.
    pub session: SessionSettings,
}

impl<R: TokenRepository> AppState<R> {
    /// Creates a new `AppState`.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    /// * `repository` - The token repository, already connected.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`, or `InvalidKey` if the CSRF secret is unusable.
    pub fn new(config: &Config, repository: R) -> Result<Self, CsrfError> {
        let csrf = CsrfEngine::new(
            &config.csrf_secret,
            config.csrf_expire_seconds,
            repository.clone(),
        )?;
        tracing::info!(
            "✅ CSRF engine initialized (expiry {}s)",
            config.csrf_expire_seconds
        );

        Ok(Self::from_parts(
            repository,
            csrf,
            SessionSettings {
                duration_days: config.session_duration_days,
                secure_cookies: config.production,
            },
        ))
    }

    /// Assembles state from an already-built engine.
    pub fn from_parts(repository: R, csrf: CsrfEngine<R>, session: SessionSettings) -> Self {
        Self {
            repository,
            csrf: Arc::new(csrf),
            session,
        }
    }
}
