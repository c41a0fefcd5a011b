use std::env;
use std::net::SocketAddr;
use anyhow::{Context, Result};
use zeroize::{Zeroize, Zeroizing};

/// Which token repository backs sessions and replay records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// Token repository backend.
    pub store_backend: StoreBackend,
    /// The URL of the Redis server.
    pub redis_url: String,
    /// The duration of a session in days.
    pub session_duration_days: i64,
    /// AES key for CSRF tokens (16, 24 or 32 bytes).
    pub csrf_secret: Zeroizing<Vec<u8>>,
    /// CSRF token lifetime in seconds.
    pub csrf_expire_seconds: i64,
    /// Origins allowed by CORS.
    pub allowed_origins: Vec<String>,
    /// Whether cookies get the `Secure` flag.
    pub production: bool,
}

/// Longest accepted CSRF token lifetime (30 days).
pub const MAX_CSRF_EXPIRE_SECONDS: i64 = 30 * 86400;

/// Longest accepted session lifetime in days.
pub const MAX_SESSION_DURATION_DAYS: i64 = 365;

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Creates a new `Config`, reading each variable through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let mut secret_hex = lookup("CSRF_SECRET")
            .context("CSRF_SECRET must be set (generate with: openssl rand -hex 32)")?;

        let secret_bytes = hex::decode(secret_hex.trim())
            .context("CSRF_SECRET must be valid hexadecimal");

        secret_hex.zeroize();
        let secret_bytes = Zeroizing::new(secret_bytes?);

        if !matches!(secret_bytes.len(), 16 | 24 | 32) {
            anyhow::bail!("CSRF_SECRET must be 16, 24 or 32 bytes (32, 48 or 64 hex characters)");
        }

        let csrf_expire_seconds: i64 = var("CSRF_EXPIRE_SECONDS", "3600")
            .parse()
            .context("Invalid CSRF_EXPIRE_SECONDS")?;
        if !(1..=MAX_CSRF_EXPIRE_SECONDS).contains(&csrf_expire_seconds) {
            anyhow::bail!(
                "CSRF_EXPIRE_SECONDS must be between 1 and {}",
                MAX_CSRF_EXPIRE_SECONDS
            );
        }

        let session_duration_days: i64 = var("SESSION_DURATION_DAYS", "7")
            .parse()
            .context("Invalid SESSION_DURATION_DAYS")?;
        if !(1..=MAX_SESSION_DURATION_DAYS).contains(&session_duration_days) {
            anyhow::bail!(
                "SESSION_DURATION_DAYS must be between 1 and {}",
                MAX_SESSION_DURATION_DAYS
            );
        }

        let store_backend = match var("STORE_BACKEND", "redis").to_ascii_lowercase().as_str() {
            "redis" => StoreBackend::Redis,
            "memory" => StoreBackend::Memory,
            other => anyhow::bail!("Unknown STORE_BACKEND: {}", other),
        };

        let allowed_origins = var("ALLOWED_ORIGINS", "http://localhost:3000")
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        Ok(Self {
            bind_addr: var("BIND_ADDR", "127.0.0.1:3000")
                .parse()
                .context("Invalid BIND_ADDR")?,
            store_backend,
            redis_url: var("REDIS_URL", "redis://127.0.0.1:6379"),
            session_duration_days,
            csrf_secret: secret_bytes,
            csrf_expire_seconds,
            allowed_origins,
            production: var("APP_ENV", "development") == "production",
        })
    }
}
