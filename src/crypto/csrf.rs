use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::crypto::aes::TokenCipher;
use crate::error::CsrfError;
use crate::repositories::token::{Lookup, TokenRepository};

/// Namespace for replay records in the token repository.
const REPLAY_KEY_PREFIX: &str = "csrf:";

/// How far ahead of `now` a token's timestamp may be before it is rejected.
pub const MAX_CLOCK_SKEW_SECONDS: i64 = 60;

/// The payload sealed inside every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct TokenMeta {
    session_id: String,
    timestamp: i64,
}

/// Issues and verifies single-use, session-bound CSRF tokens.
///
/// A token is `base64(nonce || AES-GCM(json{session_id, timestamp}))`. The
/// envelope makes it unforgeable; the repository makes it single-use. The
/// engine holds no mutable state and never logs.
#[derive(Clone)]
pub struct CsrfEngine<R> {
    cipher: TokenCipher,
    expire_seconds: i64,
    repository: R,
}

impl<R: TokenRepository> CsrfEngine<R> {
    /// Creates a new `CsrfEngine`.
    ///
    /// # Arguments
    ///
    /// * `secret` - 16, 24 or 32 byte AES key.
    /// * `expire_seconds` - Token lifetime; replay records live no longer than the token.
    /// * `repository` - Where consumed tokens are recorded.
    ///
    /// # Returns
    ///
    /// `CsrfError::InvalidKey` if the secret cannot key the cipher.
    pub fn new(secret: &[u8], expire_seconds: i64, repository: R) -> Result<Self, CsrfError> {
        Ok(Self {
            cipher: TokenCipher::new(secret)?,
            expire_seconds,
            repository,
        })
    }

    /// Mints a token for `session_id` stamped with `timestamp` (unix seconds).
    ///
    /// Every call uses a fresh nonce, so identical inputs never produce the
    /// same token.
    pub fn create(&self, session_id: &str, timestamp: i64) -> Result<String, CsrfError> {
        let meta = TokenMeta {
            session_id: session_id.to_string(),
            timestamp,
        };
        let payload = sonic_rs::to_vec(&meta)
            .map_err(|e| CsrfError::CryptoFailure(format!("Token serialization failed: {}", e)))?;

        let sealed = self.cipher.seal(&payload)?;
        Ok(general_purpose::STANDARD.encode(sealed))
    }

    /// Checks `token` against `session_id` at the current wall-clock time.
    pub async fn check(&self, session_id: &str, token: &str) -> Result<bool, CsrfError> {
        self.check_at(session_id, token, chrono::Utc::now().timestamp())
            .await
    }

    /// Checks `token` against `session_id` as if the time were `now`.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - valid; the token is now recorded as spent.
    /// * `Ok(false)` - issued for another session, or already spent.
    /// * `Err(CsrfError::Expired)` - older than the expiry window.
    /// * `Err(CsrfError::MalformedToken)` - undecodable, failed authentication,
    ///   or stamped more than `MAX_CLOCK_SKEW_SECONDS` in the future.
    /// * `Err(CsrfError::Store(_))` - the repository failed.
    pub async fn check_at(&self, session_id: &str, token: &str, now: i64) -> Result<bool, CsrfError> {
        let sealed = general_purpose::STANDARD
            .decode(token)
            .map_err(|_| CsrfError::MalformedToken)?;
        let payload = self.cipher.open(&sealed)?;
        let meta: TokenMeta =
            sonic_rs::from_slice(&payload).map_err(|_| CsrfError::MalformedToken)?;

        if meta.timestamp.saturating_sub(now) > MAX_CLOCK_SKEW_SECONDS {
            return Err(CsrfError::MalformedToken);
        }
        if now.saturating_sub(meta.timestamp) > self.expire_seconds {
            return Err(CsrfError::Expired);
        }

        if !bool::from(meta.session_id.as_bytes().ct_eq(session_id.as_bytes())) {
            return Ok(false);
        }

        let key = format!("{}{}", REPLAY_KEY_PREFIX, token);
        if self.repository.validate(&key).await? == Lookup::Exists {
            return Ok(false);
        }

        // Two requests can both pass the lookup above; only one wins the claim.
        let claimed = self
            .repository
            .add_if_absent(&key, self.replay_ttl(meta.timestamp, now))
            .await?;
        Ok(claimed)
    }

    /// Seconds until the token itself expires, so the replay record never
    /// dies while the token could still pass the expiry check.
    fn replay_ttl(&self, timestamp: i64, now: i64) -> u64 {
        let remaining = timestamp
            .saturating_add(self.expire_seconds)
            .saturating_sub(now);
        u64::try_from(remaining).unwrap_or(0).max(1)
    }
}
