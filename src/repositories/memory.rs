use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::StoreError;
use crate::repositories::token::{Lookup, TokenRepository};

/// Map size below which writes never sweep.
const MIN_SWEEP_LEN: usize = 1024;

#[derive(Default)]
struct Entries {
    deadlines: HashMap<String, Instant>,
    /// Length at which the next write sweeps expired entries.
    sweep_at: usize,
}

impl Entries {
    fn is_live(&self, key: &str, now: Instant) -> bool {
        matches!(self.deadlines.get(key), Some(deadline) if *deadline > now)
    }

    /// Sweeps once the map has doubled since the last sweep, keeping writes
    /// amortized O(1).
    fn maybe_sweep(&mut self, now: Instant) {
        if self.deadlines.len() < self.sweep_at {
            return;
        }
        self.deadlines.retain(|_, deadline| *deadline > now);
        self.sweep_at = (self.deadlines.len() * 2).max(MIN_SWEEP_LEN);
    }

    fn insert(&mut self, key: &str, ttl_seconds: u64, now: Instant) -> Result<(), StoreError> {
        let deadline = now
            .checked_add(Duration::from_secs(ttl_seconds))
            .ok_or_else(|| StoreError::Backend(format!("TTL of {}s is out of range", ttl_seconds)))?;
        self.maybe_sweep(now);
        self.deadlines.insert(key.to_string(), deadline);
        Ok(())
    }
}

/// Process-local [`TokenRepository`].
///
/// Entries carry a deadline on the tokio clock, so `tokio::time::pause` and
/// `advance` drive expiry in tests. Expired entries read as absent and are
/// swept when the map grows.
#[derive(Clone, Default)]
pub struct MemoryTokenRepository {
    entries: Arc<Mutex<Entries>>,
}

impl MemoryTokenRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .await
            .deadlines
            .values()
            .filter(|deadline| **deadline > now)
            .count()
    }

    /// Whether no live entries remain.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl TokenRepository for MemoryTokenRepository {
    async fn add(&self, key: &str, ttl_seconds: u64) -> Result<(), StoreError> {
        let now = Instant::now();
        self.entries.lock().await.insert(key, ttl_seconds, now)
    }

    async fn validate(&self, key: &str) -> Result<Lookup, StoreError> {
        let now = Instant::now();
        let entries = self.entries.lock().await;
        Ok(if entries.is_live(key, now) { Lookup::Exists } else { Lookup::NotFound })
    }

    async fn add_if_absent(&self, key: &str, ttl_seconds: u64) -> Result<bool, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        if entries.is_live(key, now) {
            return Ok(false);
        }
        entries.insert(key, ttl_seconds, now)?;
        Ok(true)
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().await.deadlines.remove(key);
        Ok(())
    }
}
