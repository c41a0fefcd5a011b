use std::future::Future;

use crate::error::StoreError;

/// Result of looking a key up in a [`TokenRepository`].
///
/// Note the direction: `NotFound` is the good outcome for a CSRF token
/// (never consumed, still usable), `Exists` means it was already spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    NotFound,
    Exists,
}

/// A key/value store whose entries expire on their own.
///
/// Backs both the CSRF replay records (`csrf:<token>`) and issued sessions
/// (`session:<id>`). Implementations must keep an entry visible at least until
/// its TTL elapses.
pub trait TokenRepository: Clone + Send + Sync + 'static {
    /// Stores `key` with a TTL, overwriting any existing entry.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` only on backend failure.
    fn add(&self, key: &str, ttl_seconds: u64) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Reports whether `key` is currently present.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` only on backend failure.
    fn validate(&self, key: &str) -> impl Future<Output = Result<Lookup, StoreError>> + Send;

    /// Atomically stores `key` with a TTL unless it is already present.
    ///
    /// # Returns
    ///
    /// `true` if this call created the entry, `false` if it already existed.
    fn add_if_absent(
        &self,
        key: &str,
        ttl_seconds: u64,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Deletes `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}
