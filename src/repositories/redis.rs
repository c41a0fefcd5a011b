use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::error::StoreError;
use crate::repositories::token::{Lookup, TokenRepository};

/// Marker value stored under every key; only presence matters.
const PRESENT: &str = "1";

/// [`TokenRepository`] backed by Redis.
///
/// `add_if_absent` maps to `SET key 1 NX EX ttl`, so concurrent claims of the
/// same key are serialized by Redis.
#[derive(Clone)]
pub struct RedisTokenRepository {
    conn: ConnectionManager,
}

impl RedisTokenRepository {
    /// Creates a new `RedisTokenRepository` over a pooled connection manager.
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    /// Opens a connection manager for `redis_url`.
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::new(conn))
    }
}

impl TokenRepository for RedisTokenRepository {
    async fn add(&self, key: &str, ttl_seconds: u64) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, PRESENT, ttl_seconds).await?;
        Ok(())
    }

    async fn validate(&self, key: &str) -> Result<Lookup, StoreError> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(key).await?;
        Ok(if exists { Lookup::Exists } else { Lookup::NotFound })
    }

    async fn add_if_absent(&self, key: &str, ttl_seconds: u64) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(PRESENT)
            .arg("NX")
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }
}
