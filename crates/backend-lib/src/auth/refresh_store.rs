// ============================
// loginsec-backend-lib/src/auth/refresh_store.rs
// ============================
//! Refresh token store: username -> the single currently valid refresh token.
//!
//! Writes are unconditional overwrites (last writer wins). A new login or
//! reissue therefore invalidates whatever refresh token the user held before.
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use redis::{aio::ConnectionManager, AsyncCommands};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::AppError;

/// Key-value store with native expiry
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Store `token` for `username`, replacing any previous one
    async fn put(&self, username: &str, token: &str, ttl: Duration) -> Result<(), AppError>;

    /// Currently stored token, if any and not yet expired
    async fn get(&self, username: &str) -> Result<Option<String>, AppError>;

    /// Remove the entry; removing a missing entry is not an error
    async fn delete(&self, username: &str) -> Result<(), AppError>;
}

#[derive(Debug, Clone)]
struct Entry {
    token: String,
    expires_at: Instant,
}

/// In-process store, used in tests and single-node deployments
#[derive(Clone, Default)]
pub struct MemoryRefreshStore {
    entries: Arc<DashMap<String, Entry>>,
}

impl MemoryRefreshStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries, expired ones included until the next purge
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired entry and return how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| now < entry.expires_at);
        before.saturating_sub(self.entries.len())
    }

    /// Spawn the periodic purge task
    pub fn spawn_cleanup(&self, interval: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let removed = store.purge_expired();
                if removed > 0 {
                    debug!(removed, "purged expired refresh tokens");
                }
            }
        })
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryRefreshStore {
    async fn put(&self, username: &str, token: &str, ttl: Duration) -> Result<(), AppError> {
        self.entries.insert(
            username.to_string(),
            Entry {
                token: token.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, username: &str) -> Result<Option<String>, AppError> {
        let Some(entry) = self.entries.get(username).map(|e| e.clone()) else {
            return Ok(None);
        };

        if Instant::now() < entry.expires_at {
            Ok(Some(entry.token))
        } else {
            // only remove the entry we saw; a concurrent put may have replaced it
            self.entries
                .remove_if(username, |_, current| current.expires_at == entry.expires_at);
            Ok(None)
        }
    }

    async fn delete(&self, username: &str) -> Result<(), AppError> {
        self.entries.remove(username);
        Ok(())
    }
}

/// Redis-backed store. Key is the plain username, value the token, TTL via `SET .. EX`.
#[derive(Clone)]
pub struct RedisRefreshStore {
    conn: ConnectionManager,
}

impl RedisRefreshStore {
    /// Connect to Redis; the connection manager reconnects on its own afterwards
    pub async fn connect(url: &str) -> Result<Self, AppError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl RefreshTokenStore for RedisRefreshStore {
    async fn put(&self, username: &str, token: &str, ttl: Duration) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        // Redis rejects EX 0
        let secs = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(username, token, secs).await?;
        Ok(())
    }

    async fn get(&self, username: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.conn.clone();
        let token: Option<String> = conn.get(username).await?;
        Ok(token)
    }

    async fn delete(&self, username: &str) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(username).await?;
        Ok(())
    }
}
