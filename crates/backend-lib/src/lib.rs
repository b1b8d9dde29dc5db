// ============================
// loginsec-backend-lib/src/lib.rs
// ============================
//! Core of the login/session backend: token lifecycle and request authentication.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod storage;
pub mod validation;

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::auth::{
    AuthService, DefaultAuth, HashCost, MemoryRefreshStore, RedisRefreshStore, RefreshTokenStore,
    TokenService,
};
use crate::config::{RefreshStoreBackend, Settings};
use crate::error::{with_timeout, AppError};
use crate::storage::{FlatFileStorage, IdentityStore};

pub use router::create_router;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Session orchestrator
    pub auth: Arc<dyn AuthService>,
    /// Token issuing and validation
    pub tokens: Arc<TokenService>,
    /// Identity persistence
    pub identities: Arc<dyn IdentityStore>,
    /// Username -> current refresh token
    pub refresh_store: Arc<dyn RefreshTokenStore>,
    /// Settings the state was built from
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Create a new application state from already constructed stores
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        refresh_store: Arc<dyn RefreshTokenStore>,
        settings: Settings,
    ) -> Result<Self, AppError> {
        let tokens = Arc::new(TokenService::from_settings(&settings.token)?);
        let auth = Arc::new(DefaultAuth::new(
            tokens.clone(),
            identities.clone(),
            refresh_store.clone(),
            HashCost {
                log_n: settings.password_hash.log_n,
            },
            settings.store_timeout(),
        )?);

        Ok(Self {
            auth,
            tokens,
            identities,
            refresh_store,
            settings: Arc::new(settings),
        })
    }

    /// Build the stores described by `settings`, seed the configured roles and create the state
    pub async fn from_settings(settings: Settings) -> anyhow::Result<Self> {
        let storage = FlatFileStorage::new(&settings.data_dir)?;
        storage.seed_roles(settings.roles.iter().cloned()).await?;
        info!(data_dir = %settings.data_dir.display(), roles = ?settings.roles, "identity store ready");

        let refresh_store: Arc<dyn RefreshTokenStore> = match settings.refresh_store.backend {
            RefreshStoreBackend::Memory => {
                let store = MemoryRefreshStore::new();
                store.spawn_cleanup(Duration::from_secs(
                    settings.refresh_store.cleanup_interval_secs.max(1),
                ));
                info!("using in-memory refresh store");
                Arc::new(store)
            },
            RefreshStoreBackend::Redis => {
                let store = with_timeout(
                    "redis connect",
                    settings.store_timeout(),
                    RedisRefreshStore::connect(&settings.refresh_store.redis_url),
                )
                .await?;
                info!("connected to redis refresh store");
                Arc::new(store)
            },
        };

        Ok(Self::new(Arc::new(storage), refresh_store, settings)?)
    }
}
