// ============================
// loginsec-backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Prefix of environment variables that override file settings
pub const ENV_PREFIX: &str = "LOGINSEC_";

/// Default access token lifetime (15 minutes)
pub const DEFAULT_ACCESS_TTL_SECS: u64 = 15 * 60;

/// Default refresh token lifetime (24 hours)
pub const DEFAULT_REFRESH_TTL_SECS: u64 = 24 * 60 * 60;

/// Minimum length of the token signing secret in bytes (HS256 key size)
pub const MIN_SECRET_LEN: usize = 32;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Directory holding identity and role records
    pub data_dir: PathBuf,
    /// Log level used when `RUST_LOG` is not set
    pub log_level: String,
    /// Roles that exist at startup
    pub roles: Vec<String>,
    /// Upper bound for every identity-store and refresh-store call
    pub store_timeout_ms: u64,
    /// Token signing and lifetimes
    pub token: TokenSettings,
    /// Refresh token store backend
    pub refresh_store: RefreshStoreSettings,
    /// Password hashing cost
    pub password_hash: PasswordHashSettings,
}

/// Token signing key and lifetimes
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenSettings {
    /// Process-wide HMAC secret
    pub secret: String,
    /// Access token lifetime in seconds
    pub access_ttl_secs: u64,
    /// Refresh token lifetime in seconds, also the refresh store TTL and cookie max-age
    pub refresh_ttl_secs: u64,
    /// Mark the refresh cookie `Secure` (HTTPS only)
    pub cookie_secure: bool,
}

/// Which refresh store to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshStoreBackend {
    /// In-process map, lost on restart
    Memory,
    /// External Redis instance
    Redis,
}

/// Refresh store connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshStoreSettings {
    pub backend: RefreshStoreBackend,
    pub redis_url: String,
    /// Purge interval of the in-memory store
    pub cleanup_interval_secs: u64,
}

/// scrypt cost parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordHashSettings {
    /// CPU/memory cost as a power of two
    pub log_n: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            data_dir: PathBuf::from("data"),
            log_level: "info".to_string(),
            roles: vec!["USER".to_string(), "ADMIN".to_string()],
            store_timeout_ms: 2_000,
            token: TokenSettings::default(),
            refresh_store: RefreshStoreSettings::default(),
            password_hash: PasswordHashSettings::default(),
        }
    }
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            secret: String::new(),
            access_ttl_secs: DEFAULT_ACCESS_TTL_SECS,
            refresh_ttl_secs: DEFAULT_REFRESH_TTL_SECS,
            cookie_secure: false,
        }
    }
}

// never print the secret
impl fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSettings")
            .field("secret", &"<redacted>")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}

impl Default for RefreshStoreSettings {
    fn default() -> Self {
        Self {
            backend: RefreshStoreBackend::Memory,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            cleanup_interval_secs: 60,
        }
    }
}

impl Default for PasswordHashSettings {
    fn default() -> Self {
        Self { log_n: 15 }
    }
}

impl TokenSettings {
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_ttl_secs)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_ttl_secs)
    }
}

impl Settings {
    /// Load settings from `config.toml` in the working directory and the environment
    pub fn load() -> Result<Self> {
        Self::load_from("config.toml")
    }

    /// Load settings from the given TOML file (missing file is fine) and the environment.
    ///
    /// Later sources win: defaults, then the file, then `LOGINSEC_*` variables.
    /// Nested keys use a double underscore, e.g. `LOGINSEC_TOKEN__SECRET`.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check the settings for values the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            bail!("invalid log level: {}", self.log_level);
        }
        if self.token.secret.len() < MIN_SECRET_LEN {
            bail!("token secret must be at least {MIN_SECRET_LEN} bytes");
        }
        if self.token.access_ttl_secs == 0 {
            bail!("access token lifetime must be positive");
        }
        if self.token.refresh_ttl_secs <= self.token.access_ttl_secs {
            bail!("refresh token lifetime must exceed the access token lifetime");
        }
        if self.roles.is_empty() {
            bail!("at least one role must be configured");
        }
        if self.store_timeout_ms == 0 {
            bail!("store timeout must be positive");
        }
        if !(10..=20).contains(&self.password_hash.log_n) {
            bail!("password_hash.log_n must be between 10 and 20");
        }
        if self.refresh_store.backend == RefreshStoreBackend::Redis
            && self.refresh_store.redis_url.is_empty()
        {
            bail!("redis_url is required for the redis refresh store");
        }
        Ok(())
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}
