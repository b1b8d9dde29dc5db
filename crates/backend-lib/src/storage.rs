// ============================
// loginsec-backend-lib/src/storage.rs
// ============================
//! Identity storage abstraction with flat-file implementation.
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::{fs as tokio_fs, io::AsyncWriteExt, sync::Mutex};
use uuid::Uuid;

use crate::error::AppError;
use crate::validation::validate_username;

/// A named role that can be assigned to identities
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Role {
    pub name: String,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A stored account
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Unique account name
    pub username: String,
    /// scrypt PHC string
    pub password_hash: String,
    pub age: u32,
    pub role: Role,
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("username", &self.username)
            .field("age", &self.age)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Trait for identity storage backends
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Look up an identity by username
    async fn find_identity(&self, username: &str) -> Result<Option<Identity>, AppError>;

    /// Insert a new identity; fails with `UsernameTaken` if one already exists
    async fn insert_identity(&self, identity: &Identity) -> Result<(), AppError>;

    /// Look up a role by name
    async fn find_role(&self, name: &str) -> Result<Option<Role>, AppError>;

    /// Create a role if it does not exist yet
    async fn ensure_role(&self, role: &Role) -> Result<(), AppError>;
}

/// Flat-file implementation of the IdentityStore trait
///
/// Layout under the root directory:
/// * `users/<username>.json` - one file per identity
/// * `roles.json` - sorted list of roles
pub struct FlatFileStorage {
    root: PathBuf,
    roles_lock: Mutex<()>,
}

impl FlatFileStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(root.join("users"))?;
        Ok(Self {
            root,
            roles_lock: Mutex::new(()),
        })
    }

    /// Create every role in `names` that is missing
    pub async fn seed_roles<I, S>(&self, names: I) -> Result<(), AppError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.ensure_role(&Role::new(name)).await?;
        }
        Ok(())
    }

    fn identity_path(&self, username: &str) -> Option<PathBuf> {
        validate_username(username).ok()?;
        Some(self.root.join("users").join(format!("{username}.json")))
    }

    fn roles_path(&self) -> PathBuf {
        self.root.join("roles.json")
    }

    async fn read_roles(&self) -> Result<Vec<Role>, AppError> {
        match tokio_fs::read_to_string(self.roles_path()).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Write `bytes` to `staging`, then link it to `target`.
///
/// The target appears fully written or not at all. Linking fails with
/// `AlreadyExists` instead of replacing an existing target.
async fn publish_new(staging: &Path, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio_fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(staging)
        .await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);

    tokio_fs::hard_link(staging, target).await
}

#[async_trait]
impl IdentityStore for FlatFileStorage {
    async fn find_identity(&self, username: &str) -> Result<Option<Identity>, AppError> {
        // names that fail validation can never have been stored
        let Some(path) = self.identity_path(username) else {
            return Ok(None);
        };

        match tokio_fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn insert_identity(&self, identity: &Identity) -> Result<(), AppError> {
        let path = self
            .identity_path(&identity.username)
            .ok_or_else(|| AppError::Validation(format!("invalid username: {}", identity.username)))?;

        let json = serde_json::to_string_pretty(identity)?;

        // dot names are never valid usernames, so a staging file is never read as an identity
        let staging = self.root.join("users").join(format!(".{}.tmp", Uuid::new_v4()));
        let published = publish_new(&staging, &path, json.as_bytes()).await;
        let _ = tokio_fs::remove_file(&staging).await;

        match published {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(AppError::UsernameTaken(identity.username.clone()))
            },
            Err(e) => Err(e.into()),
        }
    }

    async fn find_role(&self, name: &str) -> Result<Option<Role>, AppError> {
        let roles = self.read_roles().await?;
        Ok(roles.into_iter().find(|r| r.name == name))
    }

    async fn ensure_role(&self, role: &Role) -> Result<(), AppError> {
        let _guard = self.roles_lock.lock().await;

        let mut roles = self.read_roles().await?;
        if roles.contains(role) {
            return Ok(());
        }
        roles.push(role.clone());
        roles.sort();

        let json = serde_json::to_string_pretty(&roles)?;
        tokio_fs::write(self.roles_path(), json).await?;
        Ok(())
    }
}
