//! Locally persisted player identity.
//!
//! The engine never creates an identity; it reads whatever the wallet/login
//! flow stored. The store is consulted on every `subscribe` and every
//! `send_action`, so signing out elsewhere takes effect immediately.
//!
//! Loading is async: the actor awaits it, and a store backed by disk or a
//! keychain must not block the runtime while it reads.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tablesync_protocol::PlayerAddress;

/// Who the local player is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerIdentity {
    pub player_address: PlayerAddress,
}

impl PlayerIdentity {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            player_address: PlayerAddress::new(address),
        }
    }
}

/// Read access to the locally persisted identity.
pub trait IdentityStore: Send + Sync + 'static {
    /// Returns the stored identity, or `None` if the player is signed out.
    fn load(&self) -> impl Future<Output = Option<PlayerIdentity>> + Send;
}

/// An in-process identity slot. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryIdentity {
    inner: Arc<RwLock<Option<PlayerIdentity>>>,
}

impl MemoryIdentity {
    /// A store that already holds `identity`.
    pub fn signed_in(identity: PlayerIdentity) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(identity))),
        }
    }

    /// A store with no identity.
    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn set(&self, identity: PlayerIdentity) {
        *self.write() = Some(identity);
    }

    pub fn clear(&self) {
        *self.write() = None;
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<PlayerIdentity>> {
        self.inner.write().unwrap_or_else(|p| p.into_inner())
    }
}

impl MemoryIdentity {
    /// The stored identity, read synchronously.
    pub fn get(&self) -> Option<PlayerIdentity> {
        self.inner
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

impl IdentityStore for MemoryIdentity {
    async fn load(&self) -> Option<PlayerIdentity> {
        self.get()
    }
}

/// Reads the identity from a JSON file such as
/// `{"playerAddress": "0x1f..."}`.
///
/// A missing file means "signed out". A file that exists but cannot be
/// parsed is logged and also treated as signed out. The file is read on
/// Tokio's blocking pool.
#[derive(Debug, Clone)]
pub struct FileIdentityStore {
    path: PathBuf,
}

impl FileIdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IdentityStore for FileIdentityStore {
    async fn load(&self) -> Option<PlayerIdentity> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "could not read identity file"
                );
                return None;
            }
        };
        parse_identity(&text).or_else(|| {
            tracing::warn!(
                path = %self.path.display(),
                "identity file has no usable playerAddress"
            );
            None
        })
    }
}

/// Parses a stored identity; an empty address counts as no identity.
fn parse_identity(text: &str) -> Option<PlayerIdentity> {
    let identity: PlayerIdentity = serde_json::from_str(text).ok()?;
    if identity.player_address.as_str().is_empty() {
        return None;
    }
    Some(identity)
}
