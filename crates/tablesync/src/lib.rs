//! # tablesync
//!
//! Live game-state synchronization for poker table UIs.
//!
//! A [`SyncEngine`] subscribes to one table on a game-state publisher over
//! WebSocket and keeps a [`Snapshot`] of it up to date: the game state,
//! the table's format and variant, loading and error flags, and the action
//! the server says is pending. Player actions go back out through
//! [`SyncEngine::send_action`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tablesync::prelude::*;
//!
//! # async fn run() -> Result<(), EngineError> {
//! let engine = SyncEngine::websocket(
//!     EngineConfig::from_env()?,
//!     FileIdentityStore::new("identity.json"),
//!     StaticSignature::new("0xdev"),
//! );
//! engine.subscribe("0xtable").await?;
//!
//! let mut updates = engine.watch();
//! while updates.changed().await.is_ok() {
//!     let snap = updates.borrow_and_update().clone();
//!     println!("{:?} loading={}", snap.phase, snap.is_loading);
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod engine;
mod error;

pub use config::{EngineConfig, WATCHDOG_MS_VAR, WS_URL_VAR};
pub use engine::{SyncEngine, SyncEngineBuilder};
pub use error::EngineError;

pub use tablesync_protocol::{
    GameOptions, GameState, PlayerAddress, SeatedPlayer, TableId,
    ValidationError,
};
pub use tablesync_session::{
    AuthProvider, FileIdentityStore, IdentityStore, MemoryIdentity,
    PendingAction, PlayerIdentity, SessionError, SessionPhase, SignedAuth,
    Snapshot, StaticSignature, SyncError,
};

/// Everything a typical consumer needs.
pub mod prelude {
    pub use crate::{
        AuthProvider, EngineConfig, EngineError, FileIdentityStore,
        IdentityStore, MemoryIdentity, PlayerIdentity, SessionPhase, Snapshot,
        StaticSignature, SyncEngine, SyncError, TableId,
    };
}
