//! Session layer for tablesync.
//!
//! This crate owns the lifecycle of one table subscription:
//!
//! 1. **Identity** — who the local player is ([`IdentityStore`] trait)
//! 2. **Signing** — proving it to the publisher ([`AuthProvider`] trait)
//! 3. **The session actor** — connecting, subscribing, watching for the
//!    first frame, and folding every inbound frame into a [`Snapshot`]
//!    ([`spawn_session`], [`SessionHandle`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Facade (above)          ← SyncEngine wraps a SessionHandle
//!     ↕
//! Session Layer (this)    ← phases, watchdog, overlay, snapshot
//!     ↕
//! Protocol Layer (below)  ← classify, validate, outbound frames
//! Transport Layer (below) ← Connector / Connection
//! ```

#![allow(async_fn_in_trait)]

mod actor;
mod auth;
mod error;
mod identity;
mod overlay;
mod session;
mod snapshot;
mod watchdog;

pub use actor::{SessionHandle, spawn_session};
pub use auth::{AuthProvider, SignedAuth, StaticSignature, unix_millis};
pub use error::SessionError;
pub use identity::{FileIdentityStore, IdentityStore, MemoryIdentity, PlayerIdentity};
pub use overlay::PendingAction;
pub use session::{Endpoint, SessionConfig, SessionPhase};
pub use snapshot::{Snapshot, SyncError};
