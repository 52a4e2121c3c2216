//! Error types for the session layer.

use tablesync_protocol::{ProtocolError, TableId};

/// Errors returned to callers of the session handle.
///
/// These are the synchronous, caller-facing failures: an action that could
/// not be sent, or an engine that is no longer running. Failures that
/// happen asynchronously (transport drops, server errors, watchdog) are
/// never returned from a call; they appear in the snapshot's error slot as
/// a [`SyncError`](crate::SyncError).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No player identity is stored locally.
    #[error("no player identity is stored locally")]
    MissingIdentity,

    /// No table is subscribed.
    #[error("not subscribed to a table")]
    NotSubscribed,

    /// A table is subscribed but its connection is not open (still
    /// connecting, or the transport failed).
    #[error("no open connection for table {0}")]
    NotConnected(TableId),

    /// The auth provider could not produce a signed payload.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// An outbound frame could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The session actor has shut down.
    #[error("session engine has stopped")]
    Stopped,
}
