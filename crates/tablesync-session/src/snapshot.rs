//! The read-only view consumers render from.

use std::time::Duration;

use tablesync_protocol::{GameState, ServerError, TableId, ValidationError};

use crate::{PendingAction, SessionPhase};

/// Everything the engine knows about the subscribed table, as one value.
///
/// Snapshots are published whole, so a consumer never sees a merge that is
/// only half applied.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub game_state: Option<GameState>,
    pub format: Option<String>,
    pub variant: Option<String>,
    pub is_loading: bool,
    pub error: Option<SyncError>,
    /// Set when the last state update was incomplete. Never blocks the
    /// merge; `game_state` still holds what arrived.
    pub validation_error: Option<ValidationError>,
    pub pending_action: Option<PendingAction>,
    pub table_id: Option<TableId>,
    pub phase: SessionPhase,
}

impl Snapshot {
    /// The empty, loading view for a fresh subscription to `table_id`.
    pub(crate) fn loading(table_id: TableId) -> Self {
        Self {
            is_loading: true,
            table_id: Some(table_id),
            ..Self::default()
        }
    }

    /// The empty view after the session is torn down.
    pub(crate) fn closed() -> Self {
        Self {
            phase: SessionPhase::Closed,
            ..Self::default()
        }
    }

    /// `true` once the first frame of the session has arrived.
    pub fn is_live(&self) -> bool {
        self.phase == SessionPhase::Live
    }
}

/// The error slot of a [`Snapshot`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    #[error("no player identity is stored locally; sign in first")]
    MissingIdentity,

    #[error("no game server endpoint is configured")]
    MissingEndpoint,

    #[error("could not sign the subscription: {0}")]
    Auth(String),

    #[error("connection error: {0}")]
    Transport(String),

    #[error("could not encode subscription frame: {0}")]
    Protocol(String),

    /// Nothing arrived within the watchdog budget after subscribing.
    #[error("game server is not responding (nothing received within {timeout:?})")]
    ServerNotResponding { timeout: Duration },

    /// An error frame from the publisher.
    #[error("{message}")]
    Server {
        code: Option<String>,
        message: String,
        suggestion: Option<String>,
    },
}

impl From<ServerError> for SyncError {
    fn from(err: ServerError) -> Self {
        SyncError::Server {
            code: err.code,
            message: err.message,
            suggestion: err.suggestion,
        }
    }
}
