//! Optimistic overlay: the one action the server says is in flight.
//!
//! The overlay is filled only by the server's `pending` echo, never by the
//! local send, so what the UI shows as "pending" is always something the
//! publisher has actually seen.

use std::time::SystemTime;

use tablesync_protocol::PendingNotice;

/// An action the server reported as pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAction {
    pub game_id: String,
    pub actor: String,
    pub action: String,
    pub amount: Option<String>,
    /// When the `pending` frame was received locally.
    pub received_at: SystemTime,
}

impl PendingAction {
    /// Stamps `notice` with the current wall-clock time.
    pub fn received(notice: PendingNotice) -> Self {
        Self {
            game_id: notice.game_id,
            actor: notice.actor,
            action: notice.action,
            amount: notice.amount,
            received_at: SystemTime::now(),
        }
    }
}

/// Zero-or-one pending action.
#[derive(Debug, Default)]
pub(crate) struct PendingOverlay {
    current: Option<PendingAction>,
}

impl PendingOverlay {
    /// Replaces whatever was pending.
    pub(crate) fn set(&mut self, action: PendingAction) {
        if let Some(previous) = self.current.replace(action) {
            tracing::debug!(action = %previous.action, "pending action superseded");
        }
    }

    pub(crate) fn clear(&mut self) {
        self.current = None;
    }

    pub(crate) fn current(&self) -> Option<&PendingAction> {
        self.current.as_ref()
    }
}
