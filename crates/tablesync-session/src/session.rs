//! Session types: configuration, lifecycle phase, and the per-subscription
//! record the actor owns.
//!
//! A "session" is the client's record of one subscription. It tracks:
//! - WHICH table it is for (`TableId`)
//! - WHICH attempt it is (`generation`, bumped on every subscribe)
//! - the single live connection, its reader and writer tasks
//! - WHETHER anything has arrived yet, and the watchdog waiting for it

use std::sync::Arc;
use std::time::Duration;

use tablesync_protocol::{PlayerAddress, TableId};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::PlayerIdentity;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for the session actor.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Where to connect. `None` is allowed here; `subscribe` reports it as
    /// [`SyncError::MissingEndpoint`](crate::SyncError::MissingEndpoint).
    pub endpoint: Option<Endpoint>,

    /// How long to wait for the first frame after subscribing before
    /// reporting the server as unresponsive.
    ///
    /// Default: 5 seconds.
    pub watchdog_timeout: Duration,

    /// Capacity of the command channel between handles and the actor.
    ///
    /// Default: 64.
    pub command_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            watchdog_timeout: Duration::from_secs(5),
            command_buffer: 64,
        }
    }
}

impl SessionConfig {
    /// Returns a copy with nonsense values replaced by defaults.
    pub fn validated(mut self) -> Self {
        if self.watchdog_timeout.is_zero() {
            tracing::warn!("watchdog_timeout of zero, using default");
            self.watchdog_timeout = Self::default().watchdog_timeout;
        }
        if self.command_buffer == 0 {
            tracing::warn!("command_buffer of zero, using 1");
            self.command_buffer = 1;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

/// The publisher's WebSocket base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base: String,
}

impl Endpoint {
    /// Returns `None` for an empty or whitespace-only URL.
    pub fn new(base: impl Into<String>) -> Option<Self> {
        let base = base.into().trim().to_string();
        if base.is_empty() {
            return None;
        }
        Some(Self { base })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Subscription URL for one table and player.
    pub fn url_for(&self, table: &TableId, player: &PlayerAddress) -> String {
        let sep = if self.base.contains('?') { '&' } else { '?' };
        format!(
            "{}{sep}tableAddress={table}&playerId={player}",
            self.base
        )
    }
}

// ---------------------------------------------------------------------------
// SessionPhase
// ---------------------------------------------------------------------------

/// Where the current subscription is in its lifecycle.
///
/// ```text
///   Idle ──subscribe──→ Connecting ──open──→ AwaitingFirstMessage ──frame──→ Live
///                           │                        │                        │
///                           └──────────(unsubscribe / close / replace)────────┴──→ Closed
/// ```
///
/// Errors do not have a phase of their own; they sit in the snapshot's
/// error slot next to whatever phase the session is in. A connect failure
/// drops back to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Connecting,
    AwaitingFirstMessage,
    Live,
    Closed,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Connecting => "connecting",
            SessionPhase::AwaitingFirstMessage => "awaiting_first_message",
            SessionPhase::Live => "live",
            SessionPhase::Closed => "closed",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A spawned task that is aborted when its owner drops it.
#[derive(Debug)]
pub(crate) struct OwnedTask(JoinHandle<()>);

impl OwnedTask {
    pub(crate) fn spawn<F>(future: F) -> Self
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        Self(tokio::spawn(future))
    }
}

impl Drop for OwnedTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// The open connection and the tasks serving it.
pub(crate) struct Link<Conn> {
    pub(crate) connection: Arc<Conn>,
    /// Queue into the writer task; sends go out in the order queued.
    pub(crate) outbound: mpsc::UnboundedSender<String>,
    /// Cleared when the transport reports an error.
    pub(crate) healthy: bool,
    pub(crate) _reader: OwnedTask,
    pub(crate) _writer: OwnedTask,
}

/// One subscription attempt, owned by the actor.
pub(crate) struct Session<Conn> {
    pub(crate) table_id: TableId,
    pub(crate) generation: u64,
    pub(crate) identity: PlayerIdentity,
    /// `None` until the connect task reports the socket open.
    pub(crate) link: Option<Link<Conn>>,
    pub(crate) has_received_first_message: bool,
    pub(crate) watchdog: Option<OwnedTask>,
}

impl<Conn> Session<Conn> {
    pub(crate) fn new(
        table_id: TableId,
        generation: u64,
        identity: PlayerIdentity,
    ) -> Self {
        Self {
            table_id,
            generation,
            identity,
            link: None,
            has_received_first_message: false,
            watchdog: None,
        }
    }

    /// The link, if it is open and has not failed.
    pub(crate) fn open_link(&self) -> Option<&Link<Conn>> {
        self.link.as_ref().filter(|l| l.healthy)
    }
}
