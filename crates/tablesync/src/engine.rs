//! `SyncEngine`: the public face of tablesync.
//!
//! One engine follows at most one table at a time. It wraps the session
//! actor, so every method here is a message to that actor and the state
//! you read back is always a whole, consistent [`Snapshot`].

use tablesync_protocol::TableId;
use tablesync_session::{
    AuthProvider, IdentityStore, SessionHandle, Snapshot, spawn_session,
};
use tablesync_transport::{Connector, WebSocketConnector};
use tokio::sync::watch;

use crate::{EngineConfig, EngineError};

/// Builder for a [`SyncEngine`].
///
/// # Example
///
/// ```rust,no_run
/// use tablesync::prelude::*;
///
/// # async fn run() -> Result<(), EngineError> {
/// let engine = SyncEngine::builder()
///     .ws_url("wss://publisher.example/ws")
///     .build_websocket(
///         FileIdentityStore::new("identity.json"),
///         StaticSignature::new("0xdev"),
///     );
/// engine.subscribe("0xtable").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct SyncEngineBuilder {
    config: EngineConfig,
}

impl SyncEngineBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the publisher's WebSocket base URL.
    pub fn ws_url(mut self, url: impl Into<String>) -> Self {
        self.config.ws_url = Some(url.into());
        self
    }

    /// Sets the first-frame watchdog.
    pub fn watchdog_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.watchdog_timeout = timeout;
        self
    }

    /// Starts the engine on a custom connector.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn build<C, I, A>(self, connector: C, identity: I, auth: A) -> SyncEngine
    where
        C: Connector,
        I: IdentityStore,
        A: AuthProvider,
    {
        tracing::info!(
            ws_url = self.config.ws_url.as_deref().unwrap_or("-"),
            watchdog_ms = self.config.watchdog_timeout.as_millis() as u64,
            "sync engine started"
        );
        let handle =
            spawn_session(self.config.session_config(), connector, identity, auth);
        SyncEngine { handle }
    }

    /// Starts the engine over WebSocket.
    pub fn build_websocket<I, A>(self, identity: I, auth: A) -> SyncEngine
    where
        I: IdentityStore,
        A: AuthProvider,
    {
        self.build(WebSocketConnector, identity, auth)
    }
}

/// Live game-state synchronization for one table at a time.
///
/// Dropping the engine tears the session down: the socket is closed and
/// the watchdog cancelled. Receivers obtained from [`watch`](Self::watch)
/// stay valid and keep the last snapshot.
pub struct SyncEngine {
    handle: SessionHandle,
}

impl SyncEngine {
    /// Creates a builder.
    pub fn builder() -> SyncEngineBuilder {
        SyncEngineBuilder::new()
    }

    /// Starts an engine over WebSocket with `config`.
    pub fn websocket<I, A>(config: EngineConfig, identity: I, auth: A) -> Self
    where
        I: IdentityStore,
        A: AuthProvider,
    {
        SyncEngineBuilder::new()
            .config(config)
            .build_websocket(identity, auth)
    }

    /// Follows `table_id`.
    ///
    /// Subscribing to the table that is already live is a no-op, and a
    /// subscribe that arrives while a connection is still being opened is
    /// ignored. Anything else replaces the current subscription. Progress
    /// and failures are reported through the snapshot.
    ///
    /// # Errors
    /// Only [`SessionError::Stopped`](tablesync_session::SessionError::Stopped)
    /// after [`shutdown`](Self::shutdown).
    pub async fn subscribe(
        &self,
        table_id: impl Into<TableId>,
    ) -> Result<(), EngineError> {
        let table_id = table_id.into();
        tracing::debug!(table = %table_id, "subscribe requested");
        Ok(self.handle.subscribe(table_id).await?)
    }

    /// Stops following the current table and clears the snapshot.
    pub async fn unsubscribe(&self) -> Result<(), EngineError> {
        Ok(self.handle.unsubscribe().await?)
    }

    /// Sends a player action such as `"fold"` or `"raise"` to the
    /// subscribed table. Returns as soon as the frame is queued.
    ///
    /// # Errors
    /// Fails without writing anything when no table is subscribed, the
    /// connection is not open, or no identity is stored.
    pub async fn send_action(
        &self,
        action: impl Into<String>,
        amount: Option<String>,
    ) -> Result<(), EngineError> {
        Ok(self.handle.send_action(action, amount).await?)
    }

    /// A copy of the current snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.handle.snapshot()
    }

    /// A receiver notified on every snapshot change.
    pub fn watch(&self) -> watch::Receiver<Snapshot> {
        self.handle.watch()
    }

    /// Tears down the session and stops the engine. Later calls fail with
    /// `SessionError::Stopped`.
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        self.handle.shutdown().await?;
        tracing::info!("sync engine stopped");
        Ok(())
    }

    /// `false` after [`shutdown`](Self::shutdown).
    pub fn is_running(&self) -> bool {
        self.handle.is_running()
    }
}
