//! Session actor: a single Tokio task that owns the subscription.
//!
//! Everything session-scoped lives here: the phase, the one open
//! connection, the watchdog, the overlay, the snapshot. Callers talk to the
//! actor through a [`SessionHandle`]; the connect, auth, reader and writer
//! tasks talk to it through an internal event channel. Nothing else ever
//! touches session state, so two `subscribe` calls racing each other are
//! simply processed one after the other.
//!
//! Every event from a background task carries the *generation* of the
//! subscription that started it. Each `subscribe` bumps the generation, so
//! anything still in flight from an older subscription is recognised and
//! dropped on arrival.

use std::sync::Arc;
use std::time::Duration;

use tablesync_protocol::{
    ClassifiedMessage, Codec, JsonCodec, OutboundFrame, ProtocolError, TableId,
    classify, validate_state,
};
use tablesync_transport::{Connection, Connector, TransportError};
use tokio::sync::{mpsc, oneshot, watch};

use crate::overlay::PendingOverlay;
use crate::session::{Link, OwnedTask, Session};
use crate::{
    AuthProvider, IdentityStore, PendingAction, PlayerIdentity, SessionConfig,
    SessionError, SessionPhase, SignedAuth, Snapshot, SyncError, watchdog,
};

/// How long teardown waits for a connection to close cleanly.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Requests from handles to the actor.
pub(crate) enum SessionCommand {
    Subscribe {
        table_id: TableId,
        reply: oneshot::Sender<()>,
    },
    Unsubscribe {
        reply: oneshot::Sender<()>,
    },
    SendAction {
        action: String,
        amount: Option<String>,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Completions reported by the actor's background tasks.
enum SessionEvent<Conn> {
    Opened { generation: u64, connection: Conn },
    ConnectFailed { generation: u64, error: TransportError },
    Signed {
        generation: u64,
        result: Result<SignedAuth, SessionError>,
    },
    Frame { generation: u64, frame: String },
    Closed { generation: u64 },
    TransportFailed { generation: u64, error: TransportError },
    WatchdogFired { generation: u64 },
}

type EventSender<Conn> = mpsc::UnboundedSender<SessionEvent<Conn>>;

// ---------------------------------------------------------------------------
// SessionHandle
// ---------------------------------------------------------------------------

/// Handle to a running session actor.
///
/// Cheap to clone. When the last handle is dropped the actor tears the
/// session down and exits.
#[derive(Clone)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionCommand>,
    snapshots: watch::Receiver<Snapshot>,
}

impl SessionHandle {
    /// Subscribes to `table_id`, replacing any current subscription.
    ///
    /// Returns once the actor has acted on the request. Connecting, signing
    /// and the first frame all happen afterwards; watch the snapshot for
    /// them. Failures (no identity, no endpoint, connect refused) also land
    /// in the snapshot rather than in the return value.
    pub async fn subscribe(&self, table_id: TableId) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::Subscribe { table_id, reply })
            .await
    }

    /// Tears down the current subscription. Returns after the connection is
    /// closed and the snapshot cleared.
    pub async fn unsubscribe(&self) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::Unsubscribe { reply })
            .await
    }

    /// Queues a player action on the open connection.
    ///
    /// Does not wait for the server. The result of the action shows up
    /// later as a `pending` overlay and then a state update.
    pub async fn send_action(
        &self,
        action: impl Into<String>,
        amount: Option<String>,
    ) -> Result<(), SessionError> {
        let action = action.into();
        self.request(|reply| SessionCommand::SendAction {
            action,
            amount,
            reply,
        })
        .await?
    }

    /// Tears down the session and stops the actor.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::Shutdown { reply }).await
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver that is notified whenever the snapshot changes.
    pub fn watch(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    /// `false` once the actor has stopped.
    pub fn is_running(&self) -> bool {
        !self.sender.is_closed()
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(make(reply_tx))
            .await
            .map_err(|_| SessionError::Stopped)?;
        reply_rx.await.map_err(|_| SessionError::Stopped)
    }
}

// ---------------------------------------------------------------------------
// SessionActor
// ---------------------------------------------------------------------------

struct SessionActor<C: Connector, A, I> {
    config: SessionConfig,
    connector: Arc<C>,
    auth: Arc<A>,
    identity: I,
    codec: JsonCodec,
    commands: mpsc::Receiver<SessionCommand>,
    events_tx: EventSender<C::Connection>,
    events: mpsc::UnboundedReceiver<SessionEvent<C::Connection>>,
    snapshots: watch::Sender<Snapshot>,
    /// The snapshot being built; published whole by [`Self::publish`].
    view: Snapshot,
    overlay: PendingOverlay,
    session: Option<Session<C::Connection>>,
    generation: u64,
}

impl<C, A, I> SessionActor<C, A, I>
where
    C: Connector,
    A: AuthProvider,
    I: IdentityStore,
{
    async fn run(mut self) {
        tracing::info!("session actor started");

        let stop_reply = loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(SessionCommand::Subscribe { table_id, reply }) => {
                        self.handle_subscribe(table_id).await;
                        let _ = reply.send(());
                    }
                    Some(SessionCommand::Unsubscribe { reply }) => {
                        self.handle_unsubscribe().await;
                        let _ = reply.send(());
                    }
                    Some(SessionCommand::SendAction { action, amount, reply }) => {
                        let result = self.handle_send_action(action, amount).await;
                        let _ = reply.send(result);
                    }
                    Some(SessionCommand::Shutdown { reply }) => break Some(reply),
                    None => break None,
                },
                Some(event) = self.events.recv() => self.handle_event(event).await,
            }
        };

        self.teardown().await;
        self.publish();
        if let Some(reply) = stop_reply {
            let _ = reply.send(());
        }
        tracing::info!("session actor stopped");
    }

    // -- commands -----------------------------------------------------------

    async fn handle_subscribe(&mut self, table_id: TableId) {
        if let Some(session) = &self.session {
            if self.view.phase == SessionPhase::Connecting {
                tracing::debug!(
                    %table_id,
                    connecting_to = %session.table_id,
                    "subscribe ignored while connecting"
                );
                return;
            }
            if session.table_id == table_id
                && self.view.phase == SessionPhase::Live
                && session.open_link().is_some()
            {
                tracing::debug!(%table_id, "already live, subscribe is a no-op");
                return;
            }
        }

        self.teardown().await;
        self.generation += 1;
        let generation = self.generation;
        self.view = Snapshot::loading(table_id.clone());

        let Some(identity) = self.identity.load().await else {
            tracing::warn!(%table_id, "cannot subscribe without a local identity");
            self.set_error(SyncError::MissingIdentity);
            return;
        };
        let Some(endpoint) = &self.config.endpoint else {
            tracing::warn!(%table_id, "cannot subscribe without an endpoint");
            self.set_error(SyncError::MissingEndpoint);
            return;
        };
        let url = endpoint.url_for(&table_id, &identity.player_address);

        tracing::info!(%table_id, generation, "subscribing");
        self.view.phase = SessionPhase::Connecting;
        self.session = Some(Session::new(table_id, generation, identity));
        self.publish();
        self.spawn_connect(generation, url);
    }

    async fn handle_unsubscribe(&mut self) {
        self.teardown().await;
        self.publish();
    }

    async fn handle_send_action(
        &mut self,
        action: String,
        amount: Option<String>,
    ) -> Result<(), SessionError> {
        let Some(session) = &self.session else {
            return Err(SessionError::NotSubscribed);
        };
        let table_id = session.table_id.clone();
        let Some(outbound) = session.open_link().map(|l| l.outbound.clone()) else {
            return Err(SessionError::NotConnected(table_id));
        };
        let Some(identity) = self.identity.load().await else {
            return Err(SessionError::MissingIdentity);
        };
        if action.trim().is_empty() {
            return Err(ProtocolError::InvalidMessage(
                "action must not be empty".into(),
            )
            .into());
        }

        tracing::debug!(%table_id, %action, "queueing action");
        let frame = OutboundFrame::Action {
            game_id: table_id.clone(),
            player_address: identity.player_address,
            action,
            amount,
        };
        let text = self.codec.encode(&frame)?;
        outbound
            .send(text)
            .map_err(|_| SessionError::NotConnected(table_id))
    }

    // -- events -------------------------------------------------------------

    async fn handle_event(&mut self, event: SessionEvent<C::Connection>) {
        match event {
            SessionEvent::Opened {
                generation,
                connection,
            } => self.on_opened(generation, connection).await,
            SessionEvent::ConnectFailed { generation, error } => {
                self.on_connect_failed(generation, error)
            }
            SessionEvent::Signed { generation, result } => {
                self.on_signed(generation, result)
            }
            SessionEvent::Frame { generation, frame } => {
                self.on_frame(generation, &frame)
            }
            SessionEvent::Closed { generation } => {
                self.on_closed(generation).await
            }
            SessionEvent::TransportFailed { generation, error } => {
                self.on_transport_failed(generation, error)
            }
            SessionEvent::WatchdogFired { generation } => {
                self.on_watchdog(generation)
            }
        }
    }

    async fn on_opened(&mut self, generation: u64, connection: C::Connection) {
        let connection = Arc::new(connection);
        let connecting = self.view.phase == SessionPhase::Connecting;
        let Some(session) = current(&mut self.session, generation).filter(|_| connecting)
        else {
            tracing::debug!(
                connection = %connection.id(),
                generation,
                "closing connection opened for a stale subscription"
            );
            close_connection(connection.as_ref()).await;
            return;
        };

        tracing::info!(
            table_id = %session.table_id,
            connection = %connection.id(),
            generation,
            "connection open"
        );
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        session.link = Some(Link {
            _reader: OwnedTask::spawn(read_loop(
                Arc::clone(&connection),
                generation,
                self.events_tx.clone(),
            )),
            _writer: OwnedTask::spawn(write_loop(
                Arc::clone(&connection),
                outbound_rx,
                generation,
                self.events_tx.clone(),
            )),
            connection,
            outbound,
            healthy: true,
        });
        let identity = session.identity.clone();

        self.view.phase = SessionPhase::AwaitingFirstMessage;
        self.publish();
        self.spawn_sign(generation, identity);
    }

    fn on_connect_failed(&mut self, generation: u64, error: TransportError) {
        let Some(session) = current(&mut self.session, generation) else {
            tracing::debug!(generation, error = %error, "stale connect failure");
            return;
        };
        tracing::warn!(table_id = %session.table_id, error = %error, "connect failed");

        self.session = None;
        self.view.phase = SessionPhase::Idle;
        self.view.is_loading = false;
        self.view.error = Some(SyncError::Transport(error.to_string()));
        self.publish();
    }

    fn on_signed(
        &mut self,
        generation: u64,
        result: Result<SignedAuth, SessionError>,
    ) {
        let timeout = self.config.watchdog_timeout;
        let events = self.events_tx.clone();
        let Some(session) = current(&mut self.session, generation) else {
            tracing::debug!(generation, "stale auth result");
            return;
        };

        let signed = match result {
            Ok(signed) => signed,
            Err(e) => {
                tracing::warn!(table_id = %session.table_id, error = %e, "auth failed");
                let reason = match e {
                    SessionError::AuthFailed(reason) => reason,
                    other => other.to_string(),
                };
                self.set_error(SyncError::Auth(reason));
                return;
            }
        };

        let frame = OutboundFrame::Subscribe {
            game_id: session.table_id.clone(),
            player_address: signed.player_address,
            timestamp: signed.timestamp,
            signature: signed.signature,
        };
        let text = match self.codec.encode(&frame) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "could not encode subscription frame");
                self.set_error(SyncError::Protocol(e.to_string()));
                return;
            }
        };

        let Some(link) = session.open_link() else {
            tracing::debug!(generation, "connection failed before subscribing");
            return;
        };
        if link.outbound.send(text).is_err() {
            return;
        }
        tracing::info!(table_id = %session.table_id, generation, "subscription sent");

        if !session.has_received_first_message {
            session.watchdog = Some(watchdog::arm(
                timeout,
                events,
                SessionEvent::WatchdogFired { generation },
            ));
        }
    }

    fn on_frame(&mut self, generation: u64, frame: &str) {
        let Some(session) = current(&mut self.session, generation) else {
            tracing::trace!(generation, "dropping frame from stale connection");
            return;
        };

        let first = !session.has_received_first_message;
        if first {
            session.has_received_first_message = true;
            session.watchdog = None;
            tracing::info!(table_id = %session.table_id, generation, "first frame received");
        }
        let message = classify(&self.codec, frame, &session.table_id);
        tracing::trace!(kind = message.kind(), "frame classified");

        if first {
            self.view.phase = SessionPhase::Live;
            self.view.is_loading = false;
        }
        self.dispatch(message);
        self.publish();
    }

    async fn on_closed(&mut self, generation: u64) {
        let Some(session) = current(&mut self.session, generation) else {
            return;
        };
        tracing::info!(table_id = %session.table_id, generation, "connection closed by peer");
        self.teardown().await;
        self.publish();
    }

    fn on_transport_failed(&mut self, generation: u64, error: TransportError) {
        let Some(session) = current(&mut self.session, generation) else {
            return;
        };
        tracing::warn!(table_id = %session.table_id, error = %error, "transport error");
        if let Some(link) = session.link.as_mut() {
            link.healthy = false;
        }
        session.watchdog = None;
        self.set_error(SyncError::Transport(error.to_string()));
    }

    fn on_watchdog(&mut self, generation: u64) {
        let timeout = self.config.watchdog_timeout;
        let Some(session) = current(&mut self.session, generation) else {
            return;
        };
        if session.has_received_first_message || session.watchdog.take().is_none() {
            return;
        }
        tracing::warn!(
            table_id = %session.table_id,
            ?timeout,
            "no frame received since subscribing"
        );
        self.set_error(SyncError::ServerNotResponding { timeout });
    }

    // -- state --------------------------------------------------------------

    /// Applies one classified frame to the view.
    fn dispatch(&mut self, message: ClassifiedMessage) {
        match message {
            ClassifiedMessage::StateUpdate(update) => {
                let validation = validate_state(&update);
                self.view.game_state = update.game_state;
                self.view.format = update.format;
                self.view.variant = update.variant;
                match validation {
                    Ok(()) => {
                        self.view.validation_error = None;
                        self.view.error = None;
                    }
                    Err(e) => {
                        tracing::warn!(missing = ?e.missing_fields, "incomplete game state");
                        self.view.validation_error = Some(e);
                    }
                }
                self.overlay.clear();
            }
            ClassifiedMessage::Pending(notice) => {
                self.overlay.set(PendingAction::received(notice));
            }
            ClassifiedMessage::ActionAccepted => {
                tracing::debug!("action accepted");
            }
            ClassifiedMessage::Error(err) => {
                tracing::warn!(code = ?err.code, message = %err.message, "server error");
                if err.is_game_not_found() {
                    self.view.game_state = None;
                }
                self.view.error = Some(err.into());
                self.overlay.clear();
            }
            ClassifiedMessage::Unrecognized => {
                tracing::debug!("dropping unrecognized frame");
            }
        }
    }

    fn set_error(&mut self, error: SyncError) {
        self.view.error = Some(error);
        self.view.is_loading = false;
        self.publish();
    }

    /// Publishes the view if it differs from what consumers last saw.
    fn publish(&mut self) {
        self.view.pending_action = self.overlay.current().cloned();
        let view = &self.view;
        self.snapshots.send_if_modified(|current| {
            if current == view {
                return false;
            }
            *current = view.clone();
            true
        });
    }

    /// Closes the current session, if any, and resets the view to closed.
    /// Does not publish.
    async fn teardown(&mut self) {
        self.overlay.clear();
        self.view = Snapshot::closed();

        let Some(mut session) = self.session.take() else {
            return;
        };
        session.watchdog = None;
        if let Some(link) = session.link.take() {
            let connection = Arc::clone(&link.connection);
            drop(link);
            close_connection(connection.as_ref()).await;
        }
        tracing::info!(
            table_id = %session.table_id,
            generation = session.generation,
            "session closed"
        );
    }

    // -- background tasks ---------------------------------------------------

    fn spawn_connect(&self, generation: u64, url: String) {
        let connector = Arc::clone(&self.connector);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let event = match connector.connect(&url).await {
                Ok(connection) => SessionEvent::Opened {
                    generation,
                    connection,
                },
                Err(error) => SessionEvent::ConnectFailed { generation, error },
            };
            let _ = events.send(event);
        });
    }

    fn spawn_sign(&self, generation: u64, identity: PlayerIdentity) {
        let auth = Arc::clone(&self.auth);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = auth.sign(&identity).await;
            let _ = events.send(SessionEvent::Signed { generation, result });
        });
    }
}

/// The session for `generation`, if it is still the current one.
fn current<Conn>(
    session: &mut Option<Session<Conn>>,
    generation: u64,
) -> Option<&mut Session<Conn>> {
    session.as_mut().filter(|s| s.generation == generation)
}

/// Forwards inbound frames until the connection ends.
async fn read_loop<Conn: Connection>(
    connection: Arc<Conn>,
    generation: u64,
    events: EventSender<Conn>,
) {
    loop {
        match connection.recv().await {
            Ok(Some(frame)) => {
                if events.send(SessionEvent::Frame { generation, frame }).is_err() {
                    return;
                }
            }
            Ok(None) => {
                let _ = events.send(SessionEvent::Closed { generation });
                return;
            }
            Err(error) => {
                let _ = events.send(SessionEvent::TransportFailed { generation, error });
                return;
            }
        }
    }
}

/// Sends queued frames in order; stops at the first failure.
async fn write_loop<Conn: Connection>(
    connection: Arc<Conn>,
    mut outbound: mpsc::UnboundedReceiver<String>,
    generation: u64,
    events: EventSender<Conn>,
) {
    while let Some(frame) = outbound.recv().await {
        if let Err(error) = connection.send(frame).await {
            let _ = events.send(SessionEvent::TransportFailed { generation, error });
            return;
        }
    }
}

async fn close_connection<Conn: Connection>(connection: &Conn) {
    match tokio::time::timeout(CLOSE_GRACE, connection.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::debug!(connection = %connection.id(), error = %e, "close failed");
        }
        Err(_) => {
            tracing::debug!(connection = %connection.id(), "close timed out");
        }
    }
}

/// Spawns a session actor and returns a handle to it.
///
/// Must be called from within a Tokio runtime. `config` is passed through
/// [`SessionConfig::validated`] first.
pub fn spawn_session<C, A, I>(
    config: SessionConfig,
    connector: C,
    identity: I,
    auth: A,
) -> SessionHandle
where
    C: Connector,
    A: AuthProvider,
    I: IdentityStore,
{
    let config = config.validated();
    let (tx, rx) = mpsc::channel(config.command_buffer);
    let (events_tx, events) = mpsc::unbounded_channel();
    let (snapshots, snapshot_rx) = watch::channel(Snapshot::default());

    let actor = SessionActor {
        config,
        connector: Arc::new(connector),
        auth: Arc::new(auth),
        identity,
        codec: JsonCodec,
        commands: rx,
        events_tx,
        events,
        snapshots,
        view: Snapshot::default(),
        overlay: PendingOverlay::default(),
        session: None,
        generation: 0,
    };

    tokio::spawn(actor.run());

    SessionHandle {
        sender: tx,
        snapshots: snapshot_rx,
    }
}
