//! Unified error type for the tablesync facade.

use tablesync_protocol::ProtocolError;
use tablesync_session::SessionError;
use tablesync_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `tablesync` crate you deal with this single error type
/// instead of importing errors from each sub-crate. The `#[from]` attribute
/// on each variant lets `?` convert sub-crate errors automatically.
///
/// Only caller-facing failures come through here. Anything that goes wrong
/// in the background (server errors, a dropped socket, the watchdog) is
/// reported in [`Snapshot::error`](crate::Snapshot::error) instead.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A transport-level error (connect, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (not subscribed, no identity, engine stopped).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A configuration value could not be parsed.
    #[error("invalid value for {var}: {reason}")]
    Config { var: &'static str, reason: String },
}
