//! Wire protocol for tablesync.
//!
//! This crate defines what the client and the game-state publisher say to
//! each other:
//!
//! - **Types** ([`CanonicalEnvelope`], [`LegacyEnvelope`], [`OutboundFrame`],
//!   [`GameState`], ...) — the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those structures are
//!   turned into text frames and back.
//! - **Classification** ([`classify`], [`ClassifiedMessage`]) — which of the
//!   five message kinds an inbound frame is.
//! - **Validation** ([`validate_state`], [`ValidationError`]) — whether a
//!   state update carries every field a renderer needs.
//!
//! The protocol layer knows nothing about sockets or sessions.
//!
//! ```text
//! Transport (text frames) → Protocol (ClassifiedMessage) → Session (snapshot)
//! ```

mod classify;
mod codec;
mod error;
mod types;
mod validate;

pub use classify::{
    ClassifiedMessage, GAME_NOT_FOUND, PendingNotice, ServerError, StateUpdate,
    classify,
};
pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    Amount, CanonicalEnvelope, ErrorDetails, EventData, EventKind, GameOptions,
    GameState, LegacyEnvelope, OutboundFrame, PlayerAddress, SeatedPlayer,
    TableId,
};
pub use validate::{ValidationError, missing_fields, validate_state};
