//! Inbound frame classification.
//!
//! Every text frame is parsed once into a JSON value, then decoded as the
//! canonical shape and as the legacy shape. Only the tags decide the shape;
//! payload fields decode leniently, so a frame for the subscribed table is
//! never lost to one oddly typed value. The first matching rule wins:
//!
//! 1. state update for the subscribed table (canonical or legacy)
//! 2. `pending` notification
//! 3. `action_accepted` acknowledgement
//! 4. error (`event == "error"` or `type == "error"`)
//! 5. anything else is [`ClassifiedMessage::Unrecognized`]
//!
//! Rule 5 is a compatibility promise: a frame the client does not
//! understand is dropped, never reported as an error.

use serde::Deserialize;

use crate::{
    CanonicalEnvelope, Codec, EventKind, GameState, LegacyEnvelope, TableId,
};

/// Error code the publisher uses when the subscribed table does not exist.
pub const GAME_NOT_FOUND: &str = "GAME_NOT_FOUND";

/// Payload of a classified state update.
#[derive(Debug, Clone, PartialEq)]
pub struct StateUpdate {
    pub game_state: Option<GameState>,
    pub format: Option<String>,
    pub variant: Option<String>,
    /// The whole decoded frame, kept for validation reports.
    pub raw: serde_json::Value,
}

/// Payload of a `pending` notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingNotice {
    pub game_id: String,
    pub actor: String,
    pub action: String,
    pub amount: Option<String>,
}

/// Payload of an error frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerError {
    pub code: Option<String>,
    pub message: String,
    pub suggestion: Option<String>,
}

impl ServerError {
    /// `true` when the server says the table no longer exists.
    pub fn is_game_not_found(&self) -> bool {
        self.code.as_deref() == Some(GAME_NOT_FOUND)
    }
}

/// One inbound frame after classification.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifiedMessage {
    StateUpdate(StateUpdate),
    Pending(PendingNotice),
    ActionAccepted,
    Error(ServerError),
    Unrecognized,
}

impl ClassifiedMessage {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ClassifiedMessage::StateUpdate(_) => "state_update",
            ClassifiedMessage::Pending(_) => "pending",
            ClassifiedMessage::ActionAccepted => "action_accepted",
            ClassifiedMessage::Error(_) => "error",
            ClassifiedMessage::Unrecognized => "unrecognized",
        }
    }
}

/// Classifies one inbound text frame for the subscribed `table`.
pub fn classify<C: Codec>(
    codec: &C,
    frame: &str,
    table: &TableId,
) -> ClassifiedMessage {
    let raw: serde_json::Value = match codec.decode(frame) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(error = %e, "dropping unparseable frame");
            return ClassifiedMessage::Unrecognized;
        }
    };

    let canonical = CanonicalEnvelope::deserialize(&raw).ok();
    let legacy = LegacyEnvelope::deserialize(&raw).ok();

    // Rule 1: state update addressed to our table.
    if let Some(env) = &canonical {
        if env.event.is_state_update()
            && env.game_id.as_deref() == Some(table.as_str())
        {
            let data = env.data.clone().unwrap_or_default();
            return ClassifiedMessage::StateUpdate(StateUpdate {
                game_state: data.game_state,
                format: data.format,
                variant: data.variant,
                raw,
            });
        }
    }
    if let Some(LegacyEnvelope::GameStateUpdate { table_address }) = &legacy {
        if table_address.as_deref() == Some(table.as_str()) {
            // The legacy shape carries no state payload.
            return ClassifiedMessage::StateUpdate(StateUpdate {
                game_state: None,
                format: None,
                variant: None,
                raw,
            });
        }
    }

    if let Some(env) = canonical {
        match env.event {
            // Rule 2.
            EventKind::Pending => {
                let data = env.data.unwrap_or_default();
                return ClassifiedMessage::Pending(PendingNotice {
                    game_id: data.game_id.or(env.game_id).unwrap_or_default(),
                    actor: data.actor.unwrap_or_default(),
                    action: data.action.unwrap_or_default(),
                    amount: data.amount.map(|a| a.to_string()),
                });
            }
            // Rule 3.
            EventKind::ActionAccepted => {
                return ClassifiedMessage::ActionAccepted;
            }
            // Rule 4.
            EventKind::Error => {
                return ClassifiedMessage::Error(server_error(
                    env.code,
                    env.message,
                    env.details.and_then(|d| d.suggestion),
                ));
            }
            // A state event for some other table; a legacy `type` may
            // still make it an error.
            _ => {}
        }
    }

    if let Some(LegacyEnvelope::Error {
        code,
        message,
        details,
    }) = legacy
    {
        return ClassifiedMessage::Error(server_error(
            code,
            message,
            details.and_then(|d| d.suggestion),
        ));
    }

    ClassifiedMessage::Unrecognized
}

fn server_error(
    code: Option<String>,
    message: Option<String>,
    suggestion: Option<String>,
) -> ServerError {
    ServerError {
        code,
        message: message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "unknown server error".to_string()),
        suggestion,
    }
}
