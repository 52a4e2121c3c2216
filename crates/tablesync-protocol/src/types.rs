//! Wire types for the game-state publisher protocol.
//!
//! Inbound traffic arrives in one of two structurally disjoint shapes:
//!
//! - **Canonical** — `{gameId, timestamp, event, data?, code?, message?, details?}`
//! - **Legacy** — `{type: "gameStateUpdate" | "error", tableAddress?, message?}`
//!
//! Each shape gets its own decode type. Nothing here tries to read one
//! shape through the other's fields; classification (see `classify`)
//! decides which decoded shape a frame belongs to.
//!
//! Only the tags (`event`, `type`) are strict. Every payload field decodes
//! leniently: a wrong-typed value is treated as absent.
//!
//! Outbound traffic is [`OutboundFrame`]: the subscription request and the
//! player action.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifier of a table (one running game instance on the publisher).
///
/// Opaque to the client; compared byte-for-byte against the `gameId` /
/// `tableAddress` of inbound frames.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableId(String);

impl TableId {
    /// Wraps a raw table identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TableId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TableId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// On-ledger address of a player.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerAddress(String);

impl PlayerAddress {
    /// Wraps a raw player address.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Returns the address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Amount
// ---------------------------------------------------------------------------

/// A chip amount or count as the publisher sends it: either a JSON number
/// or a decimal string (large values travel as strings).
///
/// An explicit zero, numeric or `"0"`, is a present value. Only JSON `null`
/// or an absent key means "no value", and that is modelled by wrapping
/// this type in `Option`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(serde_json::Number),
    Text(String),
}

impl Amount {
    /// `true` for the empty string, the only present value that still
    /// counts as missing for blind and buy-in fields.
    pub fn is_blank(&self) -> bool {
        matches!(self, Amount::Text(s) if s.is_empty())
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Number(n) => write!(f, "{n}"),
            Amount::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Amount {
    fn from(s: &str) -> Self {
        Amount::Text(s.to_owned())
    }
}

impl From<u64> for Amount {
    fn from(n: u64) -> Self {
        Amount::Number(n.into())
    }
}

// ---------------------------------------------------------------------------
// Game state
// ---------------------------------------------------------------------------

/// Table configuration carried inside every game state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOptions {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub small_blind: Option<Amount>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub big_blind: Option<Amount>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub min_buy_in: Option<Amount>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub max_buy_in: Option<Amount>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub min_players: Option<Amount>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub max_players: Option<Amount>,
    /// Fields this client does not model, kept verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One occupied seat.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatedPlayer {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub seat: Option<u32>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub stack: Option<Amount>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Authoritative table/hand state as published by the server.
///
/// Only the fields the engine reasons about are typed; everything else
/// (community cards, pots, round, dealer position, ...) is preserved in
/// `extra` for renderers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub game_options: Option<GameOptions>,
    /// One entry per seat; `None` for an empty or unreadable seat.
    #[serde(default, deserialize_with = "seats")]
    pub players: Vec<Option<SeatedPlayer>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl GameState {
    /// Occupied seats, in seat order.
    pub fn seated(&self) -> impl Iterator<Item = &SeatedPlayer> {
        self.players.iter().flatten()
    }
}

// ---------------------------------------------------------------------------
// Inbound: canonical shape
// ---------------------------------------------------------------------------

/// The `event` tag of a canonical envelope.
///
/// Unknown tags fail to decode, which routes the frame to the legacy
/// decoder and, failing that, to "unrecognized".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    State,
    PlayerJoinedGame,
    ActionPerformed,
    GameCreated,
    Pending,
    ActionAccepted,
    Error,
}

impl EventKind {
    /// Events that carry a full authoritative state.
    pub fn is_state_update(self) -> bool {
        matches!(
            self,
            EventKind::State
                | EventKind::PlayerJoinedGame
                | EventKind::ActionPerformed
                | EventKind::GameCreated
        )
    }
}

/// The `data` object of a canonical envelope. Which fields are populated
/// depends on the event.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventData {
    #[serde(default, deserialize_with = "lenient")]
    pub game_state: Option<GameState>,
    #[serde(default, deserialize_with = "lenient")]
    pub format: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub variant: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub game_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub actor: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub action: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub amount: Option<Amount>,
}

/// `details` of an error envelope.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ErrorDetails {
    #[serde(default, deserialize_with = "lenient")]
    pub suggestion: Option<String>,
}

/// Canonical inbound envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalEnvelope {
    #[serde(default, deserialize_with = "lenient")]
    pub game_id: Option<String>,
    pub event: EventKind,
    #[serde(default, deserialize_with = "lenient")]
    pub data: Option<EventData>,
    #[serde(default, deserialize_with = "lenient")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub details: Option<ErrorDetails>,
}

// ---------------------------------------------------------------------------
// Inbound: legacy shape
// ---------------------------------------------------------------------------

/// Legacy inbound envelope, internally tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LegacyEnvelope {
    #[serde(rename = "gameStateUpdate", rename_all = "camelCase")]
    GameStateUpdate {
        #[serde(default, deserialize_with = "lenient")]
        table_address: Option<String>,
    },

    #[serde(rename = "error")]
    Error {
        #[serde(default, deserialize_with = "lenient")]
        code: Option<String>,
        #[serde(default, deserialize_with = "lenient")]
        message: Option<String>,
        #[serde(default, deserialize_with = "lenient")]
        details: Option<ErrorDetails>,
    },
}

// ---------------------------------------------------------------------------
// Lenient decoding
// ---------------------------------------------------------------------------

// Inbound payloads are decoded field by field. A value of the wrong JSON
// type reads as absent, so one odd field never costs the whole frame;
// validation then reports it as missing.

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// `players` as a seat list. Anything but an array is an empty table.
fn seats<'de, D>(deserializer: D) -> Result<Vec<Option<SeatedPlayer>>, D::Error>
where
    D: Deserializer<'de>,
{
    let serde_json::Value::Array(entries) =
        serde_json::Value::deserialize(deserializer)?
    else {
        return Ok(Vec::new());
    };
    Ok(entries
        .into_iter()
        .map(|entry| serde_json::from_value(entry).ok())
        .collect())
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// Frames the client writes to the publisher.
///
/// `#[serde(tag = "type")]` produces `{"type": "subscribe", "gameId": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundFrame {
    /// Signed request to start receiving updates for a table.
    #[serde(rename_all = "camelCase")]
    Subscribe {
        game_id: TableId,
        player_address: PlayerAddress,
        timestamp: String,
        signature: String,
    },

    /// A player action (fold, call, raise, ...).
    #[serde(rename_all = "camelCase")]
    Action {
        game_id: TableId,
        player_address: PlayerAddress,
        action: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        amount: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&TableId::new("table-1")).unwrap();
        assert_eq!(json, "\"table-1\"");
    }

    #[test]
    fn test_amount_accepts_number_and_string() {
        let n: Amount = serde_json::from_str("0").unwrap();
        let s: Amount = serde_json::from_str("\"100000\"").unwrap();
        assert_eq!(n.to_string(), "0");
        assert_eq!(s.to_string(), "100000");
        assert!(!n.is_blank());
        assert!(!Amount::from("0").is_blank());
        assert!(Amount::from("").is_blank());
    }

    #[test]
    fn test_null_option_fields_decode_as_none() {
        let opts: GameOptions =
            serde_json::from_str(r#"{"smallBlind": null, "minPlayers": 0}"#)
                .unwrap();
        assert_eq!(opts.small_blind, None);
        assert_eq!(opts.min_players, Some(Amount::from(0u64)));
    }

    #[test]
    fn test_game_state_keeps_unknown_fields() {
        let json = r#"{
            "gameOptions": {"smallBlind": "1", "timeout": 30},
            "players": [{"seat": 1, "address": "0xabc", "holeCards": ["As", "Kd"]}],
            "round": "flop",
            "communityCards": ["2c", "3d", "4h"]
        }"#;
        let state: GameState = serde_json::from_str(json).unwrap();
        assert_eq!(state.extra["round"], "flop");
        let seat = state.players[0].as_ref().unwrap();
        assert_eq!(seat.address.as_deref(), Some("0xabc"));
        assert!(seat.extra.contains_key("holeCards"));
        let opts = state.game_options.unwrap();
        assert_eq!(opts.extra["timeout"], 30);
    }

    #[test]
    fn test_empty_and_odd_seats_do_not_fail_the_state() {
        let json = r#"{
            "gameOptions": {"bigBlind": "100"},
            "players": [null, {"seat": "3", "address": "0xabc"}, 7]
        }"#;
        let state: GameState = serde_json::from_str(json).unwrap();
        assert_eq!(state.players.len(), 3);
        assert!(state.players[0].is_none());
        assert!(state.players[2].is_none());

        let seated: Vec<_> = state.seated().collect();
        assert_eq!(seated.len(), 1);
        assert_eq!(seated[0].seat, None);
        assert_eq!(seated[0].address.as_deref(), Some("0xabc"));
    }

    #[test]
    fn test_null_players_is_an_empty_table() {
        let state: GameState =
            serde_json::from_str(r#"{"players": null}"#).unwrap();
        assert!(state.players.is_empty());
    }

    #[test]
    fn test_wrong_typed_fields_read_as_absent() {
        let opts: GameOptions = serde_json::from_str(
            r#"{"smallBlind": true, "bigBlind": {"v": 1}, "minBuyIn": "10"}"#,
        )
        .unwrap();
        assert_eq!(opts.small_blind, None);
        assert_eq!(opts.big_blind, None);
        assert_eq!(opts.min_buy_in, Some(Amount::from("10")));

        let env: CanonicalEnvelope = serde_json::from_str(
            r#"{"gameId": "t", "event": "error", "code": 404, "details": "gone"}"#,
        )
        .unwrap();
        assert_eq!(env.code, None);
        assert_eq!(env.details, None);
    }

    #[test]
    fn test_canonical_envelope_decodes_state_event() {
        let json = r#"{
            "gameId": "table-1",
            "timestamp": "2024-01-01T00:00:00Z",
            "event": "action_performed",
            "data": {"format": "cash", "variant": "texas-holdem", "gameState": {}}
        }"#;
        let env: CanonicalEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(env.event, EventKind::ActionPerformed);
        assert!(env.event.is_state_update());
        assert_eq!(env.game_id.as_deref(), Some("table-1"));
    }

    #[test]
    fn test_canonical_envelope_rejects_unknown_event() {
        let json = r#"{"gameId": "t", "event": "fly_to_moon"}"#;
        let result: Result<CanonicalEnvelope, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_legacy_envelope_decodes_both_types() {
        let update: LegacyEnvelope = serde_json::from_str(
            r#"{"type": "gameStateUpdate", "tableAddress": "0x1"}"#,
        )
        .unwrap();
        assert_eq!(
            update,
            LegacyEnvelope::GameStateUpdate {
                table_address: Some("0x1".into())
            }
        );

        let error: LegacyEnvelope =
            serde_json::from_str(r#"{"type": "error", "message": "boom"}"#)
                .unwrap();
        assert!(matches!(error, LegacyEnvelope::Error { .. }));
    }

    #[test]
    fn test_subscribe_frame_json_format() {
        let frame = OutboundFrame::Subscribe {
            game_id: TableId::new("table-1"),
            player_address: PlayerAddress::new("0xabc"),
            timestamp: "1700000000000".into(),
            signature: "sig".into(),
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "subscribe",
                "gameId": "table-1",
                "playerAddress": "0xabc",
                "timestamp": "1700000000000",
                "signature": "sig"
            })
        );
    }

    #[test]
    fn test_action_frame_omits_missing_amount() {
        let frame = OutboundFrame::Action {
            game_id: TableId::new("table-1"),
            player_address: PlayerAddress::new("0xabc"),
            action: "fold".into(),
            amount: None,
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "action");
        assert_eq!(json["action"], "fold");
        assert!(json.get("amount").is_none());
    }
}
