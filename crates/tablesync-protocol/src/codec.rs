//! Codec trait and the JSON implementation.
//!
//! The publisher speaks JSON over text frames. The session layer only
//! depends on [`Codec`], so a different text encoding could be dropped in
//! without touching the state machine.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Converts between Rust values and text frames.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into one text frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Parses one text frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the text is malformed or does not
    /// match `T`.
    fn decode<T: DeserializeOwned>(&self, frame: &str) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
///
/// ```rust
/// use tablesync_protocol::{Codec, JsonCodec, OutboundFrame, PlayerAddress, TableId};
///
/// let frame = OutboundFrame::Action {
///     game_id: TableId::new("table-1"),
///     player_address: PlayerAddress::new("0xabc"),
///     action: "call".into(),
///     amount: None,
/// };
/// let text = JsonCodec.encode(&frame).unwrap();
/// let back: OutboundFrame = JsonCodec.decode(&text).unwrap();
/// assert_eq!(frame, back);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, frame: &str) -> Result<T, ProtocolError> {
        serde_json::from_str(frame).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_garbage_returns_decode_error() {
        let result: Result<serde_json::Value, _> = JsonCodec.decode("not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_encode_produces_compact_json() {
        let text = JsonCodec
            .encode(&serde_json::json!({"type": "action", "action": "fold"}))
            .unwrap();
        assert!(!text.contains('\n'));
        assert!(text.contains("\"action\":\"fold\""));
    }
}
