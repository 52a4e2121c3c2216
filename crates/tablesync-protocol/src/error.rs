//! Error types for the protocol layer.
//!
//! A `ProtocolError` always means the problem is in turning frames into
//! Rust values or back, never in networking or session bookkeeping.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization of an outbound frame failed.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// An inbound frame could not be parsed into the requested type.
    ///
    /// The dispatcher never surfaces this for inbound traffic: frames that
    /// fail to decode are classified as unrecognized and dropped.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// The frame is well-formed but violates a protocol rule, e.g. an
    /// action frame with an empty action tag.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
