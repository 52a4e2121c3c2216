//! Signing hook for the subscription handshake.
//!
//! tablesync does not sign anything itself. The publisher expects every
//! subscription frame to carry a timestamp and a signature proving the
//! player controls their address; producing that signature is the job of
//! whatever wallet or key store the application uses.
//!
//! The [`AuthProvider`] trait is the seam: one async method that takes the
//! local identity and returns a [`SignedAuth`]. The engine calls it once per
//! connection, right after the socket opens, and only sends the
//! subscription frame when it succeeds.
//!
//! # Why async?
//!
//! Real signers are slow: a hardware wallet waits for a button press, a
//! remote signer makes an HTTP call. The engine runs the provider on its own
//! task so a slow signature never blocks frames from being processed.

use std::time::{SystemTime, UNIX_EPOCH};

use tablesync_protocol::PlayerAddress;

use crate::{PlayerIdentity, SessionError};

/// A signed subscription payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedAuth {
    /// The address the signature was made for.
    pub player_address: PlayerAddress,
    /// Milliseconds since the Unix epoch, as a decimal string.
    pub timestamp: String,
    pub signature: String,
}

/// Produces the signature the publisher requires on subscription.
///
/// # Example
///
/// ```rust
/// use tablesync_session::{AuthProvider, PlayerIdentity, SessionError, SignedAuth};
///
/// /// Refuses to sign for anyone but one address.
/// struct OnlyAlice;
///
/// impl AuthProvider for OnlyAlice {
///     async fn sign(
///         &self,
///         identity: &PlayerIdentity,
///     ) -> Result<SignedAuth, SessionError> {
///         if identity.player_address.as_str() != "0xa11ce" {
///             return Err(SessionError::AuthFailed("unknown key".into()));
///         }
///         Ok(SignedAuth {
///             player_address: identity.player_address.clone(),
///             timestamp: "1700000000000".into(),
///             signature: "0xsig".into(),
///         })
///     }
/// }
/// ```
pub trait AuthProvider: Send + Sync + 'static {
    /// Signs a subscription for `identity`.
    ///
    /// # Returns
    /// - `Ok(SignedAuth)` — timestamp and signature to put on the frame
    /// - `Err(SessionError::AuthFailed)` — no signature could be produced;
    ///   the engine surfaces this in the snapshot and does not subscribe
    fn sign(
        &self,
        identity: &PlayerIdentity,
    ) -> impl std::future::Future<Output = Result<SignedAuth, SessionError>> + Send;
}

/// Signs every subscription with a fixed signature and the current time.
///
/// For local publishers that do not verify signatures. Never point this at
/// a real server.
#[derive(Debug, Clone)]
pub struct StaticSignature {
    signature: String,
}

impl StaticSignature {
    pub fn new(signature: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
        }
    }
}

impl AuthProvider for StaticSignature {
    async fn sign(
        &self,
        identity: &PlayerIdentity,
    ) -> Result<SignedAuth, SessionError> {
        Ok(SignedAuth {
            player_address: identity.player_address.clone(),
            timestamp: unix_millis(),
            signature: self.signature.clone(),
        })
    }
}

/// Current time as epoch milliseconds.
pub fn unix_millis() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
        .to_string()
}
