//! Engine configuration.
//!
//! Built in code, through [`SyncEngineBuilder`](crate::SyncEngineBuilder),
//! or from the environment:
//!
//! | Variable                | Meaning                              | Default |
//! |-------------------------|--------------------------------------|---------|
//! | `TABLESYNC_WS_URL`      | publisher WebSocket base URL         | unset   |
//! | `TABLESYNC_WATCHDOG_MS` | first-frame watchdog in milliseconds | 5000    |
//!
//! An unset URL is not a configuration error. The engine starts without
//! one and reports it in the snapshot when `subscribe` is called.

use std::time::Duration;

use tablesync_session::{Endpoint, SessionConfig};

use crate::EngineError;

pub const WS_URL_VAR: &str = "TABLESYNC_WS_URL";
pub const WATCHDOG_MS_VAR: &str = "TABLESYNC_WATCHDOG_MS";

/// Configuration for a [`SyncEngine`](crate::SyncEngine).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Publisher WebSocket base URL, e.g. `wss://pub.example/ws`.
    pub ws_url: Option<String>,
    /// See [`SessionConfig::watchdog_timeout`].
    pub watchdog_timeout: Duration,
    /// See [`SessionConfig::command_buffer`].
    pub command_buffer: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let session = SessionConfig::default();
        Self {
            ws_url: None,
            watchdog_timeout: session.watchdog_timeout,
            command_buffer: session.command_buffer,
        }
    }
}

impl EngineConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    /// Returns [`EngineError::Config`] if a variable is set but unparsable.
    pub fn from_env() -> Result<Self, EngineError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup` instead of the process
    /// environment.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, EngineError> {
        let mut config = Self::default();

        config.ws_url = lookup(WS_URL_VAR).filter(|url| !url.trim().is_empty());

        if let Some(raw) = lookup(WATCHDOG_MS_VAR) {
            let millis: u64 =
                raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                    EngineError::Config {
                        var: WATCHDOG_MS_VAR,
                        reason: e.to_string(),
                    }
                })?;
            config.watchdog_timeout = Duration::from_millis(millis);
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_ws_url(mut self, url: impl Into<String>) -> Self {
        self.ws_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_watchdog_timeout(mut self, timeout: Duration) -> Self {
        self.watchdog_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_command_buffer(mut self, size: usize) -> Self {
        self.command_buffer = size;
        self
    }

    /// The session-layer configuration this maps to.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            endpoint: self.ws_url.as_deref().and_then(Endpoint::new),
            watchdog_timeout: self.watchdog_timeout,
            command_buffer: self.command_buffer,
        }
    }
}
