//! First-message watchdog.
//!
//! Armed once per subscription, after the subscription frame is queued.
//! If it runs out it posts a single event back to the actor; dropping the
//! returned task cancels it.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::session::OwnedTask;

/// Posts `fired` to `events` after `timeout`, unless dropped first.
pub(crate) fn arm<E>(
    timeout: Duration,
    events: mpsc::UnboundedSender<E>,
    fired: E,
) -> OwnedTask
where
    E: Send + 'static,
{
    OwnedTask::spawn(async move {
        tokio::time::sleep(timeout).await;
        let _ = events.send(fired);
    })
}
