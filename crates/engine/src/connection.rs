//! Push-channel connection manager.
//!
//! Owns the single websocket to the alert source and exposes inbound
//! traffic as a lazy, restartable stream of [`ConnectionEvent`]s. The
//! manager re-establishes the connection after a fixed delay whenever
//! it drops; it never mutates dashboard state itself.

use std::time::Duration;

use alertdash_core::EnrichedAlert;
use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Delay between reconnect attempts. Matches the source's observed
/// behavior; deliberately a single fixed interval rather than
/// exponential backoff.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// One observation from the push channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    Connected,
    AlertReceived(EnrichedAlert),
    Disconnected { reason: String },
    /// Non-fatal: a frame that was not a valid enriched alert. The
    /// connection stays up and the frame is dropped.
    Error { reason: String },
}

/// Connection lifecycle as an explicit state machine, so tests can
/// drive transitions without real network timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Open,
    Reconnecting,
    Failed,
}

impl ConnectionStatus {
    pub fn on_connected(self) -> Self {
        ConnectionStatus::Open
    }

    /// The manager always schedules a retry after a drop, so a lost
    /// or refused connection lands in `Reconnecting`, never `Failed`.
    pub fn on_disconnected(self) -> Self {
        ConnectionStatus::Reconnecting
    }

    /// The event stream ended without a teardown request: the manager
    /// is gone and no retry is coming.
    pub fn on_fatal(self) -> Self {
        ConnectionStatus::Failed
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Open => "open",
            ConnectionStatus::Reconnecting => "reconnecting",
            ConnectionStatus::Failed => "failed",
        }
    }
}

/// Manages the websocket to the alert source.
pub struct ConnectionManager {
    url: String,
    reconnect_delay: Duration,
    cancel: CancellationToken,
}

impl ConnectionManager {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect_delay: RECONNECT_DELAY,
            cancel: CancellationToken::new(),
        }
    }

    /// Shortened delay for tests driving reconnect cycles.
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Start the connection task and return the inbound event stream.
    ///
    /// The stream is infinite until [`close`](Self::close): socket
    /// drops surface as `Disconnected` followed, after the fixed
    /// delay, by a fresh connection attempt.
    pub fn open(&self) -> mpsc::Receiver<ConnectionEvent> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let url = self.url.clone();
        let delay = self.reconnect_delay;
        let cancel = self.cancel.child_token();
        tokio::spawn(run_connection(url, delay, tx, cancel));
        rx
    }

    /// Tear down: close any live socket and cancel the pending
    /// reconnect timer. No event is emitted once the task observes
    /// the cancellation.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

async fn run_connection(
    url: String,
    delay: Duration,
    tx: mpsc::Sender<ConnectionEvent>,
    cancel: CancellationToken,
) {
    loop {
        if cancel.is_cancelled() {
            return;
        }

        match connect_async(url.as_str()).await {
            Ok((ws, _response)) => {
                info!(url = %url, "push channel connected");
                if tx.send(ConnectionEvent::Connected).await.is_err() {
                    return;
                }
                if !read_frames(ws, &tx, &cancel).await {
                    return;
                }
            }
            Err(err) => {
                warn!(url = %url, error = %err, "push channel connect failed");
                let event = ConnectionEvent::Disconnected {
                    reason: format!("connect failed: {err}"),
                };
                if tx.send(event).await.is_err() {
                    return;
                }
            }
        }

        // Fixed-interval retry; aborted immediately on teardown.
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

/// Pump frames from a live socket until it drops.
///
/// Returns `false` when the caller should stop entirely (teardown or
/// the receiver went away), `true` when the socket was lost and a
/// reconnect should be scheduled.
async fn read_frames(
    mut ws: impl Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
    tx: &mpsc::Sender<ConnectionEvent>,
    cancel: &CancellationToken,
) -> bool {
    loop {
        let frame = tokio::select! {
            // Dropping the stream closes the socket.
            _ = cancel.cancelled() => return false,
            frame = ws.next() => frame,
        };

        match frame {
            Some(Ok(Message::Text(text))) => match serde_json::from_str::<EnrichedAlert>(&text) {
                Ok(enriched) => {
                    debug!(alert_type = %enriched.alert.alert_type, "alert received");
                    if tx.send(ConnectionEvent::AlertReceived(enriched)).await.is_err() {
                        return false;
                    }
                }
                Err(err) => {
                    warn!(error = %err, "dropping malformed push frame");
                    let event = ConnectionEvent::Error {
                        reason: format!("malformed frame: {err}"),
                    };
                    if tx.send(event).await.is_err() {
                        return false;
                    }
                }
            },
            // Control frames carry no alerts.
            Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Binary(_) | Message::Frame(_))) => {}
            Some(Ok(Message::Close(frame))) => {
                let reason = frame
                    .map(|f| f.reason.to_string())
                    .unwrap_or_else(|| "server closed".to_string());
                return tx
                    .send(ConnectionEvent::Disconnected { reason })
                    .await
                    .is_ok();
            }
            Some(Err(err)) => {
                return tx
                    .send(ConnectionEvent::Disconnected {
                        reason: err.to_string(),
                    })
                    .await
                    .is_ok();
            }
            None => {
                return tx
                    .send(ConnectionEvent::Disconnected {
                        reason: "stream ended".to_string(),
                    })
                    .await
                    .is_ok();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_machine_named_transitions() {
        let status = ConnectionStatus::Connecting;
        let status = status.on_connected();
        assert_eq!(status, ConnectionStatus::Open);
        let status = status.on_disconnected();
        assert_eq!(status, ConnectionStatus::Reconnecting);
        let status = status.on_connected();
        assert_eq!(status, ConnectionStatus::Open);
        assert_eq!(status.on_fatal(), ConnectionStatus::Failed);
    }

    #[test]
    fn refused_connect_lands_in_reconnecting_not_failed() {
        assert_eq!(
            ConnectionStatus::Connecting.on_disconnected(),
            ConnectionStatus::Reconnecting
        );
    }

    #[tokio::test]
    async fn connect_failure_emits_disconnected_and_retries() {
        // Nothing listens on this port; first cycle must surface a
        // Disconnected event, not kill the stream.
        let manager = ConnectionManager::new("ws://127.0.0.1:9/ws")
            .with_reconnect_delay(Duration::from_millis(20));
        let mut events = manager.open();

        let first = events.recv().await.expect("event stream alive");
        assert!(
            matches!(first, ConnectionEvent::Disconnected { .. }),
            "expected Disconnected, got {first:?}"
        );
        // Second attempt after the delay produces another Disconnected.
        let second = events.recv().await.expect("event stream alive after retry");
        assert!(matches!(second, ConnectionEvent::Disconnected { .. }));

        manager.close();
    }

    #[tokio::test]
    async fn close_stops_the_event_stream() {
        let manager = ConnectionManager::new("ws://127.0.0.1:9/ws")
            .with_reconnect_delay(Duration::from_secs(30));
        let mut events = manager.open();
        let _ = events.recv().await;

        manager.close();
        assert!(manager.is_closed());
        // The pending reconnect timer is cancelled; the stream ends
        // instead of hanging for the full delay.
        let next = tokio::time::timeout(Duration::from_secs(1), events.recv())
            .await
            .expect("stream should end promptly after close");
        assert!(next.is_none(), "no events may follow close(), got {next:?}");
    }
}
