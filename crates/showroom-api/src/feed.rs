//! Live change feed with auto-reconnect.
//!
//! Connects to the backend's WebSocket change endpoint and streams parsed
//! document changes through a [`tokio::sync::broadcast`] channel. Handles
//! reconnection with exponential backoff + jitter automatically; this is
//! connection maintenance for the live-query surface, not a retry layer
//! for CRUD calls (those stay single best-effort requests).

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::{self, client::IntoClientRequest};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;

const EVENT_CHANNEL_CAPACITY: usize = 1024;

// ── ChangeEvent ──────────────────────────────────────────────────────

/// What happened to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOp {
    Upsert,
    Delete,
}

/// A single document change pushed by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeEvent {
    /// Collection the document belongs to (e.g. `"cars"`, `"reviews"`).
    pub collection: String,

    pub op: ChangeOp,

    /// Document identifier.
    pub id: String,

    /// Full document payload for upserts; absent for deletes.
    #[serde(default)]
    pub doc: Option<serde_json::Value>,
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for feed reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

// ── ChangeFeedHandle ─────────────────────────────────────────────────

/// Handle to a running change-feed stream.
///
/// Drop all receivers and call [`shutdown`](Self::shutdown) to tear down
/// the background task.
pub struct ChangeFeedHandle {
    event_rx: broadcast::Receiver<Arc<ChangeEvent>>,
    cancel: CancellationToken,
}

impl ChangeFeedHandle {
    /// Spawn the feed's reconnection loop.
    ///
    /// Returns immediately; the first connection attempt happens
    /// asynchronously. If `token` is given it is attached as a query
    /// parameter on the upgrade request (the WebSocket handshake cannot
    /// carry an Authorization header through every proxy).
    pub fn connect(
        ws_url: Url,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
        token: Option<SecretString>,
    ) -> Result<Self, Error> {
        let mut url = ws_url;
        if let Some(ref t) = token {
            url.query_pairs_mut().append_pair("token", t.expose_secret());
        }

        let (event_tx, event_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            feed_loop(url, event_tx, reconnect, task_cancel).await;
        });

        Ok(Self { event_rx, cancel })
    }

    /// Get a new broadcast receiver for the change stream.
    ///
    /// Multiple consumers can subscribe concurrently. If a consumer falls
    /// behind, it receives [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<ChangeEvent>> {
        self.event_rx.resubscribe()
    }

    /// Signal the background task to shut down gracefully.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect → read → on error, backoff → reconnect.
async fn feed_loop(
    ws_url: Url,
    event_tx: broadcast::Sender<Arc<ChangeEvent>>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_read(&ws_url, &event_tx, &cancel) => {
                match result {
                    // Clean disconnect (server close frame or stream ended).
                    // Reset attempt counter and reconnect immediately.
                    Ok(()) => {
                        tracing::info!("change feed disconnected cleanly, reconnecting");
                        attempt = 0;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, attempt, "change feed error");

                        if let Some(max) = reconnect.max_retries {
                            if attempt >= max {
                                tracing::error!(
                                    max_retries = max,
                                    "change feed reconnection limit reached, giving up"
                                );
                                break;
                            }
                        }

                        let delay = calculate_backoff(attempt, &reconnect);
                        tracing::info!(
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            attempt,
                            "waiting before reconnect"
                        );

                        tokio::select! {
                            biased;
                            () = cancel.cancelled() => break,
                            () = tokio::time::sleep(delay) => {}
                        }

                        attempt += 1;
                    }
                }
            }
        }
    }

    tracing::debug!("change feed loop exiting");
}

/// Establish a single WebSocket connection, read messages until it drops.
async fn connect_and_read(
    url: &Url,
    event_tx: &broadcast::Sender<Arc<ChangeEvent>>,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    tracing::info!(url = %url, "connecting to change feed");

    let request = url
        .as_str()
        .into_client_request()
        .map_err(|e| Error::FeedConnect(e.to_string()))?;

    let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(|e| Error::FeedConnect(e.to_string()))?;

    tracing::info!("change feed connected");

    let (_write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        parse_and_broadcast(&text, event_tx);
                    }
                    Some(Ok(tungstenite::Message::Ping(_))) => {
                        // tungstenite handles pong replies automatically
                        tracing::trace!("change feed ping");
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        if let Some(ref cf) = frame {
                            tracing::info!(
                                code = %cf.code,
                                reason = %cf.reason,
                                "change feed close frame received"
                            );
                        } else {
                            tracing::info!("change feed close frame received (no payload)");
                        }
                        return Ok(());
                    }
                    Some(Err(e)) => {
                        return Err(Error::FeedConnect(e.to_string()));
                    }
                    None => {
                        // Stream ended without a close frame
                        tracing::info!("change feed stream ended");
                        return Ok(());
                    }
                    _ => {
                        // Binary, Pong, Frame -- ignore
                    }
                }
            }
        }
    }
}

/// Parse a text frame and broadcast the change it carries.
fn parse_and_broadcast(text: &str, event_tx: &broadcast::Sender<Arc<ChangeEvent>>) {
    match serde_json::from_str::<ChangeEvent>(text) {
        Ok(event) => {
            // Ignore send errors -- just means no active subscribers right now
            let _ = event_tx.send(Arc::new(event));
        }
        Err(e) => {
            tracing::debug!(error = %e, "failed to parse change event");
        }
    }
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) + jitter`
///
/// Jitter is +-25% to spread out reconnection storms from multiple clients.
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(i32::try_from(attempt).unwrap_or(i32::MAX));
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic "jitter" seeded from the attempt number.
    // Not cryptographically random, but good enough for backoff spread.
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    let with_jitter = (capped * jitter_factor).max(0.0);

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_reconnect_config() {
        let config = ReconnectConfig::default();
        assert_eq!(config.initial_delay, Duration::from_secs(1));
        assert_eq!(config.max_delay, Duration::from_secs(30));
        assert!(config.max_retries.is_none());
    }

    #[test]
    fn backoff_grows_and_caps() {
        let config = ReconnectConfig {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        };

        let d0 = calculate_backoff(0, &config);
        let d4 = calculate_backoff(4, &config);
        assert!(d0 < d4);

        // Even at extreme attempts the delay stays within max + 25% jitter.
        let d20 = calculate_backoff(20, &config);
        assert!(d20 <= Duration::from_secs_f64(30.0 * 1.25));
    }

    #[test]
    fn parses_upsert_event() {
        let raw = r#"{"collection":"reviews","op":"upsert","id":"r1","doc":{"rating":5}}"#;
        let event: ChangeEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.collection, "reviews");
        assert_eq!(event.op, ChangeOp::Upsert);
        assert_eq!(event.id, "r1");
        assert!(event.doc.is_some());
    }

    #[test]
    fn parses_delete_event_without_doc() {
        let raw = r#"{"collection":"cars","op":"delete","id":"c9"}"#;
        let event: ChangeEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.op, ChangeOp::Delete);
        assert!(event.doc.is_none());
    }
}
