//! Transaction notification channel.
//!
//! A single multiplexed socket delivers terminal transaction outcomes keyed
//! by transaction id. Per `spec.md` §9 ("Implicit global SDK state"), this
//! is encapsulated as an owned collaborator with explicit `open()`/`close()`
//! and a typed waiter registry — never shared as ambient global state. The
//! reconnect-with-backoff loop is grounded on the teacher's
//! `tokio-tungstenite` usage pattern in the retrieval pack's mev-base
//! flashblocks client.
//!
//! Author: AI-Generated
//! Created: 2026-01-29

use dashmap::DashMap;
use futures::StreamExt;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TxStatus {
    Processed,
    Failed,
}

#[derive(Debug, Clone)]
pub struct TxOutcome {
    pub tx_id: String,
    pub status: TxStatus,
    pub payload: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct WireEvent {
    #[serde(rename = "txId")]
    tx_id: String,
    status: TxStatus,
    #[serde(default)]
    data: serde_json::Value,
}

/// Owned notification-channel collaborator. Holds a waiter registry keyed by
/// transaction id; `await_tx` registers a waiter before submission returns
/// and resolves it on the matching event, or on timeout.
pub struct NotificationChannel {
    url: String,
    waiters: Arc<DashMap<String, oneshot::Sender<TxOutcome>>>,
    connected: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl NotificationChannel {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            waiters: Arc::new(DashMap::new()),
            connected: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Opens the socket and spawns the consumer task. Reconnects on
    /// disconnect with exponential backoff capped at 30s.
    pub fn open(&mut self) {
        if self.task.is_some() {
            return;
        }
        let url = self.url.clone();
        let waiters = Arc::clone(&self.waiters);
        let connected = Arc::clone(&self.connected);

        let handle = tokio::spawn(async move {
            let mut backoff = Duration::from_secs(1);
            const MAX_BACKOFF: Duration = Duration::from_secs(30);

            loop {
                match connect_async(url.as_str()).await {
                    Ok((stream, _)) => {
                        info!("notification channel connected");
                        connected.store(true, Ordering::Relaxed);
                        backoff = Duration::from_secs(1);

                        let (_write, mut read) = stream.split();
                        while let Some(msg) = read.next().await {
                            match msg {
                                Ok(Message::Text(text)) => dispatch(&waiters, &text),
                                Ok(Message::Close(_)) => {
                                    warn!("notification channel closed by server");
                                    break;
                                }
                                Err(e) => {
                                    error!("notification channel read error: {e}");
                                    break;
                                }
                                _ => {}
                            }
                        }
                        connected.store(false, Ordering::Relaxed);
                    }
                    Err(e) => {
                        warn!("notification channel connect failed: {e}, retrying in {backoff:?}");
                    }
                }
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
        });

        self.task = Some(handle);
    }

    pub fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.connected.store(false, Ordering::Relaxed);
        self.waiters.clear();
    }

    /// Registers a waiter for `tx_id` and resolves it on the matching event,
    /// or with a synthetic failure after `timeout`.
    pub async fn await_tx(&self, tx_id: String, timeout: Duration) -> TxOutcome {
        let (tx, rx) = oneshot::channel();
        self.waiters.insert(tx_id.clone(), tx);

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => {
                self.waiters.remove(&tx_id);
                TxOutcome {
                    tx_id,
                    status: TxStatus::Failed,
                    payload: serde_json::Value::Null,
                }
            }
            Err(_) => {
                self.waiters.remove(&tx_id);
                TxOutcome {
                    tx_id,
                    status: TxStatus::Failed,
                    payload: serde_json::Value::Null,
                }
            }
        }
    }
}

impl Drop for NotificationChannel {
    fn drop(&mut self) {
        self.close();
    }
}

fn dispatch(waiters: &DashMap<String, oneshot::Sender<TxOutcome>>, text: &str) {
    let event: WireEvent = match serde_json::from_str(text) {
        Ok(e) => e,
        Err(e) => {
            debug!("failed to parse notification event: {e}");
            return;
        }
    };
    if let Some((_, sender)) = waiters.remove(&event.tx_id) {
        let _ = sender.send(TxOutcome {
            tx_id: event.tx_id,
            status: event.status,
            payload: event.data,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn await_tx_times_out_to_failed_locally() {
        let channel = NotificationChannel::new("wss://example.invalid/notifications");
        let outcome = channel
            .await_tx("tx-1".to_string(), Duration::from_millis(10))
            .await;
        assert_eq!(outcome.tx_id, "tx-1");
        assert_eq!(outcome.status, TxStatus::Failed);
    }

    #[test]
    fn dispatch_resolves_matching_waiter() {
        let waiters: DashMap<String, oneshot::Sender<TxOutcome>> = DashMap::new();
        let (tx, mut rx) = oneshot::channel();
        waiters.insert("tx-42".to_string(), tx);

        dispatch(&waiters, r#"{"txId":"tx-42","status":"PROCESSED","data":{}}"#);

        let outcome = rx.try_recv().expect("waiter resolved");
        assert_eq!(outcome.status, TxStatus::Processed);
        assert!(waiters.is_empty());
    }
}
