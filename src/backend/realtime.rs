//! Realtime channels — change notifications over the backend's WebSocket.
//!
//! DESIGN
//! ======
//! The backend speaks the Phoenix channel protocol: JSON messages with
//! `topic`, `event`, `payload`, `ref`. A channel is opened with `phx_join`
//! carrying a `postgres_changes` filter, kept alive with `heartbeat` on the
//! `phoenix` topic, and closed with `phx_leave`.
//!
//! Each [`Subscription`] owns one socket and one background task. The task
//! forwards matching change events until the subscription is dropped, then
//! leaves the channel and closes the socket.
//!
//! ERROR HANDLING
//! ==============
//! A dropped socket is reconnected with jittered exponential backoff for as
//! long as the subscription is alive. A join the backend refuses is final:
//! the task ends and the subscription yields `None`.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use super::{BackendError, ChangeNotice, Subscription};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);
const RECONNECT_BASE_MS: u64 = 1_000;
const RECONNECT_MAX_MS: u64 = 30_000;
const RECONNECT_JITTER_MS: u64 = 250;
const NOTICE_BUFFER: usize = 16;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoenixMessage {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(rename = "ref", default)]
    pub msg_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_ref: Option<String>,
}

/// What a channel listens for: inserts on one table, narrowed by a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSpec {
    pub topic: String,
    pub schema: String,
    pub table: String,
    pub filter: String,
}

impl ChannelSpec {
    /// Comment inserts for a single game.
    #[must_use]
    pub fn comment_inserts(game_id: &str) -> Self {
        Self {
            topic: format!("realtime:comments:{game_id}"),
            schema: "public".into(),
            table: "comments".into(),
            filter: format!("game_id=eq.{game_id}"),
        }
    }
}

/// Classified inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Change(ChangeNotice),
    Joined,
    JoinRejected(String),
    /// The server closed or errored the channel.
    ChannelLost,
    Ignored,
}

// =============================================================================
// MESSAGE CONSTRUCTION
// =============================================================================

#[must_use]
pub fn join_message(spec: &ChannelSpec, access_token: &str, join_ref: &str) -> PhoenixMessage {
    PhoenixMessage {
        topic: spec.topic.clone(),
        event: "phx_join".into(),
        payload: serde_json::json!({
            "config": {
                "broadcast": { "ack": false, "self": false },
                "presence": { "key": "" },
                "postgres_changes": [{
                    "event": "INSERT",
                    "schema": spec.schema,
                    "table": spec.table,
                    "filter": spec.filter,
                }],
            },
            "access_token": access_token,
        }),
        msg_ref: Some(join_ref.to_owned()),
        join_ref: Some(join_ref.to_owned()),
    }
}

#[must_use]
pub fn heartbeat_message(msg_ref: &str) -> PhoenixMessage {
    PhoenixMessage {
        topic: "phoenix".into(),
        event: "heartbeat".into(),
        payload: serde_json::json!({}),
        msg_ref: Some(msg_ref.to_owned()),
        join_ref: None,
    }
}

#[must_use]
pub fn leave_message(spec: &ChannelSpec, msg_ref: &str, join_ref: &str) -> PhoenixMessage {
    PhoenixMessage {
        topic: spec.topic.clone(),
        event: "phx_leave".into(),
        payload: serde_json::json!({}),
        msg_ref: Some(msg_ref.to_owned()),
        join_ref: Some(join_ref.to_owned()),
    }
}

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Decide what an inbound message means for the channel described by `spec`.
#[must_use]
pub fn classify(spec: &ChannelSpec, join_ref: &str, msg: &PhoenixMessage) -> Inbound {
    if msg.topic != spec.topic {
        return Inbound::Ignored;
    }
    match msg.event.as_str() {
        "postgres_changes" => {
            let Some(data) = msg.payload.get("data") else {
                return Inbound::Ignored;
            };
            let kind = data
                .get("type")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default();
            let table = data
                .get("table")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default();
            if kind != "INSERT" || table != spec.table {
                return Inbound::Ignored;
            }
            Inbound::Change(ChangeNotice {
                table: table.to_owned(),
                record: data
                    .get("record")
                    .cloned()
                    .unwrap_or(serde_json::Value::Null),
            })
        }
        "phx_reply" if msg.msg_ref.as_deref() == Some(join_ref) => {
            let status = msg
                .payload
                .get("status")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default();
            if status == "ok" {
                Inbound::Joined
            } else {
                let reason = msg
                    .payload
                    .pointer("/response/reason")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("join refused")
                    .to_owned();
                Inbound::JoinRejected(reason)
            }
        }
        "phx_error" | "phx_close" => Inbound::ChannelLost,
        _ => Inbound::Ignored,
    }
}

/// Delay before reconnect attempt `attempt` (0-based), without jitter.
#[must_use]
pub fn backoff_ms(attempt: u32) -> u64 {
    RECONNECT_BASE_MS
        .saturating_mul(1_u64 << attempt.min(16))
        .min(RECONNECT_MAX_MS)
}

// =============================================================================
// CLIENT
// =============================================================================

#[derive(Debug, Clone)]
pub struct RealtimeClient {
    url: String,
    access_token: String,
}

impl RealtimeClient {
    #[must_use]
    pub fn new(url: String, access_token: String) -> Self {
        Self { url, access_token }
    }

    /// Connect, join the channel, and spawn the forwarding task.
    ///
    /// # Errors
    ///
    /// Returns an error if the first connection or join cannot be sent.
    pub async fn subscribe(&self, spec: ChannelSpec) -> Result<Subscription, BackendError> {
        let mut conn = Connection::open(&self.url, &self.access_token, &spec).await?;
        let (tx, subscription) = Subscription::channel(NOTICE_BUFFER);
        let client = self.clone();

        info!(topic = %spec.topic, "realtime: channel opened");
        tokio::spawn(async move {
            let mut attempt: u32 = 0;
            loop {
                match conn.pump(&spec, &tx).await {
                    PumpEnd::Unsubscribed => {
                        conn.leave(&spec).await;
                        info!(topic = %spec.topic, "realtime: channel closed");
                        return;
                    }
                    PumpEnd::Rejected(reason) => {
                        warn!(topic = %spec.topic, %reason, "realtime: join rejected");
                        return;
                    }
                    PumpEnd::Joined => attempt = 0,
                    PumpEnd::Disconnected => {}
                }

                // Reconnect until it works or the subscriber goes away.
                loop {
                    let jitter = rand::rng().random_range(0..=RECONNECT_JITTER_MS);
                    let delay = Duration::from_millis(backoff_ms(attempt) + jitter);
                    attempt = attempt.saturating_add(1);
                    tokio::select! {
                        () = tx.closed() => return,
                        () = tokio::time::sleep(delay) => {}
                    }
                    match Connection::open(&client.url, &client.access_token, &spec).await {
                        Ok(fresh) => {
                            debug!(topic = %spec.topic, attempt, "realtime: reconnected");
                            conn = fresh;
                            break;
                        }
                        Err(e) => warn!(topic = %spec.topic, error = %e, attempt, "realtime: reconnect failed"),
                    }
                }
            }
        });

        Ok(subscription)
    }
}

enum PumpEnd {
    /// The subscriber dropped its end.
    Unsubscribed,
    Rejected(String),
    /// The join was acknowledged, then the socket was lost.
    Joined,
    Disconnected,
}

struct Connection {
    socket: Socket,
    next_ref: u64,
    join_ref: String,
}

impl Connection {
    async fn open(url: &str, access_token: &str, spec: &ChannelSpec) -> Result<Self, BackendError> {
        let (socket, _) = connect_async(url)
            .await
            .map_err(|e| BackendError::Realtime(e.to_string()))?;
        let mut conn = Self { socket, next_ref: 1, join_ref: String::new() };
        conn.join_ref = conn.take_ref();
        let join = join_message(spec, access_token, &conn.join_ref);
        conn.send(&join).await?;
        Ok(conn)
    }

    fn take_ref(&mut self) -> String {
        let r = self.next_ref.to_string();
        self.next_ref += 1;
        r
    }

    async fn send(&mut self, msg: &PhoenixMessage) -> Result<(), BackendError> {
        let text = serde_json::to_string(msg).map_err(|e| BackendError::Realtime(e.to_string()))?;
        self.socket
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| BackendError::Realtime(e.to_string()))
    }

    /// Forward notifications until the socket or the subscriber goes away.
    async fn pump(&mut self, spec: &ChannelSpec, tx: &mpsc::Sender<ChangeNotice>) -> PumpEnd {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;
        let mut joined = false;
        let lost = |joined: bool| if joined { PumpEnd::Joined } else { PumpEnd::Disconnected };

        loop {
            tokio::select! {
                () = tx.closed() => return PumpEnd::Unsubscribed,
                _ = heartbeat.tick() => {
                    let msg_ref = self.take_ref();
                    if self.send(&heartbeat_message(&msg_ref)).await.is_err() {
                        return lost(joined);
                    }
                }
                frame = self.socket.next() => {
                    let text = match frame {
                        Some(Ok(Message::Text(text))) => text,
                        Some(Ok(Message::Close(_)) | Err(_)) | None => return lost(joined),
                        Some(Ok(_)) => continue,
                    };
                    let msg: PhoenixMessage = match serde_json::from_str(text.as_str()) {
                        Ok(m) => m,
                        Err(e) => {
                            debug!(error = %e, "realtime: unparseable message");
                            continue;
                        }
                    };
                    match classify(spec, &self.join_ref, &msg) {
                        Inbound::Change(notice) => {
                            if tx.send(notice).await.is_err() {
                                return PumpEnd::Unsubscribed;
                            }
                        }
                        Inbound::Joined => joined = true,
                        Inbound::JoinRejected(reason) => return PumpEnd::Rejected(reason),
                        Inbound::ChannelLost => return lost(joined),
                        Inbound::Ignored => {}
                    }
                }
            }
        }
    }

    async fn leave(&mut self, spec: &ChannelSpec) {
        let msg_ref = self.take_ref();
        let leave = leave_message(spec, &msg_ref, &self.join_ref);
        let _ = self.send(&leave).await;
        let _ = self.socket.close(None).await;
    }
}

#[cfg(test)]
#[path = "realtime_test.rs"]
mod tests;
