//! Live audit stream.
//!
//! Every record the registry emits is appended to the in-process log and
//! fanned out to connected WebSocket clients over a broadcast channel.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use oracle_registry::{EventRecord, EventSink, MemoryEventLog};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Broadcast side of the audit stream, shared with handlers.
#[derive(Clone)]
pub struct WsState {
    sender: broadcast::Sender<EventRecord>,
}

impl WsState {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventRecord> {
        self.sender.subscribe()
    }

    pub fn broadcast_event(&self, record: EventRecord) {
        // No subscribers is not an error.
        let _ = self.sender.send(record);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Registry event sink that keeps the audit log and feeds the stream.
pub struct BroadcastSink {
    log: MemoryEventLog,
    ws_state: WsState,
}

impl BroadcastSink {
    pub fn new(ws_state: WsState) -> Self {
        Self {
            log: MemoryEventLog::new(),
            ws_state,
        }
    }

    pub fn log(&self) -> &MemoryEventLog {
        &self.log
    }
}

impl EventSink for BroadcastSink {
    fn publish(&mut self, record: EventRecord) {
        self.log.publish(record.clone());
        self.ws_state.broadcast_event(record);
    }
}

pub async fn websocket_handler(
    State(ws_state): State<WsState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, ws_state))
}

async fn handle_socket(socket: WebSocket, ws_state: WsState) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = ws_state.subscribe();
    debug!(subscribers = ws_state.subscriber_count(), "audit stream client connected");

    let mut send_task = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(record) => {
                    let payload = match serde_json::to_string(&record) {
                        Ok(payload) => payload,
                        Err(e) => {
                            warn!(error = %e, "failed to encode audit record");
                            continue;
                        }
                    };
                    if sender.send(Message::Text(payload)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "audit stream client lagging; records dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            if matches!(message, Message::Close(_)) {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    debug!("audit stream client disconnected");
}
