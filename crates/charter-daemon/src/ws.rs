//! WebSocket sessions.
//!
//! Each connection gets its own subscription and receives every contract
//! event as a JSON text frame. Nothing is pushed on connect, and frames
//! sent by the client are ignored.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use charter_types::ContractEvent;
use tracing::{info, warn};

use crate::events::EventBus;
use crate::DaemonState;

pub(crate) async fn upgrade(
    ws: WebSocketUpgrade,
    State(state): State<Arc<DaemonState>>,
) -> Response {
    let bus = state.event_bus.clone();
    ws.on_upgrade(move |socket| session(socket, bus))
}

/// Encode an event as a text frame payload.
pub fn encode_event(event: &ContractEvent) -> serde_json::Result<String> {
    serde_json::to_string(event)
}

async fn session(mut socket: WebSocket, bus: EventBus) {
    let Some(mut subscription) = bus.subscribe() else {
        let _ = socket.send(Message::Close(None)).await;
        return;
    };
    info!("Client connected ({} live)", bus.subscriber_count());

    loop {
        tokio::select! {
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    warn!("WebSocket receive error: {}", e);
                    break;
                }
                Some(Ok(_)) => {}
            },
            event = subscription.next() => {
                let Some(event) = event else {
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                };
                let frame = match encode_event(&event) {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!("Dropping unencodable {} event: {}", event.name(), e);
                        continue;
                    }
                };
                if let Err(e) = socket.send(Message::Text(frame)).await {
                    warn!("WebSocket send failed, closing session: {}", e);
                    break;
                }
            }
        }
    }

    drop(subscription);
    info!("Client disconnected ({} live)", bus.subscriber_count());
}
