//! Live contract events from the daemon's `/ws` endpoint.
//!
//! The server pushes every mutation to every session as a JSON text
//! frame. Nothing arrives on connect; a client that was disconnected
//! misses events until it refetches.

use futures::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info};

use charter_types::ContractEvent;

use crate::api::{decode_event_frame, ClientError, Result};

/// One WebSocket session yielding decoded events.
pub struct EventStream {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
    url: String,
}

impl EventStream {
    pub const DEFAULT_URL: &'static str = "ws://localhost:4000/ws";

    /// Open a session, e.g. `ws://localhost:4000/ws`.
    pub async fn connect(url: &str) -> Result<Self> {
        let (socket, _response) = connect_async(url).await.map_err(|e| {
            error!("Failed to connect event socket at {}: {}", url, e);
            ClientError::Socket {
                url: url.to_string(),
                reason: e.to_string(),
            }
        })?;
        info!("Socket connected to {}", url);
        Ok(Self {
            socket,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Wait for the next event. `None` once the server closes the session.
    ///
    /// A frame that does not decode is returned as an error; the session
    /// stays usable.
    pub async fn next(&mut self) -> Option<Result<ContractEvent>> {
        while let Some(message) = self.socket.next().await {
            match message {
                Ok(Message::Text(text)) => return Some(decode_event_frame(&text)),
                Ok(Message::Close(_)) => break,
                Ok(other) => debug!("Ignoring non-text frame ({} bytes)", other.len()),
                Err(e) => {
                    return Some(Err(ClientError::Socket {
                        url: self.url.clone(),
                        reason: e.to_string(),
                    }))
                }
            }
        }
        info!("Socket disconnected from {}", self.url);
        None
    }

    /// Send a close frame and end the session.
    pub async fn close(mut self) -> Result<()> {
        self.socket
            .close(None)
            .await
            .map_err(|e| ClientError::Socket {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;
        info!("Socket disconnected from {}", self.url);
        Ok(())
    }
}
