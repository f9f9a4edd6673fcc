//! Control-link connection handling

use crate::correlation::Dispatcher;
use crate::error::BridgeError;
use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Handle to send frames to the connected drone
#[derive(Debug, Clone)]
pub struct LinkHandle {
    pub link_id: u64,
    writer: mpsc::UnboundedSender<String>,
}

impl LinkHandle {
    pub fn new(link_id: u64, writer: mpsc::UnboundedSender<String>) -> Self {
        Self { link_id, writer }
    }

    /// Queue a frame for the drone. Delivery is not confirmed.
    pub fn send(&self, frame: String) -> Result<(), BridgeError> {
        self.writer
            .send(frame)
            .map_err(|_| BridgeError::LinkUnavailable)
    }

    /// Whether the writer side of the socket is still running
    pub fn is_open(&self) -> bool {
        !self.writer.is_closed()
    }
}

/// Drive one control-link WebSocket until it closes
///
/// Outbound frames flow through the handle's channel into a writer task;
/// inbound text frames are handed to the dispatcher one at a time.
pub async fn run_link_session(socket: WebSocket, dispatcher: Arc<Dispatcher>) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let link_id = dispatcher.link_connected(tx).await;
    info!(link_id, "WS session connected");

    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if let Err(e) = sink.send(Message::Text(frame.into())).await {
                warn!(link_id, "Failed to write to drone: {}", e);
                break;
            }
        }
    });

    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => {
                dispatcher.handle_link_text(text.as_str()).await;
            }
            Ok(Message::Binary(data)) => {
                dispatcher.handle_link_bytes(&data).await;
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {
                debug!(link_id, "Ignoring control frame");
            }
            Err(e) => {
                warn!(link_id, "Read error from drone: {}", e);
                break;
            }
        }
    }

    dispatcher.link_disconnected(link_id).await;
    writer.abort();
    info!(link_id, "WS session disconnected");
}
